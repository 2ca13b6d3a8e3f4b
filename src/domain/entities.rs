//! Domain Entities - Core business objects
//!
//! These entities represent the core concepts of the ip-checker domain.
//! They have no I/O dependencies and contain only business logic.

use crate::domain::errors::ProviderError;
use crate::domain::value_objects::{PublicAddress, ResponseFormat};
use chrono::{DateTime, TimeZone};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use url::{Host, Url};

/// Placeholder substituted with the resolved address in location URLs.
pub const IP_PLACEHOLDER: &str = "{ip}";

/// One external source of either the caller's address or geolocation data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderEndpoint {
    /// URL, optionally containing `{ip}`
    pub url_template: String,
    /// How the response body is encoded
    pub format: ResponseFormat,
}

impl ProviderEndpoint {
    pub fn new(url_template: impl Into<String>, format: ResponseFormat) -> Self {
        Self {
            url_template: url_template.into(),
            format,
        }
    }

    /// Substitute `{ip}` (if present) and validate the result.
    ///
    /// The scheme must be `http` or `https` and the host either an IP
    /// literal or a plain hostname made of letters, digits, dots and
    /// hyphens.
    pub fn url_for(&self, ip: Option<&PublicAddress>) -> Result<Url, ProviderError> {
        let raw = match ip {
            Some(addr) => self.url_template.replace(IP_PLACEHOLDER, &addr.to_string()),
            None => self.url_template.clone(),
        };

        let invalid = |reason: &str| ProviderError::InvalidUrl {
            url: raw.clone(),
            reason: reason.to_string(),
        };

        if raw.contains(IP_PLACEHOLDER) {
            return Err(invalid("unfilled {ip} placeholder"));
        }

        let url = Url::parse(&raw).map_err(|e| invalid(&e.to_string()))?;

        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(invalid("scheme must be http or https"));
        }

        match url.host() {
            Some(Host::Ipv4(_)) | Some(Host::Ipv6(_)) => {}
            Some(Host::Domain(domain)) if is_valid_hostname(domain) => {}
            Some(Host::Domain(_)) => return Err(invalid("host contains invalid characters")),
            None => return Err(invalid("missing host")),
        }

        Ok(url)
    }

    /// Whether the provider is reachable without name resolution.
    pub fn is_ip_literal(&self) -> bool {
        // The placeholder only ever appears in the path or query.
        let probe = self.url_template.replace(IP_PLACEHOLDER, "0.0.0.0");
        matches!(
            Url::parse(&probe).ok().as_ref().and_then(|u| u.host()),
            Some(Host::Ipv4(_)) | Some(Host::Ipv6(_))
        )
    }

    /// Hostname (or address) for logging.
    pub fn host_label(&self) -> String {
        let probe = self.url_template.replace(IP_PLACEHOLDER, "0.0.0.0");
        Url::parse(&probe)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string))
            .unwrap_or_else(|| self.url_template.clone())
    }
}

impl fmt::Display for ProviderEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.url_template, self.format)
    }
}

fn is_valid_hostname(host: &str) -> bool {
    !host.is_empty()
        && host.len() <= 253
        && host
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-')
        && !host.starts_with('-')
        && !host.starts_with('.')
}

/// A latitude/longitude pair, kept as the provider's original text.
///
/// Both halves always parse as finite degrees within range, so a
/// `Coordinates` value is never half-present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Coordinates {
    latitude: String,
    longitude: String,
}

impl Coordinates {
    /// Build from separate fields; `None` unless both are usable.
    pub fn from_pair(latitude: &str, longitude: &str) -> Option<Self> {
        let (lat, lon) = (latitude.trim(), longitude.trim());
        let lat_ok = lat
            .parse::<f64>()
            .is_ok_and(|v| v.is_finite() && (-90.0..=90.0).contains(&v));
        let lon_ok = lon
            .parse::<f64>()
            .is_ok_and(|v| v.is_finite() && (-180.0..=180.0).contains(&v));

        if lat_ok && lon_ok {
            Some(Self {
                latitude: lat.to_string(),
                longitude: lon.to_string(),
            })
        } else {
            None
        }
    }

    /// Parse a combined `"<lat>,<lon>"` field.
    pub fn from_combined(loc: &str) -> Option<Self> {
        let (lat, lon) = loc.split_once(',')?;
        Self::from_pair(lat, lon)
    }

    pub fn latitude(&self) -> &str {
        &self.latitude
    }

    pub fn longitude(&self) -> &str {
        &self.longitude
    }

    pub fn latitude_deg(&self) -> f64 {
        self.latitude.parse().unwrap_or_default()
    }

    pub fn longitude_deg(&self) -> f64 {
        self.longitude.parse().unwrap_or_default()
    }
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.latitude, self.longitude)
    }
}

impl Serialize for Coordinates {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Coordinates {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Coordinates::from_combined(&s)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid coordinates: {}", s)))
    }
}

/// Canonical, provider-agnostic result of one resolution cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeoRecord {
    pub ip: PublicAddress,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub postal: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub org: Option<String>,
    /// Combined coordinate, serialized as `"loc": "<lat>,<lon>"`
    #[serde(rename = "loc", default, skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<Coordinates>,
    /// Set when the address resolved but no location could be obtained
    #[serde(
        rename = "locationError",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub location_error: Option<String>,
}

impl GeoRecord {
    /// A record holding only the address.
    pub fn bare(ip: PublicAddress) -> Self {
        Self {
            ip,
            country: None,
            region: None,
            city: None,
            postal: None,
            timezone: None,
            org: None,
            coordinates: None,
            location_error: None,
        }
    }

    /// A record for an address whose location is unavailable.
    pub fn location_unavailable(ip: PublicAddress, reason: impl Into<String>) -> Self {
        Self {
            location_error: Some(reason.into()),
            ..Self::bare(ip)
        }
    }

    pub fn has_location(&self) -> bool {
        self.coordinates.is_some()
    }

    pub fn latitude(&self) -> Option<&str> {
        self.coordinates.as_ref().map(Coordinates::latitude)
    }

    pub fn longitude(&self) -> Option<&str> {
        self.coordinates.as_ref().map(Coordinates::longitude)
    }

    /// Combined `"<lat>,<lon>"` coordinate, if known.
    pub fn loc(&self) -> Option<String> {
        self.coordinates.as_ref().map(Coordinates::to_string)
    }
}

/// Timestamp layout used by the history file.
pub const HISTORY_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One line of lookup history, in the shape the history file stores.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub timestamp: String,
    pub ip: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub postal: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub org: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loc: Option<String>,
}

impl HistoryEntry {
    pub fn from_record<Tz>(record: &GeoRecord, at: &DateTime<Tz>) -> Self
    where
        Tz: TimeZone,
        Tz::Offset: fmt::Display,
    {
        Self {
            timestamp: at.format(HISTORY_TIMESTAMP_FORMAT).to_string(),
            ip: record.ip.to_string(),
            city: record.city.clone(),
            country: record.country.clone(),
            region: record.region.clone(),
            postal: record.postal.clone(),
            timezone: record.timezone.clone(),
            org: record.org.clone(),
            loc: record.loc(),
        }
    }

    /// `[timestamp] ip - city, country`
    pub fn summary_line(&self) -> String {
        format!(
            "[{}] {} - {}, {}",
            self.timestamp,
            self.ip,
            self.city.as_deref().unwrap_or("Unknown"),
            self.country.as_deref().unwrap_or("Unknown")
        )
    }
}
