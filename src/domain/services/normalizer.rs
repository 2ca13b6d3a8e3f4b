//! Result Normalizer
//!
//! Pure domain logic mapping heterogeneous provider schemas onto the
//! canonical `GeoRecord`. No I/O, no state: the same payload always
//! normalizes to the same record.

use crate::domain::entities::{Coordinates, GeoRecord};
use crate::domain::payload::RawPayload;
use crate::domain::value_objects::PublicAddress;

/// Accepted source field names per canonical field, in priority order.
const COUNTRY_FIELDS: &[&str] = &["country", "country_name", "countryCode"];
const REGION_FIELDS: &[&str] = &["region", "region_name", "regionName"];
const CITY_FIELDS: &[&str] = &["city", "city_name"];
const POSTAL_FIELDS: &[&str] = &["postal", "zip"];
const TIMEZONE_FIELDS: &[&str] = &["timezone", "time_zone"];
const ORG_FIELDS: &[&str] = &["org", "isp", "as"];

/// Combined coordinate field names.
const LOC_FIELDS: &[&str] = &["loc"];
/// Separate coordinate field pairs, tried after the combined field.
const COORDINATE_PAIRS: &[(&str, &str)] = &[("lat", "lon"), ("latitude", "longitude")];

/// Normalizer from raw provider payloads to canonical records.
pub struct Normalizer;

impl Normalizer {
    /// Build a canonical record for `ip` from a provider payload.
    ///
    /// The address always comes from the caller, never from the
    /// payload: location providers echo it back in differing shapes.
    ///
    /// # Example
    /// ```
    /// use ip_checker::domain::payload::RawPayload;
    /// use ip_checker::domain::services::Normalizer;
    /// use ip_checker::{PublicAddress, ResponseFormat};
    ///
    /// let raw = RawPayload::parse(ResponseFormat::Json, r#"{"lat":"52.1","lon":"21.0"}"#).unwrap();
    /// let ip = PublicAddress::parse("203.0.113.5").unwrap();
    /// let record = Normalizer::normalize(&raw, ip);
    /// assert_eq!(record.loc().as_deref(), Some("52.1,21.0"));
    /// ```
    pub fn normalize(raw: &RawPayload, ip: PublicAddress) -> GeoRecord {
        GeoRecord {
            ip,
            country: Self::first_of(raw, COUNTRY_FIELDS),
            region: Self::first_of(raw, REGION_FIELDS),
            city: Self::first_of(raw, CITY_FIELDS),
            postal: Self::first_of(raw, POSTAL_FIELDS),
            timezone: Self::first_of(raw, TIMEZONE_FIELDS),
            org: Self::first_of(raw, ORG_FIELDS),
            coordinates: Self::coordinates(raw),
            location_error: None,
        }
    }

    fn first_of(raw: &RawPayload, names: &[&str]) -> Option<String> {
        names.iter().find_map(|name| raw.field(name))
    }

    fn coordinates(raw: &RawPayload) -> Option<Coordinates> {
        let combined = LOC_FIELDS
            .iter()
            .filter_map(|name| raw.field(name))
            .find_map(|loc| Coordinates::from_combined(&loc));

        combined.or_else(|| {
            COORDINATE_PAIRS.iter().find_map(|(lat, lon)| {
                let (lat, lon) = (raw.field(lat)?, raw.field(lon)?);
                Coordinates::from_pair(&lat, &lon)
            })
        })
    }
}
