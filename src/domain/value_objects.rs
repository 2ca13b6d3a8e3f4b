//! Value Objects - Immutable domain primitives
//!
//! Value objects are identified by their value rather than identity.
//! They are immutable and can be freely shared.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;

/// A public IP address that passed literal validation.
///
/// Only addresses wrapped in this type are trusted or cached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PublicAddress(IpAddr);

impl PublicAddress {
    /// Validate a provider-supplied string as an IPv4/IPv6 literal.
    ///
    /// Surrounding whitespace is ignored; anything else that is not a
    /// literal address (hostnames, ports, prefixes) is rejected.
    ///
    /// # Examples
    /// ```
    /// use ip_checker::PublicAddress;
    ///
    /// assert!(PublicAddress::parse("203.0.113.5").is_some());
    /// assert!(PublicAddress::parse("not-an-ip").is_none());
    /// ```
    pub fn parse(s: &str) -> Option<Self> {
        s.trim().parse::<IpAddr>().ok().map(Self)
    }

    pub fn ip(&self) -> IpAddr {
        self.0
    }
}

impl From<IpAddr> for PublicAddress {
    fn from(ip: IpAddr) -> Self {
        Self(ip)
    }
}

impl fmt::Display for PublicAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Network state observed at the start of a resolution cycle.
///
/// Never stored; it only steers provider ordering for the cycle
/// that computed it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectivityState {
    /// Transport and name resolution both work
    Online,
    /// No transport-level connectivity
    Offline,
    /// Routable, but hostname resolution fails
    DnsImpaired,
}

impl fmt::Display for ConnectivityState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectivityState::Online => write!(f, "online"),
            ConnectivityState::Offline => write!(f, "offline"),
            ConnectivityState::DnsImpaired => write!(f, "dns-impaired"),
        }
    }
}

/// How a provider encodes its response body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResponseFormat {
    /// JSON object
    Json,
    /// The bare value, possibly padded with whitespace
    PlainText,
    /// `key=value` lines (e.g. Cloudflare's `/cdn-cgi/trace`)
    StructuredTrace,
}

impl ResponseFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::PlainText => "plain-text",
            Self::StructuredTrace => "structured-trace",
        }
    }
}

impl FromStr for ResponseFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "plain-text" | "text" => Ok(Self::PlainText),
            "structured-trace" | "trace" => Ok(Self::StructuredTrace),
            other => Err(format!("unknown response format: {}", other)),
        }
    }
}

impl fmt::Display for ResponseFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Key for the resolver's TTL cache.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    /// The caller's own public address (`"ip"`)
    Address,
    /// Geolocation record for an address (`"geo:<ip>"`)
    Geo(PublicAddress),
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheKey::Address => write!(f, "ip"),
            CacheKey::Geo(addr) => write!(f, "geo:{}", addr),
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use std::net::{Ipv4Addr, Ipv6Addr};

    // ===== PublicAddress Tests =====

    #[test]
    fn test_parse_ipv4() {
        let addr = PublicAddress::parse("203.0.113.5").unwrap();
        assert_eq!(addr.ip(), IpAddr::V4(Ipv4Addr::new(203, 0, 113, 5)));
    }

    #[test]
    fn test_parse_ipv6() {
        let addr = PublicAddress::parse("2001:db8::1").unwrap();
        assert_eq!(
            addr.ip(),
            IpAddr::V6(Ipv6Addr::new(0x2001, 0xdb8, 0, 0, 0, 0, 0, 1))
        );
    }

    #[test]
    fn test_parse_trims_whitespace() {
        let addr = PublicAddress::parse("  198.51.100.7\n").unwrap();
        assert_eq!(addr.to_string(), "198.51.100.7");
    }

    #[test]
    fn test_parse_rejects_garbage() {
        let tests = vec![
            "not-an-ip",
            "",
            "1.2.3",
            "256.1.1.1",
            "1.2.3.4:80",
            "10.0.0.0/8",
            "<html>",
        ];

        for input in tests {
            assert!(
                PublicAddress::parse(input).is_none(),
                "Accepted invalid input: {}",
                input
            );
        }
    }

    // ===== ResponseFormat Tests =====

    #[test]
    fn test_response_format_from_str() {
        let tests = vec![
            ("json", ResponseFormat::Json),
            ("JSON", ResponseFormat::Json),
            ("plain-text", ResponseFormat::PlainText),
            ("text", ResponseFormat::PlainText),
            ("structured-trace", ResponseFormat::StructuredTrace),
            ("trace", ResponseFormat::StructuredTrace),
        ];

        for (input, expected) in tests {
            assert_eq!(
                input.parse::<ResponseFormat>().unwrap(),
                expected,
                "Failed for input: {}",
                input
            );
        }
    }

    #[test]
    fn test_response_format_unknown() {
        assert!("xml".parse::<ResponseFormat>().is_err());
    }

    #[test]
    fn test_response_format_serde_tags() {
        let json = serde_json::to_string(&ResponseFormat::StructuredTrace).unwrap();
        assert_eq!(json, "\"structured-trace\"");
        let back: ResponseFormat = serde_json::from_str("\"plain-text\"").unwrap();
        assert_eq!(back, ResponseFormat::PlainText);
    }

    // ===== CacheKey Tests =====

    #[test]
    fn test_cache_key_display() {
        let addr = PublicAddress::parse("203.0.113.5").unwrap();
        assert_eq!(CacheKey::Address.to_string(), "ip");
        assert_eq!(CacheKey::Geo(addr).to_string(), "geo:203.0.113.5");
    }

    #[test]
    fn test_connectivity_state_display() {
        assert_eq!(ConnectivityState::Online.to_string(), "online");
        assert_eq!(ConnectivityState::Offline.to_string(), "offline");
        assert_eq!(ConnectivityState::DnsImpaired.to_string(), "dns-impaired");
    }
}
