use crate::application::{default_address_providers, default_geo_providers, ResolverSettings};
use crate::domain::entities::ProviderEndpoint;
use crate::domain::value_objects::ResponseFormat;
use anyhow::{anyhow, Context};
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    // Provider chains
    pub address_providers: Vec<ProviderEndpoint>,
    pub geo_providers: Vec<ProviderEndpoint>,

    // Request policy
    pub request_timeout_secs: u64,
    pub max_attempts: u32,
    pub retry_backoff_ms: u64,
    pub cache_ttl_secs: u64,
    pub user_agent: String,

    // Connectivity probe
    pub probe_addr: String,
    pub probe_hostname: String,
    pub probe_timeout_ms: u64,

    pub history_path: String,
    pub debug: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            address_providers: default_address_providers(),
            geo_providers: default_geo_providers(),
            request_timeout_secs: 8,
            max_attempts: 3,
            retry_backoff_ms: 1000,
            cache_ttl_secs: 3600,
            user_agent: default_user_agent(),
            probe_addr: "1.1.1.1:443".to_string(),
            probe_hostname: "one.one.one.one".to_string(),
            probe_timeout_ms: 2000,
            history_path: "ip_history.json".to_string(),
            debug: false,
        }
    }
}

impl Config {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }

    /// Settings for the source-chain resolver.
    pub fn resolver_settings(&self) -> ResolverSettings {
        ResolverSettings {
            address_providers: self.address_providers.clone(),
            geo_providers: self.geo_providers.clone(),
            max_attempts: self.max_attempts.max(1),
            retry_backoff: Duration::from_millis(self.retry_backoff_ms),
            cache_ttl: Duration::from_secs(self.cache_ttl_secs),
        }
    }
}

fn default_user_agent() -> String {
    format!("ip-checker/{}", env!("CARGO_PKG_VERSION"))
}

/// Parse a provider list: comma-separated `format|url` entries.
///
/// ```
/// use ip_checker::config::parse_providers;
/// use ip_checker::ResponseFormat;
///
/// let providers = parse_providers("text|https://icanhazip.com, json|https://ipinfo.io/{ip}/json").unwrap();
/// assert_eq!(providers.len(), 2);
/// assert_eq!(providers[0].format, ResponseFormat::PlainText);
/// assert_eq!(providers[1].url_template, "https://ipinfo.io/{ip}/json");
/// ```
pub fn parse_providers(raw: &str) -> anyhow::Result<Vec<ProviderEndpoint>> {
    let mut providers = Vec::new();

    for entry in raw.split(',').map(str::trim).filter(|e| !e.is_empty()) {
        let (format, url) = entry
            .split_once('|')
            .ok_or_else(|| anyhow!("provider entry '{}' is not format|url", entry))?;

        let format: ResponseFormat = format
            .parse()
            .map_err(|e: String| anyhow!(e))
            .with_context(|| format!("invalid provider entry '{}'", entry))?;

        let url = url.trim();
        if url.is_empty() {
            return Err(anyhow!("provider entry '{}' has no URL", entry));
        }

        providers.push(ProviderEndpoint::new(url, format));
    }

    if providers.is_empty() {
        return Err(anyhow!("provider list is empty"));
    }
    Ok(providers)
}

pub fn load_config() -> anyhow::Result<Config> {
    load_config_from(|key| std::env::var(key).ok())
}

/// Build a config from an arbitrary variable lookup.
pub fn load_config_from<F>(var: F) -> anyhow::Result<Config>
where
    F: Fn(&str) -> Option<String>,
{
    let defaults = Config::default();

    let address_providers = match var("IPCHECKER_ADDRESS_PROVIDERS") {
        Some(raw) => parse_providers(&raw).context("IPCHECKER_ADDRESS_PROVIDERS")?,
        None => defaults.address_providers,
    };

    let geo_providers = match var("IPCHECKER_GEO_PROVIDERS") {
        Some(raw) => parse_providers(&raw).context("IPCHECKER_GEO_PROVIDERS")?,
        None => defaults.geo_providers,
    };

    let request_timeout_secs = var("IPCHECKER_REQUEST_TIMEOUT_SECS")
        .unwrap_or_else(|| "8".to_string())
        .parse()
        .unwrap_or(8);

    let max_attempts = var("IPCHECKER_MAX_ATTEMPTS")
        .unwrap_or_else(|| "3".to_string())
        .parse()
        .unwrap_or(3);

    let retry_backoff_ms = var("IPCHECKER_RETRY_BACKOFF_MS")
        .unwrap_or_else(|| "1000".to_string())
        .parse()
        .unwrap_or(1000);

    let cache_ttl_secs = var("IPCHECKER_CACHE_TTL_SECS")
        .unwrap_or_else(|| "3600".to_string())
        .parse()
        .unwrap_or(3600);

    let user_agent = var("IPCHECKER_USER_AGENT").unwrap_or(defaults.user_agent);

    // Probe settings
    let probe_addr = var("IPCHECKER_PROBE_ADDR").unwrap_or(defaults.probe_addr);

    let probe_hostname = var("IPCHECKER_PROBE_HOSTNAME").unwrap_or(defaults.probe_hostname);

    let probe_timeout_ms = var("IPCHECKER_PROBE_TIMEOUT_MS")
        .unwrap_or_else(|| "2000".to_string())
        .parse()
        .unwrap_or(2000);

    let history_path = var("IPCHECKER_HISTORY_PATH").unwrap_or(defaults.history_path);

    let debug = var("DEBUG").is_some();

    Ok(Config {
        address_providers,
        geo_providers,
        request_timeout_secs,
        max_attempts,
        retry_backoff_ms,
        cache_ttl_secs,
        user_agent,
        probe_addr,
        probe_hostname,
        probe_timeout_ms,
        history_path,
        debug,
    })
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> anyhow::Result<Config> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        load_config_from(|key| map.get(key).cloned())
    }

    #[test]
    fn test_default_config() {
        let cfg = Config::default();
        assert_eq!(cfg.request_timeout_secs, 8);
        assert_eq!(cfg.max_attempts, 3);
        assert_eq!(cfg.probe_addr, "1.1.1.1:443");
        assert_eq!(cfg.history_path, "ip_history.json");
        assert!(cfg.user_agent.starts_with("ip-checker/"));
        assert!(!cfg.debug);
    }

    #[test]
    fn test_load_config_defaults() {
        let cfg = load(&[]).unwrap();
        assert_eq!(cfg.address_providers, default_address_providers());
        assert_eq!(cfg.geo_providers, default_geo_providers());
        assert_eq!(cfg.cache_ttl_secs, 3600);
        assert_eq!(cfg.probe_hostname, "one.one.one.one");
        assert_eq!(cfg.probe_timeout_ms, 2000);
    }

    #[test]
    fn test_load_config_from_process_env() {
        // Nothing in the test suite sets IPCHECKER_* variables.
        assert!(load_config().is_ok());
    }

    #[test]
    fn test_load_config_with_custom_values() {
        let cfg = load(&[
            ("IPCHECKER_REQUEST_TIMEOUT_SECS", "3"),
            ("IPCHECKER_MAX_ATTEMPTS", "5"),
            ("IPCHECKER_RETRY_BACKOFF_MS", "250"),
            ("IPCHECKER_CACHE_TTL_SECS", "60"),
            ("IPCHECKER_PROBE_ADDR", "9.9.9.9:53"),
            ("IPCHECKER_PROBE_HOSTNAME", "dns.quad9.net"),
            ("IPCHECKER_HISTORY_PATH", "/tmp/history.json"),
            ("IPCHECKER_USER_AGENT", "probe/1.0"),
        ])
        .unwrap();

        assert_eq!(cfg.request_timeout(), Duration::from_secs(3));
        assert_eq!(cfg.max_attempts, 5);
        assert_eq!(cfg.retry_backoff_ms, 250);
        assert_eq!(cfg.cache_ttl_secs, 60);
        assert_eq!(cfg.probe_addr, "9.9.9.9:53");
        assert_eq!(cfg.probe_hostname, "dns.quad9.net");
        assert_eq!(cfg.history_path, "/tmp/history.json");
        assert_eq!(cfg.user_agent, "probe/1.0");
    }

    #[test]
    fn test_load_config_parse_error_uses_default() {
        let cfg = load(&[
            ("IPCHECKER_MAX_ATTEMPTS", "many"),
            ("IPCHECKER_PROBE_TIMEOUT_MS", "-1"),
        ])
        .unwrap();
        assert_eq!(cfg.max_attempts, 3);
        assert_eq!(cfg.probe_timeout(), Duration::from_millis(2000));
    }

    #[test]
    fn test_load_config_with_debug() {
        let cfg = load(&[("DEBUG", "")]).unwrap();
        assert!(cfg.debug);
    }

    #[test]
    fn test_load_config_with_providers() {
        let cfg = load(&[
            ("IPCHECKER_ADDRESS_PROVIDERS", "trace|https://1.1.1.1/cdn-cgi/trace"),
            ("IPCHECKER_GEO_PROVIDERS", "json|https://ipinfo.io/{ip}/json"),
        ])
        .unwrap();

        assert_eq!(
            cfg.address_providers,
            vec![ProviderEndpoint::new(
                "https://1.1.1.1/cdn-cgi/trace",
                ResponseFormat::StructuredTrace
            )]
        );
        assert_eq!(cfg.geo_providers.len(), 1);
    }

    #[test]
    fn test_load_config_rejects_malformed_providers() {
        let err = load(&[("IPCHECKER_GEO_PROVIDERS", "xml|https://example.com")]).unwrap_err();
        assert!(format!("{:#}", err).contains("IPCHECKER_GEO_PROVIDERS"));

        assert!(load(&[("IPCHECKER_ADDRESS_PROVIDERS", "https://example.com")]).is_err());
        assert!(load(&[("IPCHECKER_ADDRESS_PROVIDERS", " , ")]).is_err());
    }

    #[test]
    fn test_parse_providers_errors() {
        assert!(parse_providers("json|").is_err());
        assert!(parse_providers("").is_err());
        assert!(parse_providers("yaml|https://example.com").is_err());
    }

    #[test]
    fn test_resolver_settings() {
        let cfg = Config {
            max_attempts: 0,
            retry_backoff_ms: 10,
            cache_ttl_secs: 5,
            ..Config::default()
        };
        let settings = cfg.resolver_settings();

        assert_eq!(settings.max_attempts, 1);
        assert_eq!(settings.retry_backoff, Duration::from_millis(10));
        assert_eq!(settings.cache_ttl, Duration::from_secs(5));
        assert_eq!(settings.address_providers, cfg.address_providers);
    }

    #[test]
    fn test_config_debug() {
        let debug_str = format!("{:?}", Config::default());
        assert!(debug_str.contains("probe_addr"));
        assert!(debug_str.contains("1.1.1.1:443"));
    }
}
