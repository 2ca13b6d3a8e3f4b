//! Source-Chain Resolver
//!
//! Walks ordered provider chains to find the caller's public address and
//! its geolocation. Every provider goes through the same pipeline:
//! validate URL, fetch (with bounded retries), parse by format, validate.
//! Provider failures are logged here and never surfaced individually.

use crate::domain::entities::{GeoRecord, ProviderEndpoint};
use crate::domain::errors::{ProviderError, ResolveError};
use crate::domain::payload::RawPayload;
use crate::domain::ports::HttpFetcher;
use crate::domain::services::Normalizer;
use crate::domain::value_objects::{CacheKey, ConnectivityState, PublicAddress, ResponseFormat};
use crate::infrastructure::cycle_control::CancellationToken;
use crate::infrastructure::ttl_cache::TtlCache;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Progress range covered by address resolution.
const ADDRESS_PROGRESS: (u8, u8) = (0, 33);
/// Progress range covered by geolocation resolution.
const GEO_PROGRESS: (u8, u8) = (33, 99);

/// Built-in address providers, most reliable and least DNS-dependent first.
pub fn default_address_providers() -> Vec<ProviderEndpoint> {
    vec![
        ProviderEndpoint::new("https://1.1.1.1/cdn-cgi/trace", ResponseFormat::StructuredTrace),
        ProviderEndpoint::new("https://api.ipify.org?format=json", ResponseFormat::Json),
        ProviderEndpoint::new("https://ifconfig.me/ip", ResponseFormat::PlainText),
        ProviderEndpoint::new("https://icanhazip.com", ResponseFormat::PlainText),
        ProviderEndpoint::new("https://ident.me", ResponseFormat::PlainText),
        ProviderEndpoint::new("https://api.myip.com", ResponseFormat::Json),
    ]
}

/// Built-in geolocation providers.
pub fn default_geo_providers() -> Vec<ProviderEndpoint> {
    vec![
        ProviderEndpoint::new("https://ipinfo.io/{ip}/json", ResponseFormat::Json),
        ProviderEndpoint::new("https://ipapi.co/{ip}/json/", ResponseFormat::Json),
        ProviderEndpoint::new("http://ip-api.com/json/{ip}", ResponseFormat::Json),
    ]
}

/// Resolver settings.
#[derive(Debug, Clone)]
pub struct ResolverSettings {
    /// Address providers in priority order
    pub address_providers: Vec<ProviderEndpoint>,
    /// Geolocation providers in priority order
    pub geo_providers: Vec<ProviderEndpoint>,
    /// Attempts per provider for retryable failures (at least 1)
    pub max_attempts: u32,
    /// Fixed delay between attempts against the same provider
    pub retry_backoff: Duration,
    /// Lifetime of cached addresses and records
    pub cache_ttl: Duration,
}

impl Default for ResolverSettings {
    fn default() -> Self {
        Self {
            address_providers: default_address_providers(),
            geo_providers: default_geo_providers(),
            max_attempts: 3,
            retry_backoff: Duration::from_secs(1),
            cache_ttl: Duration::from_secs(3600),
        }
    }
}

/// Callback receiving coarse progress percentages.
pub type ProgressFn = Arc<dyn Fn(u8) + Send + Sync>;

/// Per-cycle context: cancellation and progress reporting.
#[derive(Clone, Default)]
pub struct CycleContext {
    token: CancellationToken,
    progress: Option<ProgressFn>,
}

impl CycleContext {
    pub fn new(token: CancellationToken) -> Self {
        Self {
            token,
            progress: None,
        }
    }

    /// Set the progress callback.
    pub fn on_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(u8) + Send + Sync + 'static,
    {
        self.progress = Some(Arc::new(callback));
        self
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Sleep for `delay`, waking early if the cycle is cancelled.
    pub async fn pause(&self, delay: Duration) {
        tokio::select! {
            _ = tokio::time::sleep(delay) => {}
            _ = self.token.cancelled() => {}
        }
    }

    pub fn report(&self, percent: u8) {
        if let Some(callback) = &self.progress {
            callback(percent.min(100));
        }
    }
}

/// Values stored in the resolver cache.
#[derive(Debug, Clone)]
enum CachedValue {
    Address(PublicAddress),
    Record(GeoRecord),
}

/// Resolver for the caller's public address and its geolocation.
///
/// Provider attempts are strictly sequential; only the first success in
/// each chain matters.
pub struct SourceChainResolver {
    fetcher: Arc<dyn HttpFetcher>,
    settings: ResolverSettings,
    cache: TtlCache<CacheKey, CachedValue>,
}

impl SourceChainResolver {
    /// Create a resolver with an empty cache.
    pub fn new(fetcher: Arc<dyn HttpFetcher>, settings: ResolverSettings) -> Self {
        let cache = TtlCache::new(settings.cache_ttl);
        Self {
            fetcher,
            settings,
            cache,
        }
    }

    pub fn settings(&self) -> &ResolverSettings {
        &self.settings
    }

    /// Determine the caller's public address.
    ///
    /// Fails immediately when offline. When DNS is impaired, providers
    /// addressed by IP literal are tried first; the rest are still
    /// attempted afterward.
    pub async fn resolve_address(
        &self,
        state: ConnectivityState,
        ctx: &CycleContext,
    ) -> Result<PublicAddress, ResolveError> {
        if state == ConnectivityState::Offline {
            tracing::warn!("offline, no address provider attempted");
            return Err(ResolveError::Offline);
        }

        if let Some(CachedValue::Address(addr)) = self.cache.get(&CacheKey::Address) {
            tracing::debug!("address cache hit: {}", addr);
            return Ok(addr);
        }

        let chain = self.address_chain(state);
        let total = chain.len();
        let mut last_error: Option<ProviderError> = None;

        for (i, provider) in chain.into_iter().enumerate() {
            if ctx.is_cancelled() {
                return Err(ResolveError::Cancelled);
            }

            tracing::debug!("trying address provider {}", provider);
            let outcome = match self.fetch_payload(provider, None, ctx).await {
                Ok(payload) => payload.address(),
                Err(e) => Err(e),
            };

            match outcome {
                Ok(addr) => {
                    // The caller reports the end of the address phase.
                    tracing::info!("public address {} from {}", addr, provider.host_label());
                    self.cache.put(CacheKey::Address, CachedValue::Address(addr));
                    return Ok(addr);
                }
                Err(e) => {
                    ctx.report(progress_step(ADDRESS_PROGRESS, i + 1, total));
                    tracing::warn!("address provider {} failed: {}", provider.host_label(), e);
                    retain_most_informative(&mut last_error, e);
                }
            }
        }

        Err(ResolveError::AllProvidersExhausted {
            attempted: total,
            last_error,
        })
    }

    /// Look up geolocation for `addr`. Never fails.
    ///
    /// Location providers are name-addressed, so nothing is attempted
    /// unless the network is fully online. A provider response without
    /// coordinates is not accepted. When no provider succeeds the record
    /// carries only the address and a `location_error`.
    pub async fn resolve_geo(
        &self,
        addr: PublicAddress,
        state: ConnectivityState,
        ctx: &CycleContext,
    ) -> GeoRecord {
        let key = CacheKey::Geo(addr);
        if let Some(CachedValue::Record(record)) = self.cache.get(&key) {
            tracing::debug!("geolocation cache hit: {}", key);
            return record;
        }

        match state {
            ConnectivityState::Online => {}
            ConnectivityState::DnsImpaired => {
                tracing::warn!("DNS impaired, skipping geolocation for {}", addr);
                return GeoRecord::location_unavailable(
                    addr,
                    "location unavailable: DNS resolution is not working",
                );
            }
            ConnectivityState::Offline => {
                return GeoRecord::location_unavailable(
                    addr,
                    "location unavailable: no network connectivity",
                );
            }
        }

        let total = self.settings.geo_providers.len();

        for (i, provider) in self.settings.geo_providers.iter().enumerate() {
            if ctx.is_cancelled() {
                return GeoRecord::location_unavailable(addr, "location lookup cancelled");
            }

            tracing::debug!("trying geolocation provider {}", provider);
            let outcome = self.fetch_payload(provider, Some(&addr), ctx).await;
            ctx.report(progress_step(GEO_PROGRESS, i + 1, total));

            match outcome {
                Ok(payload) => {
                    let record = Normalizer::normalize(&payload, addr);
                    if record.has_location() {
                        tracing::info!(
                            "location for {} from {}: {}",
                            addr,
                            provider.host_label(),
                            record.loc().unwrap_or_default()
                        );
                        self.cache.put(key, CachedValue::Record(record.clone()));
                        return record;
                    }
                    tracing::warn!(
                        "geolocation provider {} returned no coordinates",
                        provider.host_label()
                    );
                }
                Err(e) => {
                    tracing::warn!("geolocation provider {} failed: {}", provider.host_label(), e);
                }
            }
        }

        GeoRecord::location_unavailable(
            addr,
            "location unavailable: no geolocation provider returned coordinates",
        )
    }

    /// Address providers in the order they should be tried.
    fn address_chain(&self, state: ConnectivityState) -> Vec<&ProviderEndpoint> {
        let mut chain: Vec<&ProviderEndpoint> = self.settings.address_providers.iter().collect();
        if state == ConnectivityState::DnsImpaired {
            // Stable: keeps configured priority within each group.
            chain.sort_by_key(|p| !p.is_ip_literal());
        }
        chain
    }

    /// Validate, fetch and decode one provider's response.
    async fn fetch_payload(
        &self,
        provider: &ProviderEndpoint,
        ip: Option<&PublicAddress>,
        ctx: &CycleContext,
    ) -> Result<RawPayload, ProviderError> {
        let url = provider.url_for(ip)?;
        let body = self.fetch_with_retry(&url, ctx).await?;
        RawPayload::parse(provider.format, &body)
    }

    /// GET with a fixed backoff between attempts.
    ///
    /// Only transport failures are retried. A name resolution failure
    /// abandons the provider at once.
    async fn fetch_with_retry(&self, url: &Url, ctx: &CycleContext) -> Result<String, ProviderError> {
        let max_attempts = self.settings.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            match self.fetcher.get(url).await {
                Ok(body) => return Ok(body),
                Err(e) if e.is_retryable() && attempt < max_attempts && !ctx.is_cancelled() => {
                    tracing::debug!(
                        "attempt {}/{} for {} failed: {}, retrying in {:?}",
                        attempt,
                        max_attempts,
                        url,
                        e,
                        self.settings.retry_backoff
                    );
                    ctx.pause(self.settings.retry_backoff).await;
                    if ctx.is_cancelled() {
                        tracing::debug!("cycle cancelled during backoff for {}", url);
                        return Err(e);
                    }
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// Keep the most informative failure: a network-level error is never
/// replaced by a local URL validation error.
fn retain_most_informative(last: &mut Option<ProviderError>, err: ProviderError) {
    let replace = match last {
        Some(prev) => err.is_network() || !prev.is_network(),
        None => true,
    };
    if replace {
        *last = Some(err);
    }
}

fn progress_step((start, end): (u8, u8), done: usize, total: usize) -> u8 {
    if total == 0 {
        return end;
    }
    let span = (end - start) as usize;
    start + (span * done.min(total) / total) as u8
}
