//! HTTP Fetcher Port
//!
//! Defines the interface for fetching provider responses.

use crate::domain::errors::ProviderError;
use async_trait::async_trait;
use url::Url;

/// Fetcher for provider response bodies.
///
/// This is an outbound port that abstracts the HTTP client. A call is a
/// single GET with the implementation's own timeout; retry policy lives
/// in the resolver, not here.
#[async_trait]
pub trait HttpFetcher: Send + Sync {
    /// GET `url` and return the body of a 2xx response.
    ///
    /// Implementations must report hostname lookup failures as
    /// `ProviderError::NameResolution` so the resolver can skip retries,
    /// and any non-2xx status as `ProviderError::HttpStatus`.
    async fn get(&self, url: &Url) -> Result<String, ProviderError>;
}
