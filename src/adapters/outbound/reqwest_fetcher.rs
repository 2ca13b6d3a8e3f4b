//! Reqwest HTTP Fetcher
//!
//! Implements HttpFetcher using a shared reqwest client.

use crate::domain::errors::ProviderError;
use crate::domain::ports::HttpFetcher;
use async_trait::async_trait;
use std::error::Error as StdError;
use std::time::Duration;
use url::{Host, Url};

/// Messages hyper and the system resolver use for lookup failures.
const NAME_RESOLUTION_MARKERS: &[&str] = &[
    "dns error",
    "failed to lookup address",
    "name or service not known",
    "no such host",
    "nodename nor servname",
    "temporary failure in name resolution",
];

/// reqwest-backed fetcher.
///
/// One client is reused for every provider so connections and TLS
/// sessions are pooled across a cycle.
pub struct ReqwestFetcher {
    client: reqwest::Client,
}

impl ReqwestFetcher {
    /// Build a fetcher with a per-request timeout and User-Agent.
    pub fn new(timeout: Duration, user_agent: &str) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .user_agent(user_agent)
            .build()?;
        Ok(Self { client })
    }

    /// Map a transport error onto the provider error taxonomy.
    fn classify(url: &Url, err: &reqwest::Error) -> ProviderError {
        let named_host = match url.host() {
            Some(Host::Domain(domain)) => Some(domain.to_string()),
            _ => None,
        };

        if let Some(host) = named_host {
            if err.is_connect() && is_name_resolution_failure(err) {
                return ProviderError::NameResolution {
                    host,
                    detail: error_chain(err),
                };
            }
        }

        if err.is_timeout() {
            ProviderError::Unreachable(format!("timed out: {}", url))
        } else {
            ProviderError::Unreachable(error_chain(err))
        }
    }

    /// Map a failure while reading the body.
    ///
    /// A stalled or reset transfer is a transport failure; only a body
    /// that arrived but cannot be decoded is malformed.
    fn classify_body(url: &Url, err: &reqwest::Error) -> ProviderError {
        if err.is_decode() {
            ProviderError::Malformed(format!("failed to decode body: {}", error_chain(err)))
        } else if err.is_timeout() {
            ProviderError::Unreachable(format!("timed out reading body: {}", url))
        } else {
            ProviderError::Unreachable(format!("failed to read body: {}", error_chain(err)))
        }
    }
}

#[async_trait]
impl HttpFetcher for ReqwestFetcher {
    async fn get(&self, url: &Url) -> Result<String, ProviderError> {
        let resp = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| Self::classify(url, &e))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(ProviderError::HttpStatus(status.as_u16()));
        }

        resp.text().await.map_err(|e| Self::classify_body(url, &e))
    }
}

/// Whether any error in the source chain reports a lookup failure.
fn is_name_resolution_failure(err: &(dyn StdError + 'static)) -> bool {
    let mut current = Some(err);
    while let Some(e) = current {
        let msg = e.to_string().to_lowercase();
        if NAME_RESOLUTION_MARKERS.iter().any(|m| msg.contains(m)) {
            return true;
        }
        current = e.source();
    }
    false
}

/// Flatten an error and its sources into one line.
fn error_chain(err: &(dyn StdError + 'static)) -> String {
    let mut parts = vec![err.to_string()];
    let mut current = err.source();
    while let Some(e) = current {
        let msg = e.to_string();
        if !parts.iter().any(|p| p.contains(&msg)) {
            parts.push(msg);
        }
        current = e.source();
    }
    parts.join(": ")
}
