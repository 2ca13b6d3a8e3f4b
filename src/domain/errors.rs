//! Domain Errors
//!
//! Provider-level failures stay inside the resolver; only `ResolveError`
//! crosses the component boundary.

/// Why a single provider attempt failed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProviderError {
    /// The configured URL is unusable. A local configuration mistake,
    /// not a network failure.
    #[error("invalid provider url {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    /// Connection refused, reset, or timed out.
    #[error("provider unreachable: {0}")]
    Unreachable(String),

    /// The provider's hostname did not resolve.
    #[error("name resolution failed for {host}: {detail}")]
    NameResolution { host: String, detail: String },

    /// Any non-2xx response.
    #[error("provider returned HTTP {0}")]
    HttpStatus(u16),

    /// The body did not parse or lacked a usable value.
    #[error("malformed provider response: {0}")]
    Malformed(String),
}

impl ProviderError {
    /// Only transport failures are worth repeating against the same host.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ProviderError::Unreachable(_))
    }

    /// Whether the failure came from the network rather than local config.
    pub fn is_network(&self) -> bool {
        !matches!(self, ProviderError::InvalidUrl { .. })
    }
}

/// Outcome of a failed resolution cycle.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    #[error("no network connectivity")]
    Offline,

    #[error("{}", exhausted_message(.attempted, .last_error))]
    AllProvidersExhausted {
        /// Providers tried (not counting retries)
        attempted: usize,
        /// Most informative provider failure seen
        last_error: Option<ProviderError>,
    },

    #[error("resolution cycle cancelled")]
    Cancelled,

    #[error("a resolution cycle is already running")]
    AlreadyRunning,
}

fn exhausted_message(attempted: &usize, last_error: &Option<ProviderError>) -> String {
    match last_error {
        Some(e) => format!(
            "no address provider succeeded ({} tried), last error: {}",
            attempted, e
        ),
        None => format!("no address provider succeeded ({} tried)", attempted),
    }
}
