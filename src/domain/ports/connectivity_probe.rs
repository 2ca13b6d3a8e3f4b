//! Connectivity Probe Port
//!
//! Defines the interface for cheaply classifying the local network state.

use crate::domain::value_objects::ConnectivityState;
use async_trait::async_trait;

/// Probe for outbound connectivity and working name resolution.
///
/// This is an outbound port. Implementations must be cheap and
/// decisive: a single transport attempt, a single lookup, no retries.
#[async_trait]
pub trait ConnectivityProbe: Send + Sync {
    /// Classify the network as online, offline, or DNS-impaired.
    async fn probe(&self) -> ConnectivityState;
}
