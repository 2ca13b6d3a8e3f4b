//! Lookup Service - Main application use case
//!
//! Runs one resolution cycle: probe connectivity, resolve the public
//! address, then its geolocation. This is the primary interface for the
//! inbound adapter.

use crate::application::resolver_service::{CycleContext, SourceChainResolver};
use crate::domain::entities::GeoRecord;
use crate::domain::errors::ResolveError;
use crate::domain::ports::ConnectivityProbe;
use crate::domain::value_objects::ConnectivityState;
use std::sync::Arc;

/// Lookup service - one resolution cycle end to end.
///
/// The steps of a cycle are sequential:
/// 1. Classify connectivity (offline short-circuits the cycle)
/// 2. Resolve the public address
/// 3. Resolve geolocation for that address (soft-fails)
pub struct LookupService {
    probe: Arc<dyn ConnectivityProbe>,
    resolver: SourceChainResolver,
}

impl LookupService {
    /// Create a new lookup service.
    pub fn new(probe: Arc<dyn ConnectivityProbe>, resolver: SourceChainResolver) -> Self {
        Self { probe, resolver }
    }

    pub fn resolver(&self) -> &SourceChainResolver {
        &self.resolver
    }

    /// Run one cycle.
    ///
    /// Returns a record whenever an address was found, even if its
    /// location could not be (see `GeoRecord::location_error`). A cycle
    /// cancelled at any point yields `ResolveError::Cancelled` and its
    /// partial results are discarded.
    pub async fn run_cycle(&self, ctx: &CycleContext) -> Result<GeoRecord, ResolveError> {
        ctx.report(0);

        let state = self.probe.probe().await;
        tracing::info!("connectivity: {}", state);

        if ctx.is_cancelled() {
            return Err(ResolveError::Cancelled);
        }
        if state == ConnectivityState::Offline {
            return Err(ResolveError::Offline);
        }

        let addr = self.resolver.resolve_address(state, ctx).await?;
        ctx.report(33);

        let record = self.resolver.resolve_geo(addr, state, ctx).await;
        if ctx.is_cancelled() {
            tracing::info!("cycle cancelled, discarding result for {}", addr);
            return Err(ResolveError::Cancelled);
        }
        ctx.report(100);

        match &record.location_error {
            Some(reason) => tracing::warn!("resolved {} without location: {}", addr, reason),
            None => tracing::info!("resolved {}", addr),
        }

        Ok(record)
    }
}
