//! Resolve Trigger Adapter
//!
//! The "resolve now" command. Each accepted trigger runs one cycle on a
//! background task and reports back over an event channel, so the caller
//! (a UI loop, the CLI) never blocks on the network.

use crate::application::{CycleContext, LookupService};
use crate::domain::entities::GeoRecord;
use crate::domain::errors::ResolveError;
use crate::infrastructure::cycle_control::CycleController;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Events emitted by a resolution cycle.
#[derive(Debug, Clone, PartialEq)]
pub enum ResolveEvent {
    /// Coarse progress, 0-100
    Progress(u8),
    /// Cycle finished with a record (possibly without location)
    Resolved(GeoRecord),
    /// Cycle failed; human-readable reason
    Failed(String),
}

/// Inbound adapter starting resolution cycles.
///
/// Single-flight: a trigger while a cycle is in flight is rejected.
pub struct ResolveTrigger {
    service: Arc<LookupService>,
    controller: CycleController,
    events: mpsc::UnboundedSender<ResolveEvent>,
}

impl ResolveTrigger {
    /// Create a trigger and the receiver for its events.
    pub fn new(service: Arc<LookupService>) -> (Self, mpsc::UnboundedReceiver<ResolveEvent>) {
        let (events, rx) = mpsc::unbounded_channel();
        let trigger = Self {
            service,
            controller: CycleController::new(),
            events,
        };
        (trigger, rx)
    }

    /// Start a cycle in the background.
    ///
    /// Must be called within a tokio runtime. Returns
    /// `ResolveError::AlreadyRunning` if a cycle is in flight.
    pub fn resolve_now(&self) -> Result<JoinHandle<()>, ResolveError> {
        let guard = self
            .controller
            .try_begin()
            .ok_or(ResolveError::AlreadyRunning)?;

        let service = self.service.clone();
        let events = self.events.clone();
        let progress_events = self.events.clone();

        let handle = tokio::spawn(async move {
            let ctx = CycleContext::new(guard.token()).on_progress(move |percent| {
                let _ = progress_events.send(ResolveEvent::Progress(percent));
            });

            // Run the cycle on its own task so a panic still yields an event.
            let cycle = tokio::spawn(async move { service.run_cycle(&ctx).await });
            let outcome = match cycle.await {
                Ok(result) => result.map_err(|e| e.to_string()),
                Err(e) => Err(format!("resolution task failed: {}", e)),
            };

            // Free the slot before reporting so the receiver can re-trigger.
            drop(guard);

            let event = match outcome {
                Ok(record) => ResolveEvent::Resolved(record),
                Err(reason) => {
                    tracing::error!("resolution failed: {}", reason);
                    ResolveEvent::Failed(reason)
                }
            };
            let _ = events.send(event);
        });

        Ok(handle)
    }

    /// Request cooperative cancellation of the running cycle.
    pub fn cancel(&self) -> bool {
        self.controller.cancel()
    }

    pub fn is_running(&self) -> bool {
        self.controller.is_running()
    }
}
