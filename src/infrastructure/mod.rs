//! Infrastructure Layer
//!
//! Cross-cutting components shared by the application layer.

pub mod cycle_control;
pub mod ttl_cache;

pub use cycle_control::{CancellationToken, CycleController, CycleGuard};
pub use ttl_cache::TtlCache;
