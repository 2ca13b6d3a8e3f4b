//! ip-checker Library
//!
//! Resolves the caller's public IP address and geolocation from chains of
//! public providers. Exposed as a library for integration tests and
//! embedding; `main.rs` is the CLI composition root.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;

// Re-export commonly used types
pub use application::{CycleContext, LookupService, ResolverSettings, SourceChainResolver};
pub use config::load_config;
pub use domain::entities::{Coordinates, GeoRecord, HistoryEntry, ProviderEndpoint};
pub use domain::errors::{ProviderError, ResolveError};
pub use domain::ports::{ConnectivityProbe, HistoryStore, HttpFetcher};
pub use domain::services::Normalizer;
pub use domain::value_objects::{ConnectivityState, PublicAddress, ResponseFormat};
