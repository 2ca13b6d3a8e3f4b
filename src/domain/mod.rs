//! Domain Layer
//!
//! Entities, value objects, ports and pure services. Nothing in here
//! performs I/O.

pub mod entities;
pub mod errors;
pub mod payload;
pub mod ports;
pub mod services;
pub mod value_objects;

pub use entities::{Coordinates, GeoRecord, HistoryEntry, ProviderEndpoint};
pub use errors::{ProviderError, ResolveError};
pub use value_objects::{CacheKey, ConnectivityState, PublicAddress, ResponseFormat};
