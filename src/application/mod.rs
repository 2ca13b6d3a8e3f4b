//! Application Layer
//!
//! Use cases orchestrating domain services and ports.

pub mod lookup_service;
pub mod resolver_service;

pub use lookup_service::LookupService;
pub use resolver_service::{
    default_address_providers, default_geo_providers, CycleContext, ResolverSettings,
    SourceChainResolver,
};
