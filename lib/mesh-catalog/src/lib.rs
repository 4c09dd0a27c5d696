//! Mesh endpoint catalog
//!
//! This library provides:
//! - Endpoint providers: pluggable discovery sources merged into one answer
//! - Endpoint cache populated on demand from all providers
//! - Traffic split resolution into weighted backend endpoints
//! - MeshCatalog, the entry point tying the above together

pub mod cache;
pub mod catalog;
pub mod endpoint;
pub mod error;
pub mod mesh_spec;
pub mod provider;
pub mod resolver;

pub use cache::EndpointCache;
pub use catalog::MeshCatalog;
pub use endpoint::{
    endpoints_to_string, Endpoint, NamespacedService, ServiceName, WeightedService,
    WeightedServiceEndpoints,
};
pub use error::{CoreError, Result};
pub use mesh_spec::{InMemoryMeshSpec, MeshSpec};
pub use provider::{EndpointsProvider, Providers};
pub use resolver::TrafficSplitResolver;
