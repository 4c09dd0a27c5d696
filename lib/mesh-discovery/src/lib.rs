//! Endpoint providers and policy sources for the mesh catalog
pub mod kubernetes;
pub mod mesh_spec;
pub mod static_registry;

pub use kubernetes::KubernetesProvider;
pub use mesh_spec::KubeMeshSpec;
pub use static_registry::StaticProvider;
