//! Mesh policy API types and CRDs for Kubernetes integration
//!
//! This library defines the custom resources consumed by the mesh catalog:
//! - TrafficSplit: weighted routing of a root service across backend services

pub mod v1alpha2;

pub use v1alpha2::{TrafficSplit, TrafficSplitBackend, TrafficSplitSpec};
