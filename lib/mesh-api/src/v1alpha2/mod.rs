/// API version v1alpha2 of the SMI traffic split resources

pub mod traffic_split;

pub use traffic_split::{TrafficSplit, TrafficSplitBackend, TrafficSplitSpec};

/// API group for traffic split resources
pub const API_GROUP: &str = "split.smi-spec.io";
/// API version for traffic split resources
pub const API_VERSION: &str = "v1alpha2";
