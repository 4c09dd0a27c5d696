use kube::{CustomResource, ResourceExt};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// TrafficSplit routes traffic addressed to a root service across a set of
/// weighted backend services in the same namespace
#[derive(CustomResource, Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "split.smi-spec.io",
    version = "v1alpha2",
    kind = "TrafficSplit",
    plural = "trafficsplits",
    namespaced,
    derive = "Default",
    derive = "PartialEq",
    printcolumn = r#"{"name":"Service","type":"string","jsonPath":".spec.service"}"#,
)]
pub struct TrafficSplitSpec {
    /// Root service (domain) that clients address
    pub service: String,

    /// Backends receiving a share of the root service's traffic.
    /// A split without a backend list is ignored by the catalog.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backends: Option<Vec<TrafficSplitBackend>>,
}

/// A weighted backend of a TrafficSplit
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct TrafficSplitBackend {
    /// Name of the backend service, in the split's namespace
    pub service: String,

    /// Relative share of traffic, meaningful only against sibling backends
    #[serde(default)]
    pub weight: u32,
}

impl TrafficSplit {
    /// Namespace the split lives in; empty when the object carries none
    pub fn split_namespace(&self) -> String {
        self.namespace().unwrap_or_default()
    }

    /// `namespace/name` of the split, for logging
    pub fn qualified_name(&self) -> String {
        format!("{}/{}", self.split_namespace(), self.name_any())
    }

    /// Backends of this split, or `None` if the resource omits them
    pub fn backends(&self) -> Option<&[TrafficSplitBackend]> {
        self.spec.backends.as_deref()
    }
}
