//! Source of traffic split policy

use mesh_api::TrafficSplit;
use std::sync::RwLock;

/// MeshSpec exposes the traffic split objects currently known to the mesh
pub trait MeshSpec: Send + Sync {
    /// All traffic splits, in the order the source holds them
    fn list_traffic_splits(&self) -> Vec<TrafficSplit>;
}

/// MeshSpec backed by a list held in memory
#[derive(Default)]
pub struct InMemoryMeshSpec {
    splits: RwLock<Vec<TrafficSplit>>,
}

impl InMemoryMeshSpec {
    pub fn new(splits: Vec<TrafficSplit>) -> Self {
        Self {
            splits: RwLock::new(splits),
        }
    }

    /// Replace the held splits
    pub fn set_traffic_splits(&self, splits: Vec<TrafficSplit>) {
        match self.splits.write() {
            Ok(mut guard) => *guard = splits,
            Err(poisoned) => *poisoned.into_inner() = splits,
        }
    }
}

impl MeshSpec for InMemoryMeshSpec {
    fn list_traffic_splits(&self) -> Vec<TrafficSplit> {
        match self.splits.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}
