//! TrafficSplit policy source backed by a Kubernetes watch

use futures::StreamExt;
use kube::runtime::reflector::Store;
use kube::runtime::{reflector, watcher, WatchStreamExt};
use kube::{Api, Client, ResourceExt};
use mesh_api::TrafficSplit;
use mesh_catalog::MeshSpec;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// KubeMeshSpec serves TrafficSplits from a reflector cache kept in sync with
/// the API server
pub struct KubeMeshSpec {
    store: Store<TrafficSplit>,
}

impl KubeMeshSpec {
    /// Start watching TrafficSplits in all namespaces. The returned task
    /// drives the watch and must be kept running.
    pub fn spawn(client: Client) -> (Self, JoinHandle<()>) {
        let api: Api<TrafficSplit> = Api::all(client);
        let (store, writer) = reflector::store();

        let stream = reflector(writer, watcher(api, watcher::Config::default()))
            .default_backoff()
            .touched_objects();

        let task = tokio::spawn(async move {
            info!("Starting TrafficSplit watch");
            stream
                .for_each(|event| async move {
                    match event {
                        Ok(split) => debug!(
                            "TrafficSplit {}/{} changed",
                            split.namespace().unwrap_or_default(),
                            split.name_any()
                        ),
                        Err(e) => warn!("TrafficSplit watch error: {}", e),
                    }
                })
                .await;
        });

        (Self { store }, task)
    }

    /// Wait until the initial list of TrafficSplits has been received
    pub async fn wait_until_ready(&self) -> anyhow::Result<()> {
        self.store.wait_until_ready().await?;
        Ok(())
    }
}

impl MeshSpec for KubeMeshSpec {
    fn list_traffic_splits(&self) -> Vec<TrafficSplit> {
        sorted_splits(self.store.state())
    }
}

/// The reflector store is unordered; present splits by namespace and name so
/// resolution output is stable between calls
fn sorted_splits(splits: Vec<Arc<TrafficSplit>>) -> Vec<TrafficSplit> {
    let mut splits: Vec<TrafficSplit> = splits.into_iter().map(|s| (*s).clone()).collect();
    splits.sort_by_key(|s| (s.namespace().unwrap_or_default(), s.name_any()));
    splits
}
