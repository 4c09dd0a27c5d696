//! MeshCatalog: the entry point for endpoint queries

use crate::cache::EndpointCache;
use crate::mesh_spec::MeshSpec;
use crate::provider::{list_from_all, EndpointsProvider, Providers};
use crate::resolver::TrafficSplitResolver;
use crate::{Endpoint, NamespacedService, ServiceName, WeightedServiceEndpoints};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// MeshCatalog owns the endpoint providers and the endpoint cache and answers
/// both policy-weighted and raw per-service endpoint queries
pub struct MeshCatalog {
    providers: Providers,
    cache: Arc<EndpointCache>,
    resolver: TrafficSplitResolver,
}

impl MeshCatalog {
    /// Create a catalog over `mesh_spec` with providers queried in the given order
    pub fn new(mesh_spec: Arc<dyn MeshSpec>, providers: Vec<Arc<dyn EndpointsProvider>>) -> Self {
        let providers: Providers = Arc::new(providers);
        let cache = Arc::new(EndpointCache::new(providers.clone()));
        let resolver = TrafficSplitResolver::new(mesh_spec, cache.clone());

        debug!(
            "Mesh catalog created with providers: [{}]",
            providers
                .iter()
                .map(|p| p.id())
                .collect::<Vec<_>>()
                .join(", ")
        );
        Self {
            providers,
            cache,
            resolver,
        }
    }

    /// Weighted endpoints of every traffic split backend that is exactly `client_id`
    pub async fn list_traffic_split_endpoints(
        &self,
        client_id: &NamespacedService,
    ) -> Vec<WeightedServiceEndpoints> {
        info!("Listing Endpoints for client: {}", client_id);
        self.resolver.resolve_weighted_endpoints(client_id).await
    }

    /// Endpoints of `service` from every provider, queried live and
    /// concatenated in registration order
    pub async fn list_endpoints_for_service(&self, service: &ServiceName) -> Vec<Endpoint> {
        list_from_all(&self.providers, service).await
    }

    /// Rebuild the endpoint cache from the providers
    pub async fn refresh_cache(&self) {
        self.cache.refresh().await;
    }

    /// Keep the endpoint cache fresh in the background
    pub fn spawn_cache_refresh(&self, interval: Duration) -> JoinHandle<()> {
        self.cache.clone().spawn_periodic_refresh(interval)
    }

    pub fn cache(&self) -> &Arc<EndpointCache> {
        &self.cache
    }

    pub fn providers(&self) -> &[Arc<dyn EndpointsProvider>] {
        &self.providers
    }
}
