//! Resolution of traffic split policy into weighted backend endpoints

use crate::cache::EndpointCache;
use crate::mesh_spec::MeshSpec;
use crate::{NamespacedService, ServiceName, WeightedService, WeightedServiceEndpoints};
use std::sync::Arc;
use tracing::{debug, error, trace};

/// TrafficSplitResolver matches a client identity against traffic split
/// backends and attaches cached endpoints to each match
pub struct TrafficSplitResolver {
    mesh_spec: Arc<dyn MeshSpec>,
    cache: Arc<EndpointCache>,
}

impl TrafficSplitResolver {
    pub fn new(mesh_spec: Arc<dyn MeshSpec>, cache: Arc<EndpointCache>) -> Self {
        Self { mesh_spec, cache }
    }

    /// Build one entry per (split, backend) pair whose backend is exactly
    /// `client_id`. Splits keep the order the policy source yields them in.
    /// Backends without resolvable endpoints still produce an entry, with an
    /// empty endpoint list.
    pub async fn resolve_weighted_endpoints(
        &self,
        client_id: &NamespacedService,
    ) -> Vec<WeightedServiceEndpoints> {
        let mut service_endpoints = Vec::new();

        for split in self.mesh_spec.list_traffic_splits() {
            debug!("Discovered TrafficSplit resource: {}", split.qualified_name());
            let Some(backends) = split.backends() else {
                error!(
                    "TrafficSplit {} has no Backends in Spec; Skipping...",
                    split.qualified_name()
                );
                continue;
            };

            let namespace = split.split_namespace();
            let domain = &split.spec.service;
            for backend in backends {
                let candidate = NamespacedService {
                    namespace: namespace.clone(),
                    service: ServiceName::new(backend.service.as_str()),
                };
                if &candidate != client_id {
                    continue;
                }

                let weighted_service = WeightedService {
                    service_name: candidate,
                    weight: backend.weight,
                    domain: domain.clone(),
                };
                let endpoints = match self.cache.resolve(&weighted_service).await {
                    Ok(endpoints) => endpoints,
                    Err(e) => {
                        error!(
                            "Error getting Endpoints for service {}: {}",
                            weighted_service.service_name, e
                        );
                        Vec::new()
                    }
                };
                service_endpoints.push(WeightedServiceEndpoints {
                    weighted_service,
                    endpoints,
                });
            }
        }

        trace!("Constructed service endpoints: {:?}", service_endpoints);
        service_endpoints
    }
}
