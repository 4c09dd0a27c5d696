//! Per-service endpoint cache populated on demand from the registered providers

use crate::provider::{list_from_all, Providers};
use crate::{endpoints_to_string, CoreError, Endpoint, Result, ServiceName, WeightedService};
use arc_swap::ArcSwap;
use futures::future::join_all;
use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

type ServiceMap = HashMap<WeightedService, Vec<Endpoint>>;

/// EndpointCache maps weighted backends to the endpoints discovered for them.
///
/// The map is replaced as a whole on every refresh, so readers always see
/// either the previous or the next complete snapshot. Refreshes are serialized
/// and query the providers without blocking readers.
pub struct EndpointCache {
    providers: Providers,
    services: ArcSwap<ServiceMap>,
    refresh_lock: Mutex<()>,
    refreshes: AtomicU64,
}

impl EndpointCache {
    pub fn new(providers: Providers) -> Self {
        Self {
            providers,
            services: ArcSwap::from_pointee(HashMap::new()),
            refresh_lock: Mutex::new(()),
            refreshes: AtomicU64::new(0),
        }
    }

    /// Look up cached endpoints without touching the providers
    pub fn get(&self, service: &WeightedService) -> Option<Vec<Endpoint>> {
        self.services.load().get(service).cloned()
    }

    /// Return the endpoints of `service`, refreshing the cache once on a miss.
    ///
    /// Fails with [`CoreError::ServiceNotFound`] when no provider knows any
    /// endpoint for the service after the refresh.
    pub async fn resolve(&self, service: &WeightedService) -> Result<Vec<Endpoint>> {
        debug!("Resolving endpoints for service {}", service.service_name);
        if let Some(endpoints) = self.get(service) {
            return Ok(endpoints);
        }

        self.refresh_including(Some(service)).await;

        match self.get(service) {
            Some(endpoints) => {
                info!(
                    "Found Endpoints={} for service {}",
                    endpoints_to_string(&endpoints),
                    service.service_name
                );
                Ok(endpoints)
            }
            None => {
                error!("Did not find any Endpoints for service {}", service.service_name);
                Err(CoreError::ServiceNotFound(service.service_name.to_string()))
            }
        }
    }

    /// Rebuild every cached entry from the providers
    pub async fn refresh(&self) {
        self.refresh_including(None).await;
    }

    /// Drop the entry for `service`; the next resolve goes back to the providers
    pub async fn invalidate(&self, service: &WeightedService) {
        let _guard = self.refresh_lock.lock().await;
        let current = self.services.load_full();
        if !current.contains_key(service) {
            return;
        }
        let mut next = (*current).clone();
        next.remove(service);
        self.services.store(Arc::new(next));
        debug!("Invalidated endpoints for service {}", service.service_name);
    }

    /// Drop every entry
    pub async fn clear(&self) {
        let _guard = self.refresh_lock.lock().await;
        self.services.store(Arc::new(HashMap::new()));
        debug!("Cleared endpoint cache");
    }

    /// Number of cached services
    pub fn len(&self) -> usize {
        self.services.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.load().is_empty()
    }

    /// Number of refreshes run since the cache was created
    pub fn refresh_count(&self) -> u64 {
        self.refreshes.load(Ordering::SeqCst)
    }

    /// Refresh the cache every `interval` until the returned task is aborted
    pub fn spawn_periodic_refresh(self: Arc<Self>, interval: Duration) -> JoinHandle<()> {
        info!("Endpoint cache refresh scheduled every {:?}", interval);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            // The first tick completes immediately.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                self.refresh().await;
            }
        })
    }

    async fn refresh_including(&self, missed: Option<&WeightedService>) {
        let _guard = self.refresh_lock.lock().await;

        // Another caller may have populated the key while we waited for the lock.
        if let Some(service) = missed {
            if self.services.load().contains_key(service) {
                return;
            }
        }

        let current = self.services.load_full();
        let mut keys: Vec<WeightedService> = current.keys().cloned().collect();
        if let Some(service) = missed {
            keys.push(service.clone());
        }

        let names: BTreeSet<ServiceName> = keys
            .iter()
            .map(|key| key.service_name.service.clone())
            .collect();
        let providers = self.providers.as_slice();
        let discovered: HashMap<ServiceName, Vec<Endpoint>> =
            join_all(names.into_iter().map(|name| async move {
                let endpoints = list_from_all(providers, &name).await;
                (name, endpoints)
            }))
            .await
            .into_iter()
            .collect();

        let next: ServiceMap = keys
            .into_iter()
            .filter_map(|key| {
                let endpoints = discovered.get(&key.service_name.service)?;
                if endpoints.is_empty() {
                    return None;
                }
                Some((key, endpoints.clone()))
            })
            .collect();

        debug!(
            "Refreshed endpoint cache: {} of {} services have endpoints",
            next.len(),
            discovered.len()
        );
        self.services.store(Arc::new(next));
        self.refreshes.fetch_add(1, Ordering::SeqCst);
    }
}
