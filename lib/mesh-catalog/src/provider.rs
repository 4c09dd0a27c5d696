//! Pluggable endpoint discovery sources

use crate::{endpoints_to_string, Endpoint, ServiceName};
use futures::future::join_all;
use std::sync::Arc;
use tracing::trace;

/// Ordered list of registered providers
pub type Providers = Arc<Vec<Arc<dyn EndpointsProvider>>>;

/// A discovery backend able to list the endpoints of a service.
///
/// Implementations never fail: a backend that knows nothing about the service,
/// or that cannot be reached, answers with an empty list. Calls may perform I/O
/// and must be safe to issue concurrently.
#[async_trait::async_trait]
pub trait EndpointsProvider: Send + Sync {
    /// List the endpoints this backend knows for `service`
    async fn list_endpoints_for_service(&self, service: &ServiceName) -> Vec<Endpoint>;

    /// Stable identifier used in diagnostics
    fn id(&self) -> &str;
}

/// Query every provider for `service` and concatenate their answers in
/// registration order. Duplicates are kept; providers with nothing to say are
/// skipped.
pub async fn list_from_all(
    providers: &[Arc<dyn EndpointsProvider>],
    service: &ServiceName,
) -> Vec<Endpoint> {
    let answers = join_all(
        providers
            .iter()
            .map(|provider| provider.list_endpoints_for_service(service)),
    )
    .await;

    let mut endpoints = Vec::new();
    for (provider, found) in providers.iter().zip(answers) {
        if found.is_empty() {
            trace!("[{}] No endpoints found for service={}", provider.id(), service);
            continue;
        }
        trace!(
            "[{}] Found endpoints={} for service={}",
            provider.id(),
            endpoints_to_string(&found),
            service
        );
        endpoints.extend(found);
    }
    endpoints
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::RwLock;

    /// In-memory provider whose data can be swapped out by tests
    pub struct MockProvider {
        id: String,
        endpoints: RwLock<HashMap<ServiceName, Vec<Endpoint>>>,
        calls: AtomicUsize,
    }

    impl MockProvider {
        pub fn new(id: &str) -> Self {
            Self {
                id: id.to_string(),
                endpoints: RwLock::new(HashMap::new()),
                calls: AtomicUsize::new(0),
            }
        }

        pub fn with(self, service: &str, endpoints: &[&str]) -> Self {
            self.set(service, endpoints);
            self
        }

        pub fn set(&self, service: &str, endpoints: &[&str]) {
            let parsed = endpoints.iter().map(|e| ep(e)).collect();
            self.endpoints
                .write()
                .unwrap()
                .insert(ServiceName::from(service), parsed);
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait::async_trait]
    impl EndpointsProvider for MockProvider {
        async fn list_endpoints_for_service(&self, service: &ServiceName) -> Vec<Endpoint> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.endpoints
                .read()
                .unwrap()
                .get(service)
                .cloned()
                .unwrap_or_default()
        }

        fn id(&self) -> &str {
            &self.id
        }
    }

    /// Provider that parks the first lookup of one service until released
    pub struct GatedProvider {
        pub inner: MockProvider,
        gated: ServiceName,
        armed: std::sync::atomic::AtomicBool,
        pub entered: tokio::sync::Notify,
        pub release: tokio::sync::Notify,
    }

    impl GatedProvider {
        pub fn new(inner: MockProvider, gated: &str) -> Self {
            Self {
                inner,
                gated: ServiceName::from(gated),
                armed: std::sync::atomic::AtomicBool::new(false),
                entered: tokio::sync::Notify::new(),
                release: tokio::sync::Notify::new(),
            }
        }

        /// Park the next lookup of the gated service
        pub fn arm(&self) {
            self.armed.store(true, Ordering::SeqCst);
        }
    }

    #[async_trait::async_trait]
    impl EndpointsProvider for GatedProvider {
        async fn list_endpoints_for_service(&self, service: &ServiceName) -> Vec<Endpoint> {
            if service == &self.gated && self.armed.swap(false, Ordering::SeqCst) {
                self.entered.notify_one();
                self.release.notified().await;
            }
            self.inner.list_endpoints_for_service(service).await
        }

        fn id(&self) -> &str {
            self.inner.id()
        }
    }

    pub fn ep(addr: &str) -> Endpoint {
        addr.parse::<std::net::SocketAddr>().unwrap().into()
    }
}
