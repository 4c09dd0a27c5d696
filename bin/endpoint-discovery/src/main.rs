use anyhow::Result;
use kube::Client;
use mesh_catalog::{EndpointsProvider, InMemoryMeshSpec, MeshCatalog, MeshSpec, NamespacedService};
use mesh_discovery::{KubeMeshSpec, KubernetesProvider, StaticProvider};
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

mod config;

use config::CatalogConfig;

const REPORT_INTERVAL: Duration = Duration::from_secs(30);

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    info!("Starting endpoint-discovery daemon...");

    let config = CatalogConfig::from_env()?;
    debug!("Loaded configuration: {:?}", config);

    let mut providers: Vec<Arc<dyn EndpointsProvider>> = Vec::new();
    let mesh_spec: Arc<dyn MeshSpec> = if config.kubernetes {
        let client = Client::try_default().await?;
        providers.push(Arc::new(KubernetesProvider::new(client.clone(), &config.namespace)));

        let (mesh_spec, _watch) = KubeMeshSpec::spawn(client);
        mesh_spec.wait_until_ready().await?;
        info!("TrafficSplit watch synced");
        Arc::new(mesh_spec)
    } else {
        warn!("Kubernetes disabled - no TrafficSplits will be discovered");
        Arc::new(InMemoryMeshSpec::default())
    };

    if let Some(path) = &config.static_endpoints {
        providers.push(Arc::new(StaticProvider::from_file(path)?));
    }
    if providers.is_empty() {
        warn!("No endpoint providers configured");
    }

    let catalog = MeshCatalog::new(mesh_spec.clone(), providers);
    info!("Mesh catalog initialized with {} providers", catalog.providers().len());

    let _refresh = config
        .cache_refresh_interval
        .map(|interval| catalog.spawn_cache_refresh(interval));

    let mut ticker = tokio::time::interval(REPORT_INTERVAL);
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let count = report_backends(&catalog, mesh_spec.as_ref()).await;
                info!("Resolved {} weighted backends", count);
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Shutdown signal received, exiting...");
                break;
            }
        }
    }

    Ok(())
}

/// Log a format chosen by MESH_LOG_FORMAT (`json` or plain text), filtered by RUST_LOG
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    if std::env::var("MESH_LOG_FORMAT").is_ok_and(|f| f.eq_ignore_ascii_case("json")) {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Resolve every backend named by a TrafficSplit and log its endpoints
async fn report_backends(catalog: &MeshCatalog, mesh_spec: &dyn MeshSpec) -> usize {
    let backends: BTreeSet<NamespacedService> = mesh_spec
        .list_traffic_splits()
        .iter()
        .flat_map(|split| {
            let namespace = split.split_namespace();
            split
                .backends()
                .unwrap_or_default()
                .iter()
                .map(move |b| NamespacedService::new(namespace.clone(), b.service.as_str()))
        })
        .collect();

    let mut count = 0;
    for backend in &backends {
        for weighted in catalog.list_traffic_split_endpoints(backend).await {
            debug!(
                "{} -> {} (weight {}): {} endpoints",
                weighted.weighted_service.domain,
                weighted.weighted_service.service_name,
                weighted.weighted_service.weight,
                weighted.endpoints.len()
            );
            count += 1;
        }
    }

    debug!("Endpoint cache holds {} services", catalog.cache().len());
    count
}
