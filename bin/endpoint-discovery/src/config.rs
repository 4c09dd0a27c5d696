//! Daemon configuration read from the environment

use anyhow::{anyhow, bail, Result};
use std::path::PathBuf;
use std::time::Duration;

pub const ENV_NAMESPACE: &str = "MESH_NAMESPACE";
pub const ENV_CACHE_REFRESH_SECS: &str = "MESH_CACHE_REFRESH_SECS";
pub const ENV_STATIC_ENDPOINTS: &str = "MESH_STATIC_ENDPOINTS";
pub const ENV_KUBERNETES: &str = "MESH_KUBERNETES";

/// Settings for wiring a MeshCatalog with its providers
#[derive(Clone, Debug, PartialEq)]
pub struct CatalogConfig {
    /// Namespace the Kubernetes provider reads Endpoints from
    pub namespace: String,
    /// Interval of the background cache refresh; `None` disables it
    pub cache_refresh_interval: Option<Duration>,
    /// Path of the static (VM) endpoint registry, if any
    pub static_endpoints: Option<PathBuf>,
    /// Whether the Kubernetes provider and policy source are enabled
    pub kubernetes: bool,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            namespace: "default".to_string(),
            cache_refresh_interval: Some(Duration::from_secs(30)),
            static_endpoints: None,
            kubernetes: true,
        }
    }
}

impl CatalogConfig {
    /// Load the configuration from process environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load the configuration from an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(namespace) = lookup(ENV_NAMESPACE).filter(|v| !v.is_empty()) {
            config.namespace = namespace;
        }

        if let Some(secs) = lookup(ENV_CACHE_REFRESH_SECS) {
            let secs: u64 = secs.trim().parse().map_err(|_| {
                anyhow!(
                    "{} must be a number of seconds, got {:?}",
                    ENV_CACHE_REFRESH_SECS,
                    secs
                )
            })?;
            config.cache_refresh_interval = (secs > 0).then(|| Duration::from_secs(secs));
        }

        config.static_endpoints = lookup(ENV_STATIC_ENDPOINTS)
            .filter(|v| !v.is_empty())
            .map(PathBuf::from);

        if let Some(flag) = lookup(ENV_KUBERNETES) {
            config.kubernetes = parse_bool(ENV_KUBERNETES, &flag)?;
        }

        Ok(config)
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => bail!("{} must be a boolean, got {:?}", key, value),
    }
}
