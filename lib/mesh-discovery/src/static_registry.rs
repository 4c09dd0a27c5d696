//! Endpoint discovery from a static registry file, for workloads outside the
//! cluster such as virtual machines
//!
//! The registry is YAML mapping service names to `ip:port` addresses:
//!
//! ```yaml
//! services:
//!   bookstore:
//!     - 192.168.10.4:8080
//!     - "[fd00::4]:8080"
//! ```

use mesh_catalog::{CoreError, Endpoint, EndpointsProvider, Result, ServiceName};
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::net::SocketAddr;
use std::path::Path;
use tracing::info;

#[derive(Debug, Deserialize)]
struct RegistryFile {
    #[serde(default)]
    services: BTreeMap<String, Vec<String>>,
}

/// StaticProvider answers from a fixed service to endpoints table
pub struct StaticProvider {
    id: String,
    services: HashMap<ServiceName, Vec<Endpoint>>,
}

impl StaticProvider {
    pub fn new(id: impl Into<String>, services: HashMap<ServiceName, Vec<Endpoint>>) -> Self {
        Self {
            id: id.into(),
            services,
        }
    }

    /// Load a registry file; the provider id is derived from the path
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        let provider = Self::from_yaml(format!("static/{}", path.display()), &contents)?;
        info!(
            "Loaded {} services from static registry {}",
            provider.services.len(),
            path.display()
        );
        Ok(provider)
    }

    /// Parse registry YAML. Every address must be a valid `ip:port`.
    pub fn from_yaml(id: impl Into<String>, contents: &str) -> Result<Self> {
        let file: RegistryFile = serde_yaml::from_str(contents)?;

        let mut services = HashMap::with_capacity(file.services.len());
        for (name, addresses) in file.services {
            let endpoints = addresses
                .iter()
                .map(|addr| {
                    addr.parse::<SocketAddr>().map(Endpoint::from).map_err(|_| {
                        CoreError::InvalidConfiguration(format!(
                            "invalid endpoint {:?} for service {}",
                            addr, name
                        ))
                    })
                })
                .collect::<Result<Vec<_>>>()?;
            services.insert(ServiceName::from(name), endpoints);
        }

        Ok(Self::new(id, services))
    }

    /// Services the registry knows
    pub fn services(&self) -> impl Iterator<Item = &ServiceName> {
        self.services.keys()
    }
}

#[async_trait::async_trait]
impl EndpointsProvider for StaticProvider {
    async fn list_endpoints_for_service(&self, service: &ServiceName) -> Vec<Endpoint> {
        self.services.get(service).cloned().unwrap_or_default()
    }

    fn id(&self) -> &str {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn endpoint(addr: &str) -> Endpoint {
        addr.parse::<SocketAddr>().unwrap().into()
    }

    const REGISTRY: &str = r#"
services:
  bookstore:
    - 192.168.10.4:8080
    - "[fd00::4]:8080"
  bookbuyer: []
"#;

    #[tokio::test]
    async fn test_from_yaml() {
        let provider = StaticProvider::from_yaml("vm", REGISTRY).unwrap();
        assert_eq!(provider.id(), "vm");
        assert_eq!(provider.services().count(), 2);

        assert_eq!(
            provider
                .list_endpoints_for_service(&ServiceName::from("bookstore"))
                .await,
            vec![endpoint("192.168.10.4:8080"), endpoint("[fd00::4]:8080")]
        );
        assert!(provider
            .list_endpoints_for_service(&ServiceName::from("bookbuyer"))
            .await
            .is_empty());
        assert!(provider
            .list_endpoints_for_service(&ServiceName::from("unknown"))
            .await
            .is_empty());
    }

    #[test]
    fn test_empty_registry() {
        let provider = StaticProvider::from_yaml("vm", "{}").unwrap();
        assert_eq!(provider.services().count(), 0);
    }

    #[test]
    fn test_invalid_address_is_rejected() {
        let err = StaticProvider::from_yaml("vm", "services:\n  bookstore:\n    - 192.168.10.4\n")
            .err()
            .unwrap();
        assert!(matches!(err, CoreError::InvalidConfiguration(_)));
    }

    #[test]
    fn test_invalid_yaml_is_rejected() {
        let err = StaticProvider::from_yaml("vm", "services: [").err().unwrap();
        assert!(matches!(err, CoreError::Yaml(_)));
    }

    #[tokio::test]
    async fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(REGISTRY.as_bytes()).unwrap();

        let provider = StaticProvider::from_file(file.path()).unwrap();
        assert!(provider.id().starts_with("static/"));
        assert_eq!(
            provider
                .list_endpoints_for_service(&ServiceName::from("bookstore"))
                .await
                .len(),
            2
        );
    }

    #[test]
    fn test_missing_file() {
        let err = StaticProvider::from_file("/nonexistent/registry.yaml").err().unwrap();
        assert!(matches!(err, CoreError::Io(_)));
    }
}
