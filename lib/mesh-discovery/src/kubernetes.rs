//! Endpoint discovery from Kubernetes Endpoints objects

use k8s_openapi::api::core::v1::Endpoints;
use kube::{Api, Client};
use mesh_catalog::{Endpoint, EndpointsProvider, ServiceName};
use std::net::IpAddr;
use tracing::{debug, warn};

/// KubernetesProvider lists the ready addresses of the Endpoints object named
/// after a service, in a single namespace
pub struct KubernetesProvider {
    id: String,
    endpoints: Api<Endpoints>,
}

impl KubernetesProvider {
    /// Create a provider reading Endpoints in `namespace`
    pub fn new(client: Client, namespace: &str) -> Self {
        Self {
            id: format!("kubernetes/{}", namespace),
            endpoints: Api::namespaced(client, namespace),
        }
    }

    /// Create a provider using the default Kubernetes client configuration
    pub async fn try_default(namespace: &str) -> anyhow::Result<Self> {
        let client = Client::try_default().await?;
        Ok(Self::new(client, namespace))
    }
}

#[async_trait::async_trait]
impl EndpointsProvider for KubernetesProvider {
    async fn list_endpoints_for_service(&self, service: &ServiceName) -> Vec<Endpoint> {
        match self.endpoints.get_opt(service.as_str()).await {
            Ok(Some(object)) => {
                let endpoints = endpoints_from_object(&object);
                debug!("[{}] Discovered {} endpoints for {}", self.id, endpoints.len(), service);
                endpoints
            }
            Ok(None) => {
                debug!("[{}] No Endpoints object for {}", self.id, service);
                Vec::new()
            }
            Err(e) => {
                warn!("[{}] Error getting Endpoints for {}: {}", self.id, service, e);
                Vec::new()
            }
        }
    }

    fn id(&self) -> &str {
        &self.id
    }
}

/// Flatten an Endpoints object into one endpoint per ready address and port
pub fn endpoints_from_object(object: &Endpoints) -> Vec<Endpoint> {
    let mut endpoints = Vec::new();

    for subset in object.subsets.iter().flatten() {
        let ports: Vec<u16> = subset
            .ports
            .iter()
            .flatten()
            .filter_map(|p| u16::try_from(p.port).ok())
            .collect();

        for address in subset.addresses.iter().flatten() {
            let ip: IpAddr = match address.ip.parse() {
                Ok(ip) => ip,
                Err(_) => {
                    warn!("Skipping unparsable endpoint address {:?}", address.ip);
                    continue;
                }
            };
            endpoints.extend(ports.iter().map(|port| Endpoint::new(ip, *port)));
        }
    }

    endpoints
}

#[cfg(test)]
mod tests {
    use super::*;
    use k8s_openapi::api::core::v1::{EndpointAddress, EndpointPort, EndpointSubset};

    fn address(ip: &str) -> EndpointAddress {
        EndpointAddress {
            ip: ip.to_string(),
            ..Default::default()
        }
    }

    fn port(port: i32) -> EndpointPort {
        EndpointPort {
            port,
            ..Default::default()
        }
    }

    fn endpoint(addr: &str) -> Endpoint {
        addr.parse::<std::net::SocketAddr>().unwrap().into()
    }

    #[test]
    fn test_endpoints_from_object() {
        let object = Endpoints {
            subsets: Some(vec![
                EndpointSubset {
                    addresses: Some(vec![address("10.0.0.1"), address("10.0.0.2")]),
                    not_ready_addresses: Some(vec![address("10.0.0.3")]),
                    ports: Some(vec![port(80), port(443)]),
                },
                EndpointSubset {
                    addresses: Some(vec![address("fd00::1")]),
                    not_ready_addresses: None,
                    ports: Some(vec![port(8080)]),
                },
            ]),
            ..Default::default()
        };

        assert_eq!(
            endpoints_from_object(&object),
            vec![
                endpoint("10.0.0.1:80"),
                endpoint("10.0.0.1:443"),
                endpoint("10.0.0.2:80"),
                endpoint("10.0.0.2:443"),
                endpoint("[fd00::1]:8080"),
            ]
        );
    }

    #[test]
    fn test_endpoints_from_empty_object() {
        assert!(endpoints_from_object(&Endpoints::default()).is_empty());

        let no_ports = Endpoints {
            subsets: Some(vec![EndpointSubset {
                addresses: Some(vec![address("10.0.0.1")]),
                ..Default::default()
            }]),
            ..Default::default()
        };
        assert!(endpoints_from_object(&no_ports).is_empty());
    }

    #[test]
    fn test_invalid_addresses_and_ports_are_skipped() {
        let object = Endpoints {
            subsets: Some(vec![EndpointSubset {
                addresses: Some(vec![address("not-an-ip"), address("10.0.0.1")]),
                not_ready_addresses: None,
                ports: Some(vec![port(-1), port(70000), port(80)]),
            }]),
            ..Default::default()
        };

        assert_eq!(endpoints_from_object(&object), vec![endpoint("10.0.0.1:80")]);
    }
}
