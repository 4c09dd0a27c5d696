//! Endpoint and service identity types

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::{IpAddr, SocketAddr};

/// Name of a logical service, case-sensitive
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ServiceName(String);

impl ServiceName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ServiceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ServiceName {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for ServiceName {
    fn from(name: String) -> Self {
        Self(name)
    }
}

/// A service scoped by namespace. Used both as a client identity and as the
/// key traffic split backends are matched against; equality is exact.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NamespacedService {
    pub namespace: String,
    pub service: ServiceName,
}

impl NamespacedService {
    pub fn new(namespace: impl Into<String>, service: impl Into<ServiceName>) -> Self {
        Self {
            namespace: namespace.into(),
            service: service.into(),
        }
    }
}

impl fmt::Display for NamespacedService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.service)
    }
}

/// A network address backing one instance of a service
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Endpoint {
    pub ip: IpAddr,
    pub port: u16,
}

impl Endpoint {
    pub fn new(ip: IpAddr, port: u16) -> Self {
        Self { ip, port }
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.ip, self.port)
    }
}

impl From<SocketAddr> for Endpoint {
    fn from(addr: SocketAddr) -> Self {
        Self::new(addr.ip(), addr.port())
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.socket_addr().fmt(f)
    }
}

/// A backend service together with the traffic split weight and the root
/// domain it was matched under
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WeightedService {
    pub service_name: NamespacedService,
    pub weight: u32,
    pub domain: String,
}

/// Endpoints resolved for a weighted backend. An empty list means the route
/// exists but no endpoints are known yet.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeightedServiceEndpoints {
    pub weighted_service: WeightedService,
    pub endpoints: Vec<Endpoint>,
}

/// Render endpoints as a comma separated list for diagnostics
pub fn endpoints_to_string(endpoints: &[Endpoint]) -> String {
    endpoints
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_namespaced_service_equality_is_exact() {
        let a = NamespacedService::new("ns1", "v1");
        assert_eq!(a, NamespacedService::new("ns1", "v1"));
        assert_ne!(a, NamespacedService::new("ns1", "v1-canary"));
        assert_ne!(a, NamespacedService::new("ns", "v1"));
        assert_ne!(a, NamespacedService::new("ns1", "V1"));
    }

    #[test]
    fn test_namespaced_service_display() {
        assert_eq!(NamespacedService::new("ns1", "v1").to_string(), "ns1/v1");
    }

    #[test]
    fn test_endpoint_display() {
        let v4 = Endpoint::new("10.0.0.1".parse().unwrap(), 80);
        assert_eq!(v4.to_string(), "10.0.0.1:80");

        let v6 = Endpoint::new("fd00::1".parse().unwrap(), 8080);
        assert_eq!(v6.to_string(), "[fd00::1]:8080");
    }

    #[test]
    fn test_endpoints_to_string() {
        let endpoints = vec![
            Endpoint::new("10.0.0.1".parse().unwrap(), 80),
            Endpoint::new("10.0.0.2".parse().unwrap(), 8080),
        ];
        assert_eq!(endpoints_to_string(&endpoints), "10.0.0.1:80,10.0.0.2:8080");
        assert_eq!(endpoints_to_string(&[]), "");
    }
}
