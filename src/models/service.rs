//! Service exposure chain: load balancer, endpoint service, interface endpoints.

use super::{Protocol, ServicePort};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::Ipv4Addr;

/// Progress of one exposed service. `Exposed` is terminal.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExposureState {
    Unbuilt,
    Fronted,
    Serviced,
    Exposed,
}

impl fmt::Display for ExposureState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

/// Backend registered in a target group.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Target {
    Instance { instance: String, port: u16 },
    Ip { address: Ipv4Addr, port: u16 },
}

impl Target {
    pub fn port(&self) -> u16 {
        match self {
            Target::Instance { port, .. } | Target::Ip { port, .. } => *port,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Listener {
    pub port: ServicePort,
    pub protocol: Protocol,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TargetGroup {
    pub protocol: Protocol,
    pub port: ServicePort,
    /// When false the target sees the load balancer's private address as source.
    pub preserve_client_ip: bool,
    pub targets: Vec<Target>,
}

/// Internal layer-4 load balancer.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LoadBalancer {
    pub logical_id: String,
    pub network: String,
    pub subnets: Vec<String>,
    pub scheme: String,
    pub load_balancer_type: String,
    pub listener: Listener,
    pub target_group: TargetGroup,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct EndpointService {
    pub logical_id: String,
    pub load_balancer: String,
    pub acceptance_required: bool,
    pub allowed_principals: Vec<String>,
    /// Provider-generated service name, as a reference token.
    pub service_name: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct InterfaceEndpoint {
    pub logical_id: String,
    pub network: String,
    pub service: String,
    pub service_name: String,
    pub port: ServicePort,
    pub subnets: Vec<String>,
    pub security_groups: Vec<String>,
    pub private_dns_enabled: bool,
}
