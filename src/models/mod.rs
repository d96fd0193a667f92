//! Domain models for the service topology.
//!
//! This module contains the core data structures used throughout the engine:
//! - [`Ipv4`] - IPv4 block with CIDR notation support
//! - [`Network`], [`SubnetTier`], [`Subnet`] - Virtual network structures
//! - [`RouteTable`] - Per-subnet routing
//! - [`PeeringConnection`] - Network pair link
//! - [`SecurityGroup`], [`NetworkAcl`] - Security enforcement
//! - [`LoadBalancer`], [`EndpointService`], [`InterfaceEndpoint`] - Exposure chain
//! - [`FlowLog`] - Traffic observability

mod flow_log;
mod ipv4;
mod network;
mod peering;
mod route;
mod security;
mod service;

// Re-export public types
pub use flow_log::{FlowLog, TrafficType, Warning, AGGREGATION_INTERVAL, FLOW_LOG_FORMAT};
pub use ipv4::{
    align_up, broadcast_addr, cut_addr, get_cidr_mask, ip_after_subnet, Ipv4, MAX_LENGTH,
    RESERVED_LEADING_HOSTS,
};
pub use network::{AvailabilityZone, Network, Subnet, SubnetTier, TierType};
pub use peering::{PeeringConnection, PeeringState};
pub use route::{Route, RouteTable, RouteTarget};
pub use security::{
    AclAction, AclRule, Direction, NetworkAcl, PortRange, Protocol, SecurityGroup,
    SecurityGroupRule, ServicePort,
};
pub use service::{
    EndpointService, ExposureState, InterfaceEndpoint, Listener, LoadBalancer, Target,
    TargetGroup,
};
