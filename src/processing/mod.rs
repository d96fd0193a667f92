//! Topology composition logic.
//!
//! The components, leaf first, each fed explicitly with what it works on:
//! - [`address_planner`] - CIDR allocation for networks and tiers
//! - [`network_builder`] - Networks, subnets and per-subnet route tables
//! - [`peering_router`] - Peering connection and the routes across it
//! - [`security_policy`] - Security groups and isolated-tier ACLs
//! - [`service_exposer`] - Load balancer, endpoint service, interface endpoints
//! - [`observability`] - Flow logs

pub mod address_planner;
pub mod network_builder;
pub mod observability;
pub mod peering_router;
pub mod security_policy;
pub mod service_exposer;

// Re-export public functions
pub use address_planner::{plan_addresses, plan_network, AddressPlan, NetworkPlan, TierPlan};
pub use network_builder::{attach_internet_gateway, build_network};
pub use observability::{attach_observability, bind_flow_logs, Observability};
pub use peering_router::{peer_networks, peering_id, PeeringOutcome, PeeringRoute};
pub use security_policy::{
    compose_isolated_acls, compose_security_groups, SecurityPolicy, ACL_RULE_NUMBER,
};
pub use service_exposer::{Exposure, ServiceExposer};
