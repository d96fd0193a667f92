//! Error types for topology synthesis.
//!
//! Every variant is fatal to plan generation: [`crate::synthesize`] returns no
//! plan at all when one is raised. Degraded outcomes are [`crate::models::Warning`]s.

use crate::models::{Direction, Ipv4};
use thiserror::Error;

/// Result type for topology operations.
pub type Result<T> = std::result::Result<T, TopologyError>;

/// Errors raised while planning, building or ordering a topology.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TopologyError {
    /// The requested subnets do not fit in the parent block.
    #[error("Address exhaustion in {network} ({cidr}): {reason}")]
    AddressExhaustion {
        network: String,
        cidr: Ipv4,
        reason: String,
    },

    /// A route table already owns an entry for this exact destination.
    #[error("Route conflict in route table {route_table}: destination {destination} already claimed")]
    RouteConflict {
        route_table: String,
        destination: Ipv4,
    },

    /// An ACL already has a rule with this number in this direction.
    #[error("Rule conflict in ACL {acl}: rule {rule_number} ({direction}) already exists")]
    RuleConflict {
        acl: String,
        rule_number: u16,
        direction: Direction,
    },

    #[error("Invalid service port {0}: must be within 1-65535")]
    InvalidPort(u32),

    /// Endpoint service requested before the load balancer had a target.
    #[error("Load balancer {0} has no registered target")]
    NoTargetRegistered(String),

    #[error("Invalid CIDR: {0}")]
    InvalidCidr(String),

    #[error("Network {0} overlaps with network {1}")]
    NetworkOverlap(String, String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A state machine was driven out of order.
    #[error("Invalid transition for {entity}: {from} -> {to}")]
    InvalidTransition {
        entity: String,
        from: String,
        to: String,
    },

    #[error("Dependency cycle detected involving: {0:?}")]
    DependencyCycle(Vec<String>),

    #[error("Resource {resource} depends on unknown resource {dependency}")]
    UnknownDependency {
        resource: String,
        dependency: String,
    },

    #[error("Duplicate logical id: {0}")]
    DuplicateLogicalId(String),

    /// A collaborator could not provide a resource the topology cannot do without.
    #[error("Collaborator failure: {0}")]
    Collaborator(String),

    /// Reading or parsing the configuration file failed.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<std::io::Error> for TopologyError {
    fn from(err: std::io::Error) -> Self {
        TopologyError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for TopologyError {
    fn from(err: serde_json::Error) -> Self {
        TopologyError::Config(err.to_string())
    }
}
