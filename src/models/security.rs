//! Security groups and subnet network ACLs.

use super::Ipv4;
use crate::error::{Result, TopologyError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::Ipv4Addr;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Direction {
    Ingress,
    Egress,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Ingress => write!(f, "ingress"),
            Direction::Egress => write!(f, "egress"),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    Tcp,
    Udp,
    /// Every protocol (`-1`).
    All,
}

impl Protocol {
    pub fn matches(&self, other: Protocol) -> bool {
        *self == Protocol::All || *self == other
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Protocol::Tcp => write!(f, "tcp"),
            Protocol::Udp => write!(f, "udp"),
            Protocol::All => write!(f, "all"),
        }
    }
}

/// Inclusive port range.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PortRange {
    pub from: u16,
    pub to: u16,
}

impl PortRange {
    pub fn single(port: u16) -> Self {
        PortRange {
            from: port,
            to: port,
        }
    }

    pub fn all() -> Self {
        PortRange { from: 0, to: 65535 }
    }

    pub fn contains(&self, port: u16) -> bool {
        port >= self.from && port <= self.to
    }
}

/// A validated service port, 1-65535.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(try_from = "u32", into = "u16")]
pub struct ServicePort(u16);

impl ServicePort {
    pub fn new(port: u32) -> Result<ServicePort> {
        match u16::try_from(port) {
            Ok(p) if p >= 1 => Ok(ServicePort(p)),
            _ => Err(TopologyError::InvalidPort(port)),
        }
    }

    pub fn get(&self) -> u16 {
        self.0
    }
}

impl TryFrom<u32> for ServicePort {
    type Error = TopologyError;

    fn try_from(port: u32) -> Result<Self> {
        ServicePort::new(port)
    }
}

impl From<ServicePort> for u16 {
    fn from(port: ServicePort) -> u16 {
        port.0
    }
}

impl fmt::Display for ServicePort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SecurityGroupRule {
    pub cidr: Ipv4,
    pub protocol: Protocol,
    pub ports: PortRange,
    pub description: String,
}

impl SecurityGroupRule {
    fn matches(&self, addr: Ipv4Addr, protocol: Protocol, port: u16) -> bool {
        self.cidr.contains(addr) && self.protocol.matches(protocol) && self.ports.contains(port)
    }
}

/// Stateful security group owned by one network.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SecurityGroup {
    pub logical_id: String,
    pub network: String,
    pub description: String,
    pub ingress: Vec<SecurityGroupRule>,
    pub egress: Vec<SecurityGroupRule>,
}

impl SecurityGroup {
    pub fn new(logical_id: &str, network: &str, description: &str) -> SecurityGroup {
        SecurityGroup {
            logical_id: logical_id.to_string(),
            network: network.to_string(),
            description: description.to_string(),
            ingress: Vec::new(),
            egress: Vec::new(),
        }
    }

    /// Adds a rule; an identical (cidr, protocol, ports) rule is not repeated.
    pub fn add_rule(&mut self, direction: Direction, rule: SecurityGroupRule) {
        let rules = match direction {
            Direction::Ingress => &mut self.ingress,
            Direction::Egress => &mut self.egress,
        };
        let exists = rules
            .iter()
            .any(|r| r.cidr == rule.cidr && r.protocol == rule.protocol && r.ports == rule.ports);
        if !exists {
            rules.push(rule);
        }
    }

    pub fn allow_all_outbound(&mut self) {
        self.add_rule(
            Direction::Egress,
            SecurityGroupRule {
                cidr: Ipv4::any(),
                protocol: Protocol::All,
                ports: PortRange::all(),
                description: "Allow all outbound traffic by default".to_string(),
            },
        );
    }

    pub fn rules(&self, direction: Direction) -> &[SecurityGroupRule] {
        match direction {
            Direction::Ingress => &self.ingress,
            Direction::Egress => &self.egress,
        }
    }

    /// True if some rule in `direction` admits the flow; nothing else is allowed.
    pub fn permits(&self, direction: Direction, addr: Ipv4Addr, protocol: Protocol, port: u16) -> bool {
        self.rules(direction)
            .iter()
            .any(|r| r.matches(addr, protocol, port))
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AclAction {
    Allow,
    Deny,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AclRule {
    pub name: String,
    pub number: u16,
    pub direction: Direction,
    pub cidr: Ipv4,
    pub protocol: Protocol,
    pub ports: PortRange,
    pub action: AclAction,
}

/// Stateless subnet ACL: numbered rules, lowest number first, first match wins,
/// implicit deny when nothing matches.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NetworkAcl {
    pub logical_id: String,
    pub network: String,
    pub tier: String,
    /// Logical ids of the associated subnets.
    pub subnets: Vec<String>,
    pub rules: Vec<AclRule>,
}

impl NetworkAcl {
    pub fn new(logical_id: &str, network: &str, tier: &str, subnets: Vec<String>) -> NetworkAcl {
        NetworkAcl {
            logical_id: logical_id.to_string(),
            network: network.to_string(),
            tier: tier.to_string(),
            subnets,
            rules: Vec::new(),
        }
    }

    /// Rule numbers are unique per direction.
    pub fn add_rule(&mut self, rule: AclRule) -> Result<()> {
        if self
            .rules
            .iter()
            .any(|r| r.number == rule.number && r.direction == rule.direction)
        {
            return Err(TopologyError::RuleConflict {
                acl: self.logical_id.clone(),
                rule_number: rule.number,
                direction: rule.direction,
            });
        }
        self.rules.push(rule);
        self.rules.sort_by_key(|r| (r.direction, r.number));
        Ok(())
    }

    pub fn rules_for(&self, direction: Direction) -> impl Iterator<Item = &AclRule> {
        self.rules.iter().filter(move |r| r.direction == direction)
    }

    pub fn evaluate(&self, direction: Direction, addr: Ipv4Addr, protocol: Protocol, port: u16) -> AclAction {
        self.rules_for(direction)
            .find(|r| r.cidr.contains(addr) && r.protocol.matches(protocol) && r.ports.contains(port))
            .map(|r| r.action)
            .unwrap_or(AclAction::Deny)
    }
}
