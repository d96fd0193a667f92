//! Per-subnet route tables.

use super::Ipv4;
use crate::error::{Result, TopologyError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::Ipv4Addr;

/// Next hop of a route.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
#[serde(tag = "type", content = "ref", rename_all = "camelCase")]
pub enum RouteTarget {
    /// Traffic stays inside the owning network.
    Local,
    InternetGateway(String),
    PeeringConnection(String),
}

impl fmt::Display for RouteTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RouteTarget::Local => write!(f, "local"),
            RouteTarget::InternetGateway(id) => write!(f, "igw:{id}"),
            RouteTarget::PeeringConnection(id) => write!(f, "pcx:{id}"),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Route {
    pub destination: Ipv4,
    pub target: RouteTarget,
}

/// Route table owned by exactly one subnet.
///
/// Entries are append-only per destination: a second route for the same
/// destination CIDR is a [`TopologyError::RouteConflict`].
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RouteTable {
    pub logical_id: String,
    /// Logical id of the owning subnet.
    pub subnet: String,
    pub routes: Vec<Route>,
}

impl RouteTable {
    /// Create a table holding only the implicit local route for `network_cidr`.
    pub fn new(logical_id: &str, subnet: &str, network_cidr: Ipv4) -> RouteTable {
        RouteTable {
            logical_id: logical_id.to_string(),
            subnet: subnet.to_string(),
            routes: vec![Route {
                destination: network_cidr,
                target: RouteTarget::Local,
            }],
        }
    }

    /// Fails without mutating the table if `destination` is already routed.
    pub fn check_free(&self, destination: Ipv4) -> Result<()> {
        if self.route_to(destination).is_some() {
            return Err(TopologyError::RouteConflict {
                route_table: self.logical_id.clone(),
                destination,
            });
        }
        Ok(())
    }

    pub fn add_route(&mut self, destination: Ipv4, target: RouteTarget) -> Result<()> {
        self.check_free(destination)?;
        log::trace!(
            "route {} += {destination} -> {target}",
            self.logical_id
        );
        self.routes.push(Route {
            destination,
            target,
        });
        Ok(())
    }

    /// Entry for exactly this destination CIDR.
    pub fn route_to(&self, destination: Ipv4) -> Option<&Route> {
        self.routes.iter().find(|r| r.destination == destination)
    }

    /// Longest-prefix match for a packet destination.
    pub fn lookup(&self, addr: Ipv4Addr) -> Option<&Route> {
        self.routes
            .iter()
            .filter(|r| r.destination.contains(addr))
            .max_by_key(|r| r.destination.mask)
    }

    pub fn local_cidr(&self) -> Option<Ipv4> {
        self.routes
            .iter()
            .find(|r| r.target == RouteTarget::Local)
            .map(|r| r.destination)
    }
}
