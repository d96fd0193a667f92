//! Peering between two networks and the routes that make it usable.
//!
//! Every route table on each side gets exactly one route to the other side's
//! primary block. The router never touches security rules.

use crate::error::{Result, TopologyError};
use crate::models::{Ipv4, Network, PeeringConnection, PeeringState, RouteTarget};
use crate::plan::logical_id;
use serde::{Deserialize, Serialize};

/// A route added to one subnet route table for a peering connection.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PeeringRoute {
    pub logical_id: String,
    pub network: String,
    pub route_table: String,
    pub destination: Ipv4,
    pub peering: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeeringOutcome {
    pub connection: PeeringConnection,
    /// Requester side first, then accepter side, in subnet order.
    pub routes: Vec<PeeringRoute>,
}

/// Logical id of the connection for an unordered network pair.
pub fn peering_id(a: &Network, b: &Network) -> String {
    let (first, second) = if a.logical_id <= b.logical_id {
        (a, b)
    } else {
        (b, a)
    };
    logical_id(&[first.logical_id.as_str(), second.logical_id.as_str(), "Peering"])
}

/// Peer `requester` with `accepter` and route each side to the other.
///
/// All route tables are checked before any is modified, so on
/// [`TopologyError::RouteConflict`] neither network has changed. Running this
/// twice on the same pair is therefore rejected rather than duplicated.
pub fn peer_networks(requester: &mut Network, accepter: &mut Network) -> Result<PeeringOutcome> {
    log::info!(
        "#Start peer_networks() {} <-> {}",
        requester.logical_id,
        accepter.logical_id
    );
    if requester.logical_id == accepter.logical_id {
        return Err(TopologyError::InvalidConfig(format!(
            "cannot peer {} with itself",
            requester.logical_id
        )));
    }
    if requester.cidr.overlaps(&accepter.cidr) {
        return Err(TopologyError::NetworkOverlap(
            format!("{} ({})", requester.name, requester.cidr),
            format!("{} ({})", accepter.name, accepter.cidr),
        ));
    }

    for rt in requester.route_tables() {
        rt.check_free(accepter.cidr)?;
    }
    for rt in accepter.route_tables() {
        rt.check_free(requester.cidr)?;
    }

    let connection = PeeringConnection {
        logical_id: peering_id(requester, accepter),
        requester: requester.logical_id.clone(),
        requester_cidr: requester.cidr,
        accepter: accepter.logical_id.clone(),
        accepter_cidr: accepter.cidr,
        state: PeeringState::Pending,
    };

    let mut routes = route_to_peer(requester, accepter, &connection.logical_id)?;
    routes.extend(route_to_peer(accepter, requester, &connection.logical_id)?);

    log::info!(
        "{}: {} routes added",
        connection.logical_id,
        routes.len()
    );
    Ok(PeeringOutcome { connection, routes })
}

fn route_to_peer(network: &mut Network, peer: &Network, peering: &str) -> Result<Vec<PeeringRoute>> {
    let network_id = network.logical_id.clone();
    let mut added = Vec::new();
    for subnet in network.subnets_mut() {
        let rt = &mut subnet.route_table;
        rt.add_route(peer.cidr, RouteTarget::PeeringConnection(peering.to_string()))?;
        log::debug!("{} += {} -> {peering}", rt.logical_id, peer.cidr);
        added.push(PeeringRoute {
            logical_id: logical_id(&[rt.logical_id.as_str(), "To", peer.logical_id.as_str()]),
            network: network_id.clone(),
            route_table: rt.logical_id.clone(),
            destination: peer.cidr,
            peering: peering.to_string(),
        });
    }
    Ok(added)
}
