//! Peering connection between two networks.

use super::Ipv4;
use crate::error::{Result, TopologyError};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PeeringState {
    Pending,
    Active,
    Failed,
    Deleted,
}

impl fmt::Display for PeeringState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

/// Peering link for an unordered pair of networks.
///
/// `requester` opens the connection and `accepter` accepts it; the pair is
/// still unordered for identity, see [`PeeringConnection::pair`].
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PeeringConnection {
    pub logical_id: String,
    pub requester: String,
    pub requester_cidr: Ipv4,
    pub accepter: String,
    pub accepter_cidr: Ipv4,
    pub state: PeeringState,
}

impl PeeringConnection {
    /// Network logical ids sorted, so (A, B) and (B, A) compare equal.
    pub fn pair(&self) -> (&str, &str) {
        if self.requester <= self.accepter {
            (&self.requester, &self.accepter)
        } else {
            (&self.accepter, &self.requester)
        }
    }

    pub fn connects(&self, network: &str) -> bool {
        self.requester == network || self.accepter == network
    }

    /// CIDR of the side opposite `network`.
    pub fn peer_cidr_of(&self, network: &str) -> Option<Ipv4> {
        if self.requester == network {
            Some(self.accepter_cidr)
        } else if self.accepter == network {
            Some(self.requester_cidr)
        } else {
            None
        }
    }

    /// Pending -> Active | Failed, Active -> Deleted, Failed -> Deleted.
    pub fn transition(&mut self, to: PeeringState) -> Result<()> {
        use PeeringState::*;
        let allowed = matches!(
            (self.state, to),
            (Pending, Active) | (Pending, Failed) | (Active, Deleted) | (Failed, Deleted)
        );
        if !allowed {
            return Err(TopologyError::InvalidTransition {
                entity: self.logical_id.clone(),
                from: self.state.to_string(),
                to: to.to_string(),
            });
        }
        log::debug!("{} {} -> {}", self.logical_id, self.state, to);
        self.state = to;
        Ok(())
    }
}
