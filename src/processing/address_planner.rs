//! CIDR allocation for networks and their subnet tiers.
//!
//! Pure function of its inputs: either every (tier, zone) block fits or no
//! plan is returned at all.

use crate::config::{NetworkSpec, TierSpec};
use crate::error::{Result, TopologyError};
use crate::models::{align_up, AvailabilityZone, Ipv4, TierType};
use itertools::Itertools;

/// Blocks for one tier, one per zone in zone order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TierPlan {
    pub name: String,
    pub tier_type: TierType,
    pub blocks: Vec<(AvailabilityZone, Ipv4)>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkPlan {
    pub name: String,
    pub cidr: Ipv4,
    pub zones: Vec<AvailabilityZone>,
    pub tiers: Vec<TierPlan>,
}

impl NetworkPlan {
    pub fn blocks(&self) -> impl Iterator<Item = &Ipv4> {
        self.tiers.iter().flat_map(|t| t.blocks.iter().map(|(_, b)| b))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressPlan {
    pub networks: Vec<NetworkPlan>,
}

impl AddressPlan {
    pub fn network(&self, name: &str) -> Option<&NetworkPlan> {
        self.networks.iter().find(|n| n.name == name)
    }
}

/// Plan every network; network blocks must be canonical and pairwise disjoint.
pub fn plan_addresses(networks: &[NetworkSpec], zones: &[AvailabilityZone]) -> Result<AddressPlan> {
    log::info!(
        "#Start plan_addresses() {} networks x {} zones",
        networks.len(),
        zones.len()
    );

    for network in networks {
        if !network.cidr.is_canonical() {
            return Err(TopologyError::InvalidCidr(format!(
                "{} block {} is not a network address (did you mean {}/{}?)",
                network.name,
                network.cidr,
                network.cidr.lo(),
                network.cidr.mask
            )));
        }
    }

    if let Some((a, b)) = networks
        .iter()
        .tuple_combinations()
        .find(|(a, b)| a.cidr.overlaps(&b.cidr))
    {
        return Err(TopologyError::NetworkOverlap(
            format!("{} ({})", a.name, a.cidr),
            format!("{} ({})", b.name, b.cidr),
        ));
    }

    let planned = networks
        .iter()
        .map(|n| plan_network(&n.name, n.cidr, &n.tiers, zones))
        .collect::<Result<Vec<_>>>()?;

    Ok(AddressPlan { networks: planned })
}

/// Carve `cidr` tier by tier, zone by zone, each block aligned to its own mask.
pub fn plan_network(
    name: &str,
    cidr: Ipv4,
    tiers: &[TierSpec],
    zones: &[AvailabilityZone],
) -> Result<NetworkPlan> {
    let exhausted = |reason: String| TopologyError::AddressExhaustion {
        network: name.to_string(),
        cidr,
        reason,
    };

    for tier in tiers {
        // a subnet must be a strict subset of its network
        if tier.cidr_mask <= cidr.mask || tier.cidr_mask > 32 {
            return Err(exhausted(format!(
                "tier {} mask /{} does not fit strictly inside /{}",
                tier.name, tier.cidr_mask, cidr.mask
            )));
        }
    }

    let requested: u64 = tiers
        .iter()
        .map(|t| (1u64 << (32 - t.cidr_mask)) * zones.len() as u64)
        .sum();
    if requested > cidr.size() {
        return Err(exhausted(format!(
            "{} tiers x {} zones need {requested} addresses, block has {}",
            tiers.len(),
            zones.len(),
            cidr.size()
        )));
    }

    let mut next_ip = Some(cidr.lo());
    let mut planned = Vec::with_capacity(tiers.len());
    for tier in tiers {
        let mut blocks = Vec::with_capacity(zones.len());
        for zone in zones {
            let start = match next_ip {
                Some(ip) => align_up(ip, tier.cidr_mask)?,
                None => None,
            };
            let block = start
                .map(|addr| Ipv4 {
                    addr,
                    mask: tier.cidr_mask,
                })
                .filter(|block| cidr.contains_block(block))
                .ok_or_else(|| {
                    exhausted(format!(
                        "no room left for tier {} in zone {zone}",
                        tier.name
                    ))
                })?;
            log::debug!("{name}: {} {zone} -> {block}", tier.name);
            next_ip = crate::models::ip_after_subnet(block.addr, block.mask)?;
            blocks.push((zone.clone(), block));
        }
        planned.push(TierPlan {
            name: tier.name.clone(),
            tier_type: tier.tier_type,
            blocks,
        });
    }

    log::info!(
        "{name} {cidr}: {} subnets planned",
        planned.iter().map(|t| t.blocks.len()).sum::<usize>()
    );
    Ok(NetworkPlan {
        name: name.to_string(),
        cidr,
        zones: zones.to_vec(),
        tiers: planned,
    })
}
