//! Virtual network data model.

use super::{Ipv4, RouteTable};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Whether a tier gets a default route to the internet.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TierType {
    Public,
    Isolated,
}

impl fmt::Display for TierType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TierType::Public => write!(f, "Public"),
            TierType::Isolated => write!(f, "Isolated"),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AvailabilityZone(pub String);

impl AvailabilityZone {
    /// First `count` zones of a region, named `<region>a`, `<region>b`, ...
    pub fn for_region(region: &str, count: u8) -> Vec<AvailabilityZone> {
        (b'a'..=b'z')
            .take(count as usize)
            .map(|letter| AvailabilityZone(format!("{region}{}", letter as char)))
            .collect()
    }
}

impl fmt::Display for AvailabilityZone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One subnet instance: a (tier, zone) pair with its own route table.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Subnet {
    pub logical_id: String,
    pub tier: String,
    pub tier_type: TierType,
    pub zone: AvailabilityZone,
    pub cidr: Ipv4,
    pub route_table: RouteTable,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SubnetTier {
    pub name: String,
    pub tier_type: TierType,
    /// One subnet per zone, in zone order.
    pub subnets: Vec<Subnet>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Network {
    pub name: String,
    pub logical_id: String,
    pub cidr: Ipv4,
    pub zones: Vec<AvailabilityZone>,
    pub tiers: Vec<SubnetTier>,
    pub enable_dns_hostnames: bool,
    pub enable_dns_support: bool,
    /// Logical id of the internet gateway, present only with a public tier.
    pub internet_gateway: Option<String>,
}

impl Network {
    pub fn subnets(&self) -> impl Iterator<Item = &Subnet> {
        self.tiers.iter().flat_map(|t| t.subnets.iter())
    }

    pub fn subnets_mut(&mut self) -> impl Iterator<Item = &mut Subnet> {
        self.tiers.iter_mut().flat_map(|t| t.subnets.iter_mut())
    }

    pub fn subnets_of(&self, tier_type: TierType) -> impl Iterator<Item = &Subnet> {
        self.tiers
            .iter()
            .filter(move |t| t.tier_type == tier_type)
            .flat_map(|t| t.subnets.iter())
    }

    pub fn route_tables(&self) -> impl Iterator<Item = &RouteTable> {
        self.subnets().map(|s| &s.route_table)
    }

    pub fn has_public_tier(&self) -> bool {
        self.tiers.iter().any(|t| t.tier_type == TierType::Public)
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{}] ({} tiers, {} subnets, {} zones)",
            self.name,
            self.cidr,
            self.tiers.len(),
            self.subnets().count(),
            self.zones.len()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zones_for_region() {
        let zones = AvailabilityZone::for_region("us-east-1", 3);
        assert_eq!(
            zones,
            vec![
                AvailabilityZone("us-east-1a".to_string()),
                AvailabilityZone("us-east-1b".to_string()),
                AvailabilityZone("us-east-1c".to_string()),
            ]
        );
        assert_eq!(AvailabilityZone::for_region("eu-west-2", 30).len(), 26);
    }
}
