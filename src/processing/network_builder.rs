//! Materializes a network, its subnets and their route tables from an address plan.

use super::address_planner::NetworkPlan;
use crate::error::Result;
use crate::models::{Ipv4, Network, RouteTable, RouteTarget, Subnet, SubnetTier, TierType};
use crate::plan::logical_id;

/// Build the network: one subnet per (tier, zone), each with its own route
/// table holding only the local route.
pub fn build_network(plan: &NetworkPlan) -> Network {
    log::info!("#Start build_network() {} {}", plan.name, plan.cidr);
    let network_id = logical_id(&[plan.name.as_str()]);

    let tiers: Vec<SubnetTier> = plan
        .tiers
        .iter()
        .map(|tier| SubnetTier {
            name: tier.name.clone(),
            tier_type: tier.tier_type,
            subnets: tier
                .blocks
                .iter()
                .enumerate()
                .map(|(i, (zone, cidr))| {
                    let subnet_id = logical_id(&[
                        network_id.as_str(),
                        tier.name.as_str(),
                        format!("Subnet{}", i + 1).as_str(),
                    ]);
                    let route_table_id = logical_id(&[subnet_id.as_str(), "RouteTable"]);
                    Subnet {
                        route_table: RouteTable::new(&route_table_id, &subnet_id, plan.cidr),
                        logical_id: subnet_id,
                        tier: tier.name.clone(),
                        tier_type: tier.tier_type,
                        zone: zone.clone(),
                        cidr: *cidr,
                    }
                })
                .collect(),
        })
        .collect();

    let network = Network {
        name: plan.name.clone(),
        logical_id: network_id,
        cidr: plan.cidr,
        zones: plan.zones.clone(),
        tiers,
        enable_dns_hostnames: true,
        enable_dns_support: true,
        internet_gateway: None,
    };
    log::info!("built {network}");
    network
}

/// Give public tiers their internet gateway and `0.0.0.0/0` default route.
///
/// Isolated tiers are left untouched. Returns the gateway id, `None` when
/// the network has no public tier.
pub fn attach_internet_gateway(network: &mut Network) -> Result<Option<String>> {
    if !network.has_public_tier() {
        log::debug!("{}: no public tier, no internet gateway", network.logical_id);
        return Ok(None);
    }
    let igw = logical_id(&[network.logical_id.as_str(), "InternetGateway"]);
    for subnet in network
        .subnets_mut()
        .filter(|s| s.tier_type == TierType::Public)
    {
        subnet
            .route_table
            .add_route(Ipv4::any(), RouteTarget::InternetGateway(igw.clone()))?;
    }
    network.internet_gateway = Some(igw.clone());
    Ok(Some(igw))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TierSpec;
    use crate::models::AvailabilityZone;
    use crate::processing::address_planner::plan_network;

    fn provider() -> Network {
        let tiers = vec![
            TierSpec {
                name: "Public".to_string(),
                tier_type: TierType::Public,
                cidr_mask: 28,
            },
            TierSpec {
                name: "Isolated".to_string(),
                tier_type: TierType::Isolated,
                cidr_mask: 28,
            },
        ];
        let plan = plan_network(
            "Provider VPC",
            Ipv4::new("10.10.0.0/24").unwrap(),
            &tiers,
            &AvailabilityZone::for_region("us-east-1", 2),
        )
        .unwrap();
        build_network(&plan)
    }

    #[test]
    fn test_one_subnet_per_tier_and_zone() {
        let vpc = provider();
        assert_eq!(vpc.logical_id, "ProviderVPC");
        assert_eq!(vpc.subnets().count(), 4);
        let ids: Vec<&str> = vpc.subnets().map(|s| s.logical_id.as_str()).collect();
        assert_eq!(
            ids,
            vec![
                "ProviderVPCPublicSubnet1",
                "ProviderVPCPublicSubnet2",
                "ProviderVPCIsolatedSubnet1",
                "ProviderVPCIsolatedSubnet2",
            ]
        );
        assert!(vpc.enable_dns_hostnames && vpc.enable_dns_support);
    }

    #[test]
    fn test_every_route_table_starts_with_local_route() {
        let vpc = provider();
        for subnet in vpc.subnets() {
            assert_eq!(subnet.route_table.subnet, subnet.logical_id);
            assert_eq!(subnet.route_table.routes.len(), 1);
            assert_eq!(subnet.route_table.routes[0].destination, vpc.cidr);
            assert_eq!(subnet.route_table.routes[0].target, RouteTarget::Local);
        }
    }

    #[test]
    fn test_internet_gateway_only_on_public_tier() {
        let mut vpc = provider();
        let igw = attach_internet_gateway(&mut vpc).unwrap();
        assert_eq!(igw.as_deref(), Some("ProviderVPCInternetGateway"));
        for subnet in vpc.subnets_of(TierType::Public) {
            assert!(subnet.route_table.route_to(Ipv4::any()).is_some());
        }
        for subnet in vpc.subnets_of(TierType::Isolated) {
            assert_eq!(subnet.route_table.routes.len(), 1);
        }
    }

    #[test]
    fn test_isolated_only_network_has_no_gateway() {
        let mut vpc = provider();
        vpc.tiers.retain(|t| t.tier_type == TierType::Isolated);
        assert_eq!(attach_internet_gateway(&mut vpc).unwrap(), None);
        assert_eq!(vpc.internet_gateway, None);
    }
}
