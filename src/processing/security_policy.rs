//! Security groups and isolated-tier ACLs for one service port.

use crate::error::Result;
use crate::models::{
    AclAction, AclRule, Direction, Ipv4, Network, NetworkAcl, PortRange, Protocol, SecurityGroup,
    SecurityGroupRule, ServicePort, TierType,
};
use crate::plan::logical_id;
use std::net::Ipv4Addr;

/// Number given to both isolated-tier ACL rules.
pub const ACL_RULE_NUMBER: u16 = 100;

/// Everything the composer produced for a network pair.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SecurityPolicy {
    pub security_groups: Vec<SecurityGroup>,
    pub acls: Vec<NetworkAcl>,
}

impl SecurityPolicy {
    pub fn security_group_of(&self, network: &str) -> Option<&SecurityGroup> {
        self.security_groups.iter().find(|sg| sg.network == network)
    }

    pub fn acls_of<'a>(&'a self, network: &'a str) -> impl Iterator<Item = &'a NetworkAcl> {
        self.acls.iter().filter(move |acl| acl.network == network)
    }
}

/// One group per network: ingress on `port` from both primary blocks, any egress.
pub fn compose_security_groups(a: &Network, b: &Network, port: ServicePort) -> Vec<SecurityGroup> {
    log::info!(
        "#Start compose_security_groups() {} {} tcp/{port}",
        a.logical_id,
        b.logical_id
    );
    [a, b]
        .iter()
        .map(|network| {
            let mut sg = SecurityGroup::new(
                &logical_id(&[network.logical_id.as_str(), "ServiceSecurityGroup"]),
                &network.logical_id,
                &format!("Service traffic on tcp/{port} for {}", network.name),
            );
            for source in [a, b] {
                sg.add_rule(
                    Direction::Ingress,
                    SecurityGroupRule {
                        cidr: source.cidr,
                        protocol: Protocol::Tcp,
                        ports: PortRange::single(port.get()),
                        description: format!("tcp/{port} from {}", source.name),
                    },
                );
            }
            sg.allow_all_outbound();
            log::debug!("{}: {} ingress rules", sg.logical_id, sg.ingress.len());
            sg
        })
        .collect()
}

/// One ACL per isolated tier of `network`.
///
/// Each holds two rules numbered [`ACL_RULE_NUMBER`]: ingress from `exposing`
/// only, and egress to anywhere. Everything else hits the implicit deny.
pub fn compose_isolated_acls(network: &Network, exposing: Ipv4Addr) -> Result<Vec<NetworkAcl>> {
    log::info!(
        "#Start compose_isolated_acls() {} ingress from {exposing}",
        network.logical_id
    );
    let mut acls = Vec::new();
    for tier in network
        .tiers
        .iter()
        .filter(|t| t.tier_type == TierType::Isolated)
    {
        let mut acl = NetworkAcl::new(
            &logical_id(&[network.logical_id.as_str(), tier.name.as_str(), "NetworkAcl"]),
            &network.logical_id,
            &tier.name,
            tier.subnets.iter().map(|s| s.logical_id.clone()).collect(),
        );
        acl.add_rule(AclRule {
            name: "AllowTargetIngress".to_string(),
            number: ACL_RULE_NUMBER,
            direction: Direction::Ingress,
            cidr: Ipv4::host(exposing),
            protocol: Protocol::All,
            ports: PortRange::all(),
            action: AclAction::Allow,
        })?;
        acl.add_rule(AclRule {
            name: "AllowAllEgress".to_string(),
            number: ACL_RULE_NUMBER,
            direction: Direction::Egress,
            cidr: Ipv4::any(),
            protocol: Protocol::All,
            ports: PortRange::all(),
            action: AclAction::Allow,
        })?;
        log::debug!("{}: {} subnets", acl.logical_id, acl.subnets.len());
        acls.push(acl);
    }
    Ok(acls)
}
