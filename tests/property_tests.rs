//! Property-based tests for address planning, peering and security policy.
//!
//! Each property must hold for every generated input, not only the
//! default provider/consumer pair.

use proptest::prelude::*;
use vpc_service_topology::{
    config::{TierSpec, TopologyConfig},
    error::TopologyError,
    external::Collaborators,
    models::{AvailabilityZone, Ipv4, PortRange, Protocol, TierType},
    processing::{build_network, peer_networks, plan_network},
    synthesize,
};

fn config() -> TopologyConfig {
    TopologyConfig {
        account: Some("111122223333".to_string()),
        region: Some("us-east-1".to_string()),
        ..Default::default()
    }
}

fn tiers(masks: &[u8]) -> Vec<TierSpec> {
    masks
        .iter()
        .enumerate()
        .map(|(i, mask)| TierSpec {
            name: format!("Tier{i}"),
            tier_type: if i == 0 {
                TierType::Public
            } else {
                TierType::Isolated
            },
            cidr_mask: *mask,
        })
        .collect()
}

proptest! {
    /// Planned subnets are inside the network, aligned and pairwise disjoint;
    /// the only failure is AddressExhaustion.
    #[test]
    fn prop_subnets_fit_or_exhaust(
        octet in 0u8..=255,
        net_mask in 16u8..=26,
        offsets in prop::collection::vec(0u8..=6, 1..4),
        az_count in 1u8..=4,
    ) {
        let cidr = Ipv4::new(&format!("10.{octet}.0.0/{net_mask}")).unwrap();
        let masks: Vec<u8> = offsets.iter().map(|o| (net_mask + o).min(32)).collect();
        let zones = AvailabilityZone::for_region("us-east-1", az_count);

        match plan_network("Net", cidr, &tiers(&masks), &zones) {
            Ok(plan) => {
                let blocks: Vec<Ipv4> = plan.blocks().copied().collect();
                prop_assert_eq!(blocks.len(), masks.len() * zones.len());
                for (i, a) in blocks.iter().enumerate() {
                    prop_assert!(cidr.contains_block(a));
                    prop_assert!(a.mask > net_mask, "{} is not strictly inside {}", a, cidr);
                    prop_assert!(a.is_canonical());
                    for b in &blocks[i + 1..] {
                        prop_assert!(!a.overlaps(b), "{} overlaps {}", a, b);
                    }
                }
            }
            Err(e) => prop_assert!(
                matches!(e, TopologyError::AddressExhaustion { .. }),
                "unexpected error {:?}",
                e
            ),
        }
    }

    /// With one mask for every tier there are no alignment gaps, so anything
    /// that fits by size is planned.
    #[test]
    fn prop_uniform_masks_fit_by_size(
        net_mask in 16u8..=24,
        offset in 1u8..=6,
        tier_count in 1usize..4,
        az_count in 1u8..=4,
    ) {
        let cidr = Ipv4::new(&format!("10.10.0.0/{net_mask}")).unwrap();
        let mask = net_mask + offset;
        let zones = AvailabilityZone::for_region("us-east-1", az_count);
        let needed = (1u64 << (32 - mask)) * tier_count as u64 * az_count as u64;

        let result = plan_network("Net", cidr, &tiers(&vec![mask; tier_count]), &zones);
        prop_assert_eq!(result.is_ok(), needed <= cidr.size());
    }

    /// Every route table on each side gets exactly one route to the peer, and
    /// peering again is rejected.
    #[test]
    fn prop_peering_routes_every_table_once(
        az_a in 1u8..=4,
        az_b in 1u8..=4,
        mask in 27u8..=28,
    ) {
        let build = |name: &str, cidr: &str, az: u8| {
            let plan = plan_network(
                name,
                Ipv4::new(cidr).unwrap(),
                &tiers(&[mask, mask]),
                &AvailabilityZone::for_region("us-east-1", az),
            )
            .unwrap();
            build_network(&plan)
        };
        let mut a = build("A", "10.10.0.0/24", az_a);
        let mut b = build("B", "10.11.0.0/24", az_b);

        let outcome = peer_networks(&mut a, &mut b).unwrap();
        prop_assert_eq!(outcome.routes.len(), 2 * (az_a as usize + az_b as usize));
        for (network, peer) in [(&a, b.cidr), (&b, a.cidr)] {
            for rt in network.route_tables() {
                let count = rt.routes.iter().filter(|r| r.destination == peer).count();
                prop_assert_eq!(count, 1);
            }
        }

        let before = (a.clone(), b.clone());
        let rerun = peer_networks(&mut b, &mut a);
        prop_assert!(
            matches!(rerun, Err(TopologyError::RouteConflict { .. })),
            "expected RouteConflict"
        );
        prop_assert_eq!((a, b), before);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    /// Both security groups admit exactly tcp/P from exactly the two network blocks.
    #[test]
    fn prop_security_groups_admit_only_service_port(port in 1u32..=65535) {
        let cfg = TopologyConfig { service_port: port, ..config() };
        let s = synthesize(&cfg, &mut Collaborators::declarative()).unwrap();
        let expected = vec![
            (s.topology.provider.cidr, Protocol::Tcp, PortRange::single(port as u16)),
            (s.topology.consumer.cidr, Protocol::Tcp, PortRange::single(port as u16)),
        ];
        for sg in &s.topology.policy.security_groups {
            let ingress: Vec<_> = sg.ingress.iter().map(|r| (r.cidr, r.protocol, r.ports)).collect();
            prop_assert_eq!(&ingress, &expected);
        }
    }

    #[test]
    fn prop_out_of_range_port_fails_first(port in prop_oneof![Just(0u32), 65536u32..=u32::MAX]) {
        let cfg = TopologyConfig { service_port: port, az_count: 0, ..config() };
        let err = synthesize(&cfg, &mut Collaborators::declarative()).unwrap_err();
        prop_assert_eq!(err, TopologyError::InvalidPort(port));
    }

    /// Dependencies always come first, so teardown (the reverse) removes
    /// dependents first.
    #[test]
    fn prop_plan_orders_dependencies_first(az_count in 1u8..=4) {
        let cfg = TopologyConfig { az_count, ..config() };
        let s = synthesize(&cfg, &mut Collaborators::declarative()).unwrap();
        for (at, op) in s.plan.creation_order().enumerate() {
            for dep in &op.depends_on {
                let dep_at = s.plan.position(dep).unwrap();
                prop_assert!(dep_at < at, "{} must precede {}", dep, op.logical_id);
            }
        }
        let acl_count = s.topology.policy.acls.iter().map(|a| a.rules.len()).sum::<usize>();
        prop_assert_eq!(acl_count, 2);
    }
}
