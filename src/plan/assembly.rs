//! Dependency edges between the entities of a synthesized topology.

use super::{BuildGraph, Operation, Plan, ResourceKind};
use crate::error::Result;
use crate::models::{Network, RouteTarget, Warning};
use crate::Topology;
use serde::Serialize;
use serde_json::json;

fn push<T: Serialize>(
    graph: &mut BuildGraph,
    kind: ResourceKind,
    logical_id: &str,
    depends_on: Vec<String>,
    entity: &T,
) -> Result<()> {
    graph.add(Operation::from_entity(kind, logical_id, depends_on, entity)?)
}

/// Network, its subnets, their route tables, gateway and default routes.
fn push_network(graph: &mut BuildGraph, network: &Network) -> Result<()> {
    push(
        graph,
        ResourceKind::Network,
        &network.logical_id,
        vec![],
        &json!({
            "name": network.name,
            "cidr": network.cidr,
            "zones": network.zones,
            "enableDnsHostnames": network.enable_dns_hostnames,
            "enableDnsSupport": network.enable_dns_support,
            "natGateways": 0,
        }),
    )?;
    if let Some(igw) = &network.internet_gateway {
        push(
            graph,
            ResourceKind::InternetGateway,
            igw,
            vec![network.logical_id.clone()],
            &json!({ "network": network.logical_id }),
        )?;
    }

    for subnet in network.subnets() {
        push(
            graph,
            ResourceKind::Subnet,
            &subnet.logical_id,
            vec![network.logical_id.clone()],
            &json!({
                "network": network.logical_id,
                "tier": subnet.tier,
                "tierType": subnet.tier_type,
                "zone": subnet.zone,
                "cidr": subnet.cidr,
            }),
        )?;
        let rt = &subnet.route_table;
        push(
            graph,
            ResourceKind::RouteTable,
            &rt.logical_id,
            vec![subnet.logical_id.clone()],
            &json!({ "subnet": rt.subnet, "localRoute": rt.local_cidr() }),
        )?;
        for route in &rt.routes {
            if let RouteTarget::InternetGateway(igw) = &route.target {
                push(
                    graph,
                    ResourceKind::Route,
                    &format!("{}DefaultRoute", rt.logical_id),
                    vec![rt.logical_id.clone(), igw.clone()],
                    &json!({ "routeTable": rt.logical_id, "route": route }),
                )?;
            }
        }
    }
    Ok(())
}

/// Build and sort the graph for `topology`.
///
/// Insertion order is creation order wherever the edges leave a choice.
pub fn assemble_plan(topology: &Topology, warnings: Vec<Warning>) -> Result<Plan> {
    log::info!("#Start assemble_plan()");
    let mut graph = BuildGraph::new();
    let networks = [&topology.provider, &topology.consumer];

    for network in networks {
        push_network(&mut graph, network)?;
    }

    let pcx = &topology.peering;
    push(
        &mut graph,
        ResourceKind::PeeringConnection,
        &pcx.logical_id,
        vec![pcx.requester.clone(), pcx.accepter.clone()],
        pcx,
    )?;
    for route in &topology.peering_routes {
        push(
            &mut graph,
            ResourceKind::Route,
            &route.logical_id,
            vec![route.route_table.clone(), route.peering.clone()],
            route,
        )?;
    }

    for sg in &topology.policy.security_groups {
        push(
            &mut graph,
            ResourceKind::SecurityGroup,
            &sg.logical_id,
            vec![sg.network.clone()],
            sg,
        )?;
    }

    let role = &topology.instance_role;
    push(&mut graph, ResourceKind::Role, &role.logical_id, vec![], role)?;

    for instance in std::iter::once(&topology.target).chain(&topology.clients) {
        let request = &instance.request;
        let mut deps = vec![request.subnet.clone()];
        deps.extend(request.security_groups.iter().cloned());
        deps.push(request.role.clone());
        push(
            &mut graph,
            ResourceKind::Instance,
            &instance.logical_id,
            deps,
            instance,
        )?;
    }

    for acl in &topology.policy.acls {
        let mut deps = vec![acl.network.clone()];
        deps.extend(acl.subnets.iter().cloned());
        // the ingress rule is pinned to the target's address
        deps.push(topology.target.logical_id.clone());
        push(&mut graph, ResourceKind::NetworkAcl, &acl.logical_id, deps, acl)?;
    }

    let exposure = &topology.exposure;
    let lb = &exposure.load_balancer;
    let mut deps = lb.subnets.clone();
    deps.push(topology.target.logical_id.clone());
    deps.extend(
        topology
            .policy
            .acls_of(&lb.network)
            .map(|acl| acl.logical_id.clone()),
    );
    push(&mut graph, ResourceKind::LoadBalancer, &lb.logical_id, deps, lb)?;

    let service = &exposure.endpoint_service;
    push(
        &mut graph,
        ResourceKind::EndpointService,
        &service.logical_id,
        vec![service.load_balancer.clone()],
        service,
    )?;
    for endpoint in &exposure.endpoints {
        let mut deps = vec![endpoint.service.clone()];
        deps.extend(endpoint.subnets.iter().cloned());
        deps.extend(endpoint.security_groups.iter().cloned());
        push(
            &mut graph,
            ResourceKind::InterfaceEndpoint,
            &endpoint.logical_id,
            deps,
            endpoint,
        )?;
    }

    let observability = &topology.observability;
    if let Some(sink) = &observability.log_sink {
        push(&mut graph, ResourceKind::LogSink, &sink.logical_id, vec![], sink)?;
    }
    if let (Some(sink), Some(role)) = (&observability.log_sink, &observability.role) {
        push(
            &mut graph,
            ResourceKind::Role,
            &role.logical_id,
            vec![sink.logical_id.clone()],
            role,
        )?;
    }
    for flow_log in &observability.flow_logs {
        let mut deps = vec![flow_log.network.clone()];
        deps.extend(observability.log_sink.iter().map(|s| s.logical_id.clone()));
        deps.extend(observability.role.iter().map(|r| r.logical_id.clone()));
        push(
            &mut graph,
            ResourceKind::FlowLog,
            &flow_log.logical_id,
            deps,
            flow_log,
        )?;
    }

    log::info!("{} operations in build graph", graph.len());
    Plan::from_graph(graph, warnings)
}
