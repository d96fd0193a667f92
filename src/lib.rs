// cargo watch -x 'fmt' -x 'test'

pub mod config;
pub mod error;
pub mod external;
pub mod models;
pub mod output;
pub mod plan;
pub mod processing;

use config::TopologyConfig;
use error::{Result, TopologyError};
use external::{Collaborators, InstanceHandle, InstanceRequest, Role, RoleRequest};
use models::{
    AvailabilityZone, Network, PeeringConnection, SecurityGroup, Target, TierType, Warning,
};
use plan::{logical_id, Plan};
use processing::{
    attach_internet_gateway, attach_observability, build_network, compose_isolated_acls,
    compose_security_groups, peer_networks, plan_addresses, Exposure, Observability,
    PeeringRoute, SecurityPolicy, ServiceExposer,
};

pub use plan::assemble_plan;

/// Every entity of a synthesized provider/consumer pair.
#[derive(Debug, Clone)]
pub struct Topology {
    pub provider: Network,
    pub consumer: Network,
    pub peering: PeeringConnection,
    pub peering_routes: Vec<PeeringRoute>,
    pub policy: SecurityPolicy,
    pub instance_role: Role,
    /// Backend of the load balancer, in the provider's public tier.
    pub target: InstanceHandle,
    /// One per network, for testing connectivity from inside.
    pub clients: Vec<InstanceHandle>,
    pub exposure: Exposure,
    pub observability: Observability,
}

#[derive(Debug, Clone)]
pub struct Synthesis {
    pub topology: Topology,
    pub plan: Plan,
}

impl Synthesis {
    pub fn warnings(&self) -> &[Warning] {
        &self.plan.warnings
    }
}

fn provision_instance(
    collaborators: &mut Collaborators,
    network: &Network,
    name: &str,
    security_groups: Vec<String>,
    role: &Role,
    config: &TopologyConfig,
    bootstrap_script: Option<String>,
) -> Result<InstanceHandle> {
    let subnet = network
        .subnets_of(TierType::Public)
        .next()
        .or_else(|| network.subnets().next())
        .ok_or_else(|| {
            TopologyError::InvalidConfig(format!(
                "{} has no subnet to place {name} in",
                network.logical_id
            ))
        })?;
    let request = InstanceRequest {
        logical_id: logical_id(&[network.logical_id.as_str(), name]),
        network: network.logical_id.clone(),
        subnet: subnet.logical_id.clone(),
        subnet_cidr: subnet.cidr,
        security_groups,
        role: role.logical_id.clone(),
        instance_type: config.instance_type.clone(),
        bootstrap_script,
    };
    Ok(collaborators.compute.provision(&request)?)
}

fn security_group_of<'a>(policy: &'a SecurityPolicy, network: &Network) -> Result<&'a SecurityGroup> {
    policy
        .security_group_of(&network.logical_id)
        .ok_or_else(|| {
            TopologyError::InvalidConfig(format!("no security group for {}", network.logical_id))
        })
}

/// Synthesize the provider/consumer topology and its creation plan.
///
/// Components run leaf first: addresses, networks, peering, security policy,
/// service exposure, observability. Any error aborts with no plan at all;
/// flow-log problems only add warnings.
pub fn synthesize(config: &TopologyConfig, collaborators: &mut Collaborators) -> Result<Synthesis> {
    log::info!("#Start synthesize()");
    config.validate()?;
    let port = config.service_port()?;
    let principals = config.allowed_principals()?;

    let zones = AvailabilityZone::for_region(config.region(), config.az_count);
    let addresses = plan_addresses(&[config.provider.clone(), config.consumer.clone()], &zones)?;
    let [provider_plan, consumer_plan] = addresses.networks.as_slice() else {
        return Err(TopologyError::InvalidConfig(
            "expected exactly one provider and one consumer network".to_string(),
        ));
    };

    let mut provider = build_network(provider_plan);
    let mut consumer = build_network(consumer_plan);
    attach_internet_gateway(&mut provider)?;
    attach_internet_gateway(&mut consumer)?;

    let peering = peer_networks(&mut consumer, &mut provider)?;

    let instance_role = collaborators.identity.issue(&RoleRequest::instance_role())?;

    let mut policy = SecurityPolicy {
        security_groups: compose_security_groups(&provider, &consumer, port),
        acls: Vec::new(),
    };
    let provider_sg = security_group_of(&policy, &provider)?.logical_id.clone();
    let consumer_sg = security_group_of(&policy, &consumer)?.logical_id.clone();

    let target = provision_instance(
        collaborators,
        &provider,
        "TargetInstance",
        vec![provider_sg.clone()],
        &instance_role,
        config,
        config.bootstrap_script.clone(),
    )?;
    let mut clients = Vec::new();
    for (network, sg) in [(&provider, &provider_sg), (&consumer, &consumer_sg)] {
        clients.push(provision_instance(
            collaborators,
            network,
            "ClientInstance",
            vec![sg.clone()],
            &instance_role,
            config,
            None,
        )?);
    }

    policy.acls = compose_isolated_acls(&provider, target.private_ip)?;

    let mut exposer = ServiceExposer::new(port);
    exposer.front(&provider, config.preserve_client_ip)?;
    exposer.register_target(Target::Instance {
        instance: target.logical_id.clone(),
        port: port.get(),
    })?;
    exposer.publish(principals)?;
    exposer.expose(&[
        (&consumer, security_group_of(&policy, &consumer)?),
        (&provider, security_group_of(&policy, &provider)?),
    ])?;
    let exposure = exposer.finish()?;

    let mut observability = attach_observability(
        &[&provider, &consumer],
        &config.flow_log,
        collaborators.logs.as_mut(),
        collaborators.identity.as_mut(),
    );
    let warnings = std::mem::take(&mut observability.warnings);
    for warning in &warnings {
        log::warn!("{warning}");
    }

    let topology = Topology {
        provider,
        consumer,
        peering: peering.connection,
        peering_routes: peering.routes,
        policy,
        instance_role,
        target,
        clients,
        exposure,
        observability,
    };
    let plan = assemble_plan(&topology, warnings)?;
    log::info!(
        "synthesized {} operations, {} warnings",
        plan.operations.len(),
        plan.warnings.len()
    );
    Ok(Synthesis { topology, plan })
}
