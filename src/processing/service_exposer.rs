//! Exposure chain for one service: load balancer, endpoint service, interface endpoints.
//!
//! [`ServiceExposer`] is a small state machine. Each step is only legal from
//! the state before it; anything else is a [`TopologyError::InvalidTransition`].
//!
//! ```text
//! Unbuilt --front--> Fronted --publish--> Serviced --expose--> Exposed
//!                    (register_target)
//! ```

use crate::error::{Result, TopologyError};
use crate::models::{
    EndpointService, ExposureState, InterfaceEndpoint, Listener, LoadBalancer, Network, Protocol,
    SecurityGroup, ServicePort, Target, TargetGroup, TierType,
};
use crate::plan::{attribute_ref, logical_id};

/// The finished chain handed to plan assembly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exposure {
    pub load_balancer: LoadBalancer,
    pub endpoint_service: EndpointService,
    pub endpoints: Vec<InterfaceEndpoint>,
}

#[derive(Debug, Clone)]
pub struct ServiceExposer {
    port: ServicePort,
    state: ExposureState,
    load_balancer: Option<LoadBalancer>,
    endpoint_service: Option<EndpointService>,
    endpoints: Vec<InterfaceEndpoint>,
}

impl ServiceExposer {
    pub fn new(port: ServicePort) -> ServiceExposer {
        ServiceExposer {
            port,
            state: ExposureState::Unbuilt,
            load_balancer: None,
            endpoint_service: None,
            endpoints: Vec::new(),
        }
    }

    pub fn state(&self) -> ExposureState {
        self.state
    }

    pub fn load_balancer(&self) -> Option<&LoadBalancer> {
        self.load_balancer.as_ref()
    }

    pub fn endpoint_service(&self) -> Option<&EndpointService> {
        self.endpoint_service.as_ref()
    }

    pub fn endpoints(&self) -> &[InterfaceEndpoint] {
        &self.endpoints
    }

    fn require(&self, expected: ExposureState, to: ExposureState) -> Result<()> {
        if self.state != expected {
            return Err(TopologyError::InvalidTransition {
                entity: "ServiceExposer".to_string(),
                from: self.state.to_string(),
                to: to.to_string(),
            });
        }
        Ok(())
    }

    /// Unbuilt -> Fronted: internal network load balancer across the
    /// provider's isolated subnets, listening on TCP P.
    pub fn front(&mut self, provider: &Network, preserve_client_ip: bool) -> Result<&LoadBalancer> {
        self.require(ExposureState::Unbuilt, ExposureState::Fronted)?;
        let subnets: Vec<String> = provider
            .subnets_of(TierType::Isolated)
            .map(|s| s.logical_id.clone())
            .collect();
        if subnets.is_empty() {
            return Err(TopologyError::InvalidConfig(format!(
                "{} has no isolated subnet for the load balancer",
                provider.logical_id
            )));
        }
        let lb = LoadBalancer {
            logical_id: logical_id(&[provider.logical_id.as_str(), "NetworkLoadBalancer"]),
            network: provider.logical_id.clone(),
            subnets,
            scheme: "internal".to_string(),
            load_balancer_type: "network".to_string(),
            listener: Listener {
                port: self.port,
                protocol: Protocol::Tcp,
            },
            target_group: TargetGroup {
                protocol: Protocol::Tcp,
                port: self.port,
                preserve_client_ip,
                targets: Vec::new(),
            },
        };
        log::info!(
            "{} fronts tcp/{} in {} subnets",
            lb.logical_id,
            self.port,
            lb.subnets.len()
        );
        self.state = ExposureState::Fronted;
        Ok(self.load_balancer.insert(lb))
    }

    /// Register the single backend. The target must listen on P itself.
    pub fn register_target(&mut self, target: Target) -> Result<()> {
        let port = self.port;
        let lb = match (self.state, self.load_balancer.as_mut()) {
            (ExposureState::Fronted, Some(lb)) => lb,
            _ => {
                return Err(TopologyError::InvalidTransition {
                    entity: "ServiceExposer".to_string(),
                    from: self.state.to_string(),
                    to: "TargetRegistered".to_string(),
                })
            }
        };
        if !lb.target_group.targets.is_empty() {
            return Err(TopologyError::InvalidConfig(format!(
                "{} already has a registered target",
                lb.logical_id
            )));
        }
        if target.port() != port.get() {
            return Err(TopologyError::InvalidConfig(format!(
                "target port {} differs from service port {port}",
                target.port()
            )));
        }
        log::debug!("{} target {:?}", lb.logical_id, target);
        lb.target_group.targets.push(target);
        Ok(())
    }

    /// Fronted -> Serviced: wrap the load balancer in an endpoint service
    /// open to `allowed_principals` without manual acceptance.
    ///
    /// Fails with [`TopologyError::NoTargetRegistered`] and stays `Fronted`
    /// when no target was registered.
    pub fn publish(&mut self, allowed_principals: Vec<String>) -> Result<&EndpointService> {
        self.require(ExposureState::Fronted, ExposureState::Serviced)?;
        let lb = self.load_balancer.as_ref().ok_or_else(|| {
            TopologyError::InvalidTransition {
                entity: "ServiceExposer".to_string(),
                from: self.state.to_string(),
                to: ExposureState::Serviced.to_string(),
            }
        })?;
        if lb.target_group.targets.is_empty() {
            return Err(TopologyError::NoTargetRegistered(lb.logical_id.clone()));
        }
        if allowed_principals.is_empty() {
            return Err(TopologyError::InvalidConfig(
                "endpoint service needs at least one allowed principal".to_string(),
            ));
        }
        let service_id = logical_id(&[lb.network.as_str(), "EndpointService"]);
        let service = EndpointService {
            service_name: attribute_ref(&service_id, "ServiceName"),
            logical_id: service_id,
            load_balancer: lb.logical_id.clone(),
            acceptance_required: false,
            allowed_principals,
        };
        log::info!(
            "{} wraps {} for {:?}",
            service.logical_id,
            service.load_balancer,
            service.allowed_principals
        );
        self.state = ExposureState::Serviced;
        Ok(self.endpoint_service.insert(service))
    }

    /// Serviced -> Exposed: one interface endpoint per network, in that
    /// network's isolated subnets, guarded by the paired security group.
    pub fn expose(&mut self, networks: &[(&Network, &SecurityGroup)]) -> Result<&[InterfaceEndpoint]> {
        self.require(ExposureState::Serviced, ExposureState::Exposed)?;
        let service = self.endpoint_service.as_ref().ok_or_else(|| {
            TopologyError::InvalidTransition {
                entity: "ServiceExposer".to_string(),
                from: self.state.to_string(),
                to: ExposureState::Exposed.to_string(),
            }
        })?;

        let mut endpoints = Vec::with_capacity(networks.len());
        for (network, sg) in networks {
            let subnets: Vec<String> = network
                .subnets_of(TierType::Isolated)
                .map(|s| s.logical_id.clone())
                .collect();
            if subnets.is_empty() {
                return Err(TopologyError::InvalidConfig(format!(
                    "{} has no isolated subnet for the interface endpoint",
                    network.logical_id
                )));
            }
            let endpoint = InterfaceEndpoint {
                logical_id: logical_id(&[network.logical_id.as_str(), "InterfaceEndpoint"]),
                network: network.logical_id.clone(),
                service: service.logical_id.clone(),
                service_name: service.service_name.clone(),
                port: self.port,
                subnets,
                security_groups: vec![sg.logical_id.clone()],
                private_dns_enabled: false,
            };
            log::debug!("{} -> {}", endpoint.logical_id, endpoint.service_name);
            endpoints.push(endpoint);
        }

        log::info!("{} interface endpoints created", endpoints.len());
        self.endpoints = endpoints;
        self.state = ExposureState::Exposed;
        Ok(&self.endpoints)
    }

    /// Hand over the chain; only legal once `Exposed`.
    pub fn finish(self) -> Result<Exposure> {
        match (self.state, self.load_balancer, self.endpoint_service) {
            (ExposureState::Exposed, Some(load_balancer), Some(endpoint_service)) => Ok(Exposure {
                load_balancer,
                endpoint_service,
                endpoints: self.endpoints,
            }),
            (state, _, _) => Err(TopologyError::InvalidTransition {
                entity: "ServiceExposer".to_string(),
                from: state.to_string(),
                to: "Finished".to_string(),
            }),
        }
    }
}
