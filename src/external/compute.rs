//! Compute-instance provisioning.

use super::CollaboratorError;
use crate::models::{Ipv4, RESERVED_LEADING_HOSTS};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::net::Ipv4Addr;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct InstanceRequest {
    pub logical_id: String,
    pub network: String,
    pub subnet: String,
    pub subnet_cidr: Ipv4,
    pub security_groups: Vec<String>,
    pub role: String,
    pub instance_type: String,
    pub bootstrap_script: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct InstanceHandle {
    pub logical_id: String,
    pub private_ip: Ipv4Addr,
    pub request: InstanceRequest,
}

pub trait InstanceProvisioner {
    fn provision(&mut self, request: &InstanceRequest) -> Result<InstanceHandle, CollaboratorError>;
}

/// Hands out addresses in request order, starting after the reserved hosts.
#[derive(Debug, Default)]
pub struct DeclarativeCompute {
    next_offset: HashMap<String, u32>,
}

impl InstanceProvisioner for DeclarativeCompute {
    fn provision(&mut self, request: &InstanceRequest) -> Result<InstanceHandle, CollaboratorError> {
        let offset = self
            .next_offset
            .entry(request.subnet.clone())
            .or_insert(RESERVED_LEADING_HOSTS);
        // the broadcast address is never assignable
        let private_ip = request
            .subnet_cidr
            .nth(*offset)
            .filter(|ip| *ip != request.subnet_cidr.hi())
            .ok_or_else(|| CollaboratorError::Rejected {
                collaborator: "compute".to_string(),
                request: request.logical_id.clone(),
                reason: format!("subnet {} has no free address", request.subnet_cidr),
            })?;
        *offset += 1;
        log::debug!(
            "instance {} -> {} in {}",
            request.logical_id,
            private_ip,
            request.subnet
        );
        Ok(InstanceHandle {
            logical_id: request.logical_id.clone(),
            private_ip,
            request: request.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(id: &str, cidr: &str) -> InstanceRequest {
        InstanceRequest {
            logical_id: id.to_string(),
            network: "ProviderVPC".to_string(),
            subnet: "ProviderVPCPublicSubnet1".to_string(),
            subnet_cidr: Ipv4::new(cidr).unwrap(),
            security_groups: vec![],
            role: "InstanceRole".to_string(),
            instance_type: "t3.micro".to_string(),
            bootstrap_script: None,
        }
    }

    #[test]
    fn test_addresses_follow_reserved_hosts() {
        let mut compute = DeclarativeCompute::default();
        let a = compute.provision(&request("A", "10.10.0.0/28")).unwrap();
        let b = compute.provision(&request("B", "10.10.0.0/28")).unwrap();
        assert_eq!(a.private_ip, Ipv4Addr::new(10, 10, 0, 4));
        assert_eq!(b.private_ip, Ipv4Addr::new(10, 10, 0, 5));
    }

    #[test]
    fn test_full_subnet_rejected() {
        let mut compute = DeclarativeCompute::default();
        // /29: .4, .5, .6 usable, .7 is broadcast
        for id in ["A", "B", "C"] {
            compute.provision(&request(id, "10.10.0.0/29")).unwrap();
        }
        assert!(matches!(
            compute.provision(&request("D", "10.10.0.0/29")),
            Err(CollaboratorError::Rejected { .. })
        ));
    }
}
