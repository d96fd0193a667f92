//! Role issuance for instances and flow-log delivery.

use super::CollaboratorError;
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyEffect {
    Allow,
    Deny,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PolicyStatement {
    pub effect: PolicyEffect,
    pub actions: Vec<String>,
    pub resources: Vec<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RoleRequest {
    pub logical_id: String,
    /// Service principal allowed to assume the role.
    pub assumed_by: String,
    pub managed_policies: Vec<String>,
    pub inline_statements: Vec<PolicyStatement>,
}

impl RoleRequest {
    /// Instance role able to register with the session manager.
    pub fn instance_role() -> RoleRequest {
        RoleRequest {
            logical_id: "SsmIamRole".to_string(),
            assumed_by: "ec2.amazonaws.com".to_string(),
            managed_policies: vec!["AmazonSSMManagedInstanceCore".to_string()],
            inline_statements: vec![],
        }
    }

    /// Delivery role for flow logs writing to `sink_arn`.
    pub fn flow_log_role(sink_arn: &str) -> RoleRequest {
        let logical_id = "FlowLogsIamRole".to_string();
        RoleRequest {
            inline_statements: vec![
                PolicyStatement {
                    effect: PolicyEffect::Allow,
                    actions: vec!["iam:PassRole".to_string()],
                    resources: vec![crate::plan::attribute_ref(&logical_id, "Arn")],
                },
                PolicyStatement {
                    effect: PolicyEffect::Allow,
                    actions: vec![
                        "logs:CreateLogStream".to_string(),
                        "logs:PutLogEvents".to_string(),
                        "logs:DescribeLogStreams".to_string(),
                    ],
                    resources: vec![sink_arn.to_string()],
                },
            ],
            logical_id,
            assumed_by: "vpc-flow-logs.amazonaws.com".to_string(),
            managed_policies: vec![],
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Role {
    pub logical_id: String,
    pub arn: String,
    pub request: RoleRequest,
}

pub trait RoleIssuer {
    fn issue(&mut self, request: &RoleRequest) -> Result<Role, CollaboratorError>;
}

#[derive(Debug, Default)]
pub struct DeclarativeRoleIssuer;

impl RoleIssuer for DeclarativeRoleIssuer {
    fn issue(&mut self, request: &RoleRequest) -> Result<Role, CollaboratorError> {
        if !request.assumed_by.ends_with(".amazonaws.com") {
            return Err(CollaboratorError::Rejected {
                collaborator: "identity".to_string(),
                request: request.logical_id.clone(),
                reason: format!("unknown service principal {}", request.assumed_by),
            });
        }
        Ok(Role {
            logical_id: request.logical_id.clone(),
            arn: crate::plan::attribute_ref(&request.logical_id, "Arn"),
            request: request.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flow_log_role_can_pass_itself() {
        let role = DeclarativeRoleIssuer
            .issue(&RoleRequest::flow_log_role("${FlowLogsLogGroup.Arn}"))
            .unwrap();
        let pass = &role.request.inline_statements[0];
        assert_eq!(pass.actions, vec!["iam:PassRole".to_string()]);
        assert_eq!(pass.resources, vec![role.arn.clone()]);
        assert_eq!(
            role.request.inline_statements[1].resources,
            vec!["${FlowLogsLogGroup.Arn}".to_string()]
        );
    }

    #[test]
    fn test_unknown_principal_rejected() {
        let mut request = RoleRequest::instance_role();
        request.assumed_by = "example.com".to_string();
        assert!(DeclarativeRoleIssuer.issue(&request).is_err());
    }
}
