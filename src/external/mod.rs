//! Collaborators consumed as black boxes.
//!
//! This module holds the interfaces of the systems the engine delegates to:
//! - [`compute`] - Instance provisioning
//! - [`logs`] - Log sink provisioning
//! - [`identity`] - Role issuance
//!
//! Each comes with a declarative implementation that only records what it was
//! asked for, which is what [`Collaborators::declarative`] wires up.

pub mod compute;
pub mod identity;
pub mod logs;

pub use compute::{DeclarativeCompute, InstanceHandle, InstanceProvisioner, InstanceRequest};
pub use identity::{
    DeclarativeRoleIssuer, PolicyEffect, PolicyStatement, Role, RoleIssuer, RoleRequest,
};
pub use logs::{DeclarativeLogSinks, LogSink, LogSinkProvisioner, RetentionPolicy};

use thiserror::Error;

/// Failure reported by a collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CollaboratorError {
    #[error("{collaborator} rejected {request}: {reason}")]
    Rejected {
        collaborator: String,
        request: String,
        reason: String,
    },

    #[error("{collaborator} unavailable: {reason}")]
    Unavailable { collaborator: String, reason: String },
}

impl From<CollaboratorError> for crate::error::TopologyError {
    fn from(err: CollaboratorError) -> Self {
        crate::error::TopologyError::Collaborator(err.to_string())
    }
}

/// The three collaborators handed to [`crate::synthesize`].
pub struct Collaborators {
    pub compute: Box<dyn InstanceProvisioner>,
    pub logs: Box<dyn LogSinkProvisioner>,
    pub identity: Box<dyn RoleIssuer>,
}

impl Collaborators {
    pub fn declarative() -> Collaborators {
        Collaborators {
            compute: Box::new(DeclarativeCompute::default()),
            logs: Box::new(DeclarativeLogSinks),
            identity: Box::new(DeclarativeRoleIssuer),
        }
    }
}

impl Default for Collaborators {
    fn default() -> Self {
        Collaborators::declarative()
    }
}
