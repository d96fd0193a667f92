//! Resource-creation operations consumed by a provider-API reconciler.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ResourceKind {
    Network,
    InternetGateway,
    Subnet,
    RouteTable,
    Route,
    PeeringConnection,
    SecurityGroup,
    NetworkAcl,
    Role,
    LogSink,
    Instance,
    LoadBalancer,
    EndpointService,
    InterfaceEndpoint,
    FlowLog,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

/// One node of the build graph: what to create, after what, with which attributes.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    pub logical_id: String,
    pub kind: ResourceKind,
    /// Logical ids that must exist before this one.
    pub depends_on: Vec<String>,
    pub attributes: serde_json::Value,
}

impl Operation {
    /// Build an operation whose attributes are the serialised entity.
    pub fn from_entity<T: Serialize>(
        kind: ResourceKind,
        logical_id: &str,
        depends_on: Vec<String>,
        entity: &T,
    ) -> Result<Operation> {
        Ok(Operation {
            logical_id: logical_id.to_string(),
            kind,
            depends_on,
            attributes: serde_json::to_value(entity)?,
        })
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.logical_id, self.kind)
    }
}
