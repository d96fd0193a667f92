//! The produced plan.
//!
//! This module turns synthesized entities into an ordered operation list:
//! - [`graph`] - Build graph and topological sort
//! - [`operation`] - Operation and resource kinds
//! - [`logical_id`] - Stable identifier naming
//! - [`assembly`] - Dependency edges between topology entities

mod assembly;
mod graph;
mod logical_id;
mod operation;

pub use assembly::assemble_plan;
pub use graph::BuildGraph;
pub use logical_id::{attribute_ref, logical_id};
pub use operation::{Operation, ResourceKind};

use crate::error::Result;
use crate::models::Warning;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Dependency-ordered list of resource-creation operations.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Plan {
    pub generated_at: DateTime<Utc>,
    /// Operations in creation order.
    pub operations: Vec<Operation>,
    pub warnings: Vec<Warning>,
}

impl Plan {
    /// Sort `graph` into a plan; fails on unknown dependencies or cycles.
    pub fn from_graph(graph: BuildGraph, warnings: Vec<Warning>) -> Result<Plan> {
        let operations = graph.sort()?;
        log::debug!("plan sorted: {} operations", operations.len());
        Ok(Plan {
            generated_at: Utc::now(),
            operations,
            warnings,
        })
    }

    pub fn creation_order(&self) -> impl Iterator<Item = &Operation> {
        self.operations.iter()
    }

    /// Exact reverse of creation order: dependents go before what they depend on.
    pub fn teardown_order(&self) -> impl Iterator<Item = &Operation> {
        self.operations.iter().rev()
    }

    /// Undo a partial apply: the applied operations, newest first.
    pub fn rollback<'a>(&'a self, applied: &[&str]) -> Vec<&'a Operation> {
        let applied: HashSet<&str> = applied.iter().copied().collect();
        self.teardown_order()
            .filter(|op| applied.contains(op.logical_id.as_str()))
            .collect()
    }

    pub fn get(&self, logical_id: &str) -> Option<&Operation> {
        self.operations.iter().find(|op| op.logical_id == logical_id)
    }

    pub fn position(&self, logical_id: &str) -> Option<usize> {
        self.operations
            .iter()
            .position(|op| op.logical_id == logical_id)
    }

    pub fn of_kind(&self, kind: ResourceKind) -> impl Iterator<Item = &Operation> {
        self.operations.iter().filter(move |op| op.kind == kind)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plan() -> Plan {
        let mut graph = BuildGraph::new();
        for (id, deps) in [
            ("Vpc", vec![]),
            ("Subnet", vec!["Vpc"]),
            ("RouteTable", vec!["Subnet"]),
        ] {
            graph
                .add(Operation {
                    logical_id: id.to_string(),
                    kind: ResourceKind::Network,
                    depends_on: deps.into_iter().map(String::from).collect(),
                    attributes: serde_json::Value::Null,
                })
                .unwrap();
        }
        Plan::from_graph(graph, vec![]).unwrap()
    }

    #[test]
    fn test_teardown_is_reverse_of_creation() {
        let plan = plan();
        let created: Vec<&str> = plan.creation_order().map(|o| o.logical_id.as_str()).collect();
        let mut torn: Vec<&str> = plan.teardown_order().map(|o| o.logical_id.as_str()).collect();
        torn.reverse();
        assert_eq!(created, torn);
        assert_eq!(plan.position("RouteTable"), Some(2));
    }

    #[test]
    fn test_rollback_only_applied() {
        let plan = plan();
        let undo: Vec<&str> = plan
            .rollback(&["Vpc", "Subnet"])
            .iter()
            .map(|o| o.logical_id.as_str())
            .collect();
        assert_eq!(undo, vec!["Subnet", "Vpc"]);
    }

    #[test]
    fn test_json_round_trip() {
        let plan = plan();
        let json = plan.to_json().unwrap();
        assert!(json.contains("\"generatedAt\""));
        assert!(json.contains("\"dependsOn\""));
        let back: Plan = serde_json::from_str(&json).unwrap();
        assert_eq!(back, plan);
    }
}
