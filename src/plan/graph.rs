//! Directed acyclic build graph with deterministic topological ordering.

use super::Operation;
use crate::error::{Result, TopologyError};
use std::collections::{BTreeSet, HashMap};

/// Operations keyed by logical id, each naming its upstream ids.
#[derive(Debug, Default)]
pub struct BuildGraph {
    nodes: Vec<Operation>,
    index: HashMap<String, usize>,
}

impl BuildGraph {
    pub fn new() -> BuildGraph {
        BuildGraph::default()
    }

    pub fn add(&mut self, operation: Operation) -> Result<()> {
        if self.index.contains_key(&operation.logical_id) {
            return Err(TopologyError::DuplicateLogicalId(operation.logical_id));
        }
        log::trace!(
            "graph += {} after {:?}",
            operation,
            operation.depends_on
        );
        self.index
            .insert(operation.logical_id.clone(), self.nodes.len());
        self.nodes.push(operation);
        Ok(())
    }

    pub fn contains(&self, logical_id: &str) -> bool {
        self.index.contains_key(logical_id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Kahn's algorithm. Among nodes that are ready at the same time the one
    /// added first goes first, so equal graphs always sort identically.
    pub fn sort(self) -> Result<Vec<Operation>> {
        let n = self.nodes.len();
        let mut in_degree = vec![0usize; n];
        let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); n];

        for (i, node) in self.nodes.iter().enumerate() {
            let mut upstream: BTreeSet<usize> = BTreeSet::new();
            for dep in &node.depends_on {
                let j = *self
                    .index
                    .get(dep)
                    .ok_or_else(|| TopologyError::UnknownDependency {
                        resource: node.logical_id.clone(),
                        dependency: dep.clone(),
                    })?;
                upstream.insert(j);
            }
            in_degree[i] = upstream.len();
            for j in upstream {
                dependents[j].push(i);
            }
        }

        let mut ready: BTreeSet<usize> = (0..n).filter(|&i| in_degree[i] == 0).collect();
        let mut order: Vec<usize> = Vec::with_capacity(n);
        while let Some(i) = ready.pop_first() {
            order.push(i);
            for &d in &dependents[i] {
                in_degree[d] -= 1;
                if in_degree[d] == 0 {
                    ready.insert(d);
                }
            }
        }

        if order.len() < n {
            let stuck: Vec<String> = (0..n)
                .filter(|&i| in_degree[i] > 0)
                .map(|i| self.nodes[i].logical_id.clone())
                .collect();
            return Err(TopologyError::DependencyCycle(stuck));
        }

        let mut slots: Vec<Option<Operation>> = self.nodes.into_iter().map(Some).collect();
        Ok(order
            .into_iter()
            .filter_map(|i| slots[i].take())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::ResourceKind;

    fn op(id: &str, deps: &[&str]) -> Operation {
        Operation {
            logical_id: id.to_string(),
            kind: ResourceKind::Network,
            depends_on: deps.iter().map(|d| d.to_string()).collect(),
            attributes: serde_json::Value::Null,
        }
    }

    fn ids(ops: &[Operation]) -> Vec<&str> {
        ops.iter().map(|o| o.logical_id.as_str()).collect()
    }

    #[test]
    fn test_sort_respects_dependencies_added_out_of_order() {
        let mut graph = BuildGraph::new();
        graph.add(op("Route", &["RouteTable", "Peering"])).unwrap();
        graph.add(op("Peering", &["VpcA", "VpcB"])).unwrap();
        graph.add(op("RouteTable", &["Subnet"])).unwrap();
        graph.add(op("Subnet", &["VpcA"])).unwrap();
        graph.add(op("VpcA", &[])).unwrap();
        graph.add(op("VpcB", &[])).unwrap();

        let sorted = graph.sort().unwrap();
        assert_eq!(
            ids(&sorted),
            vec!["VpcA", "Subnet", "RouteTable", "VpcB", "Peering", "Route"]
        );
    }

    #[test]
    fn test_sort_is_deterministic_by_insertion() {
        let build = || {
            let mut graph = BuildGraph::new();
            graph.add(op("B", &[])).unwrap();
            graph.add(op("A", &[])).unwrap();
            graph.add(op("C", &["A", "B"])).unwrap();
            graph.sort().unwrap()
        };
        assert_eq!(ids(&build()), vec!["B", "A", "C"]);
        assert_eq!(build(), build());
    }

    #[test]
    fn test_duplicate_dependency_is_counted_once() {
        let mut graph = BuildGraph::new();
        graph.add(op("A", &[])).unwrap();
        graph.add(op("B", &["A", "A"])).unwrap();
        assert_eq!(ids(&graph.sort().unwrap()), vec!["A", "B"]);
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let mut graph = BuildGraph::new();
        graph.add(op("A", &[])).unwrap();
        assert_eq!(
            graph.add(op("A", &[])),
            Err(TopologyError::DuplicateLogicalId("A".to_string()))
        );
    }

    #[test]
    fn test_unknown_dependency() {
        let mut graph = BuildGraph::new();
        graph.add(op("A", &["Ghost"])).unwrap();
        assert_eq!(
            graph.sort(),
            Err(TopologyError::UnknownDependency {
                resource: "A".to_string(),
                dependency: "Ghost".to_string(),
            })
        );
    }

    #[test]
    fn test_cycle_detected() {
        let mut graph = BuildGraph::new();
        graph.add(op("Root", &[])).unwrap();
        graph.add(op("A", &["B"])).unwrap();
        graph.add(op("B", &["A"])).unwrap();
        assert_eq!(
            graph.sort(),
            Err(TopologyError::DependencyCycle(vec![
                "A".to_string(),
                "B".to_string()
            ]))
        );
    }
}
