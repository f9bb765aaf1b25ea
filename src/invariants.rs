use std::collections::HashSet;

use anyhow::anyhow;
use indexmap::IndexMap;
use indexmap::map::Entry;
use serde::Serialize;

use crate::error::{LibError, Result};
use crate::models::{EdgeData, NodeData};

/// First reason a submitted graph cannot be persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GraphViolation {
    DuplicateNodeNames,
    NonExistentNodeInEdge,
    ContainsCycle,
}

impl GraphViolation {
    pub const fn error_code(&self) -> &'static str {
        match self {
            GraphViolation::DuplicateNodeNames => "graph_duplicate_node_names",
            GraphViolation::NonExistentNodeInEdge => "graph_unknown_node_reference",
            GraphViolation::ContainsCycle => "graph_cycle",
        }
    }

    pub const fn public_message(&self) -> &'static str {
        match self {
            GraphViolation::DuplicateNodeNames => "Duplicate node names",
            GraphViolation::NonExistentNodeInEdge => "Non-existent node in the edge",
            GraphViolation::ContainsCycle => "Graph can't contain cycles",
        }
    }
}

/// Checks names, then edge endpoints, then cycles, stopping at the first failure.
pub fn graph_violation(nodes: &[NodeData], edges: &[EdgeData]) -> Option<GraphViolation> {
    let mut successors: IndexMap<&str, Vec<&str>> = IndexMap::with_capacity(nodes.len());
    for node in nodes {
        match successors.entry(node.name.as_str()) {
            Entry::Occupied(_) => return Some(GraphViolation::DuplicateNodeNames),
            Entry::Vacant(slot) => {
                slot.insert(Vec::new());
            }
        }
    }

    for edge in edges {
        let source = edge.source.as_str();
        let target = edge.target.as_str();
        if !successors.contains_key(target) {
            return Some(GraphViolation::NonExistentNodeInEdge);
        }
        match successors.get_mut(source) {
            Some(targets) => targets.push(target),
            None => return Some(GraphViolation::NonExistentNodeInEdge),
        }
    }

    let cyclic = successors
        .keys()
        .any(|start| !first_branch_is_acyclic(start, &successors));
    cyclic.then_some(GraphViolation::ContainsCycle)
}

pub fn ensure_graph_invariants(nodes: &[NodeData], edges: &[EdgeData]) -> Result<()> {
    if let Some(violation) = graph_violation(nodes, edges) {
        return Err(LibError::invalid_with_code(
            violation.error_code(),
            violation.public_message(),
            anyhow!(
                "graph validation failed with {:?} ({} nodes, {} edges)",
                violation,
                nodes.len(),
                edges.len()
            ),
        ));
    }

    Ok(())
}

/// Walks only the first outgoing edge of each node reached from `start`.
///
/// The visited set starts empty, so `start` itself is only recorded once the
/// walk returns to it. Sibling edges are never followed, which means a cycle
/// reachable only through a node's second or later edge goes unreported.
/// Every step either hits a visited node or grows the set, so the walk ends
/// after at most `successors.len() + 1` steps.
fn first_branch_is_acyclic(start: &str, successors: &IndexMap<&str, Vec<&str>>) -> bool {
    let mut visited: HashSet<&str> = HashSet::new();
    let mut current = start;
    while let Some(next) = successors.get(current).and_then(|targets| targets.first()) {
        if !visited.insert(*next) {
            return false;
        }
        current = *next;
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nodes(names: &[&str]) -> Vec<NodeData> {
        names
            .iter()
            .map(|name| NodeData {
                name: name.to_string(),
            })
            .collect()
    }

    fn edges(pairs: &[(&str, &str)]) -> Vec<EdgeData> {
        pairs
            .iter()
            .map(|(source, target)| EdgeData {
                source: source.to_string(),
                target: target.to_string(),
            })
            .collect()
    }

    #[test]
    fn accepts_simple_chain() {
        let violation = graph_violation(
            &nodes(&["A", "B", "C"]),
            &edges(&[("A", "B"), ("B", "C")]),
        );
        assert_eq!(violation, None);
    }

    #[test]
    fn accepts_graph_without_edges() {
        assert_eq!(graph_violation(&nodes(&["A", "B"]), &[]), None);
        assert_eq!(graph_violation(&[], &[]), None);
    }

    #[test]
    fn rejects_duplicate_names_before_anything_else() {
        let violation = graph_violation(
            &nodes(&["A", "B", "A"]),
            &edges(&[("A", "missing"), ("A", "A")]),
        );
        assert_eq!(violation, Some(GraphViolation::DuplicateNodeNames));
    }

    #[test]
    fn rejects_unknown_edge_source() {
        let violation = graph_violation(&nodes(&["A", "B"]), &edges(&[("C", "A")]));
        assert_eq!(violation, Some(GraphViolation::NonExistentNodeInEdge));
    }

    #[test]
    fn rejects_unknown_edge_target() {
        let violation = graph_violation(&nodes(&["A", "B"]), &edges(&[("A", "C")]));
        assert_eq!(violation, Some(GraphViolation::NonExistentNodeInEdge));
    }

    #[test]
    fn unknown_endpoint_wins_over_cycle() {
        let violation = graph_violation(
            &nodes(&["A", "B"]),
            &edges(&[("A", "B"), ("B", "A"), ("B", "Z")]),
        );
        assert_eq!(violation, Some(GraphViolation::NonExistentNodeInEdge));
    }

    #[test]
    fn rejects_straight_line_cycle() {
        let violation = graph_violation(
            &nodes(&["A", "B", "C"]),
            &edges(&[("A", "B"), ("B", "C"), ("C", "A")]),
        );
        assert_eq!(violation, Some(GraphViolation::ContainsCycle));
    }

    #[test]
    fn rejects_self_loop() {
        let violation = graph_violation(&nodes(&["A", "B"]), &edges(&[("A", "A")]));
        assert_eq!(violation, Some(GraphViolation::ContainsCycle));
    }

    #[test]
    fn rejects_cycle_reached_through_first_edges_from_any_start() {
        let violation = graph_violation(
            &nodes(&["A", "B", "C", "D"]),
            &edges(&[("A", "D"), ("D", "B"), ("B", "C"), ("C", "B")]),
        );
        assert_eq!(violation, Some(GraphViolation::ContainsCycle));
    }

    #[test]
    fn accepts_diamond() {
        let violation = graph_violation(
            &nodes(&["A", "B", "C", "D"]),
            &edges(&[("A", "B"), ("A", "C"), ("B", "D"), ("C", "D")]),
        );
        assert_eq!(violation, None);
    }

    #[test]
    fn misses_cycle_that_only_closes_through_a_second_edge() {
        // A -> C -> A is a real cycle, but A's first edge goes to the sink B
        // and C's walk runs A -> B before it can come back to C.
        let violation = graph_violation(
            &nodes(&["A", "B", "C"]),
            &edges(&[("A", "B"), ("A", "C"), ("C", "A")]),
        );
        assert_eq!(violation, None);
    }

    #[test]
    fn detects_loop_when_its_members_lead_with_loop_edges() {
        // Reached from A only through a second edge, but D starts its own walk.
        let violation = graph_violation(
            &nodes(&["A", "B", "C", "D", "E"]),
            &edges(&[("A", "B"), ("A", "C"), ("C", "B"), ("C", "D"), ("D", "E"), ("E", "D")]),
        );
        assert_eq!(violation, Some(GraphViolation::ContainsCycle));
    }

    #[test]
    fn misses_cycle_in_second_branch_of_diamond() {
        // C -> D -> C is a cycle, but both C and D lead with an edge to the sink B.
        let violation = graph_violation(
            &nodes(&["A", "B", "C", "D"]),
            &edges(&[("A", "B"), ("A", "C"), ("C", "B"), ("C", "D"), ("D", "B"), ("D", "C")]),
        );
        assert_eq!(violation, None);
    }

    #[test]
    fn ensure_reports_public_message_and_code() {
        let err = ensure_graph_invariants(
            &nodes(&["A", "B", "C"]),
            &edges(&[("A", "B"), ("B", "C"), ("C", "A")]),
        )
        .expect_err("cycle should be rejected");
        assert_eq!(err.public, "Graph can't contain cycles");
        assert_eq!(err.code, "graph_cycle");
        assert_eq!(err.kind, crate::error::ErrorKind::InvalidInput);
    }
}
