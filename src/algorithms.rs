use std::collections::HashMap;

use crate::models::{Adjacency, EdgeData, GraphRows, NodeData, NodeId, StoredEdge};

fn names_by_id(rows: &GraphRows) -> HashMap<NodeId, &str> {
    rows.nodes
        .iter()
        .map(|node| (node.id, node.name.as_str()))
        .collect()
}

pub fn node_views(rows: &GraphRows) -> Vec<NodeData> {
    rows.nodes
        .iter()
        .map(|node| NodeData {
            name: node.name.clone(),
        })
        .collect()
}

/// Edges grouped by source node in node order, then by edge insertion order.
pub fn edge_views(rows: &GraphRows) -> Vec<EdgeData> {
    let names = names_by_id(rows);
    let mut edges = Vec::with_capacity(rows.edges.len());
    for node in &rows.nodes {
        for edge in rows
            .edges
            .iter()
            .filter(|edge| edge.source_node_id == node.id)
        {
            // Best-effort behavior: skip edges whose target row is gone.
            let Some(target) = names.get(&edge.target_node_id) else {
                continue;
            };
            edges.push(EdgeData {
                source: node.name.clone(),
                target: (*target).to_string(),
            });
        }
    }
    edges
}

/// Outgoing neighbours per node name.
pub fn adjacency_list(rows: &GraphRows) -> Adjacency {
    neighbours(rows, |edge| (edge.source_node_id, edge.target_node_id))
}

/// Incoming neighbours per node name.
pub fn reverse_adjacency_list(rows: &GraphRows) -> Adjacency {
    neighbours(rows, |edge| (edge.target_node_id, edge.source_node_id))
}

fn neighbours<F>(rows: &GraphRows, endpoints: F) -> Adjacency
where
    F: Fn(&StoredEdge) -> (NodeId, NodeId),
{
    let names = names_by_id(rows);
    let mut by_id: HashMap<NodeId, Vec<String>> = rows
        .nodes
        .iter()
        .map(|node| (node.id, Vec::new()))
        .collect();

    for edge in &rows.edges {
        let (from, to) = endpoints(edge);
        let (Some(list), Some(name)) = (by_id.get_mut(&from), names.get(&to)) else {
            continue;
        };
        list.push((*name).to_string());
    }

    rows.nodes
        .iter()
        .map(|node| {
            let list = by_id.remove(&node.id).unwrap_or_default();
            (node.name.clone(), list)
        })
        .collect()
}
