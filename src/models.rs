use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Grouping key shared by every node of one submitted graph.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct GraphId(pub i64);

impl fmt::Display for GraphId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for GraphId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        i64::from_str(s).map(Self)
    }
}

impl From<i64> for GraphId {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

/// Store-assigned identity of a node row, distinct from its name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub i64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeData {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeData {
    pub source: String,
    pub target: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CreateGraphPayload {
    pub nodes: Vec<NodeData>,
    pub edges: Vec<EdgeData>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CreatedGraph {
    pub id: GraphId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectedGraph {
    pub id: GraphId,
    pub nodes: Vec<NodeData>,
    pub edges: Vec<EdgeData>,
}

/// Node name to neighbour names, keyed in node insertion order.
pub type Adjacency = IndexMap<String, Vec<String>>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdjacencyList {
    pub adjacency_list: Adjacency,
}

/// Persisted node row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredNode {
    pub id: NodeId,
    pub name: String,
}

/// Persisted edge row; endpoints reference node rows by id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoredEdge {
    pub id: i64,
    pub source_node_id: NodeId,
    pub target_node_id: NodeId,
}

/// Node and edge rows of one graph, both in insertion order.
#[derive(Debug, Clone, Default)]
pub struct GraphRows {
    pub nodes: Vec<StoredNode>,
    pub edges: Vec<StoredEdge>,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{AdjacencyList, CreateGraphPayload, DirectedGraph, EdgeData, GraphId, NodeData};

    #[test]
    fn graph_id_parses_integers_only() {
        assert_eq!("12".parse::<GraphId>().expect("integer id"), GraphId(12));
        assert!("qwerty".parse::<GraphId>().is_err());
        assert!("1.5".parse::<GraphId>().is_err());
    }

    #[test]
    fn create_payload_reads_wire_shape() {
        let payload: CreateGraphPayload = serde_json::from_value(json!({
            "nodes": [{"name": "A"}, {"name": "B"}],
            "edges": [{"source": "A", "target": "B"}]
        }))
        .expect("payload should deserialize");

        let names: Vec<_> = payload.nodes.iter().map(|node| node.name.as_str()).collect();
        assert_eq!(names, vec!["A", "B"]);
        assert_eq!(
            payload.edges,
            vec![EdgeData {
                source: "A".to_string(),
                target: "B".to_string(),
            }]
        );
    }

    #[test]
    fn graph_serializes_id_as_plain_integer() {
        let graph = DirectedGraph {
            id: GraphId(3),
            nodes: vec![NodeData {
                name: "a".to_string(),
            }],
            edges: vec![EdgeData {
                source: "a".to_string(),
                target: "a".to_string(),
            }],
        };

        assert_eq!(
            serde_json::to_value(&graph).expect("graph should serialize"),
            json!({
                "id": 3,
                "nodes": [{"name": "a"}],
                "edges": [{"source": "a", "target": "a"}]
            })
        );
    }

    #[test]
    fn adjacency_list_keeps_node_order() {
        let mut list = AdjacencyList {
            adjacency_list: Default::default(),
        };
        list.adjacency_list.insert("z".to_string(), vec![]);
        list.adjacency_list
            .insert("a".to_string(), vec!["z".to_string()]);

        let encoded = serde_json::to_string(&list).expect("adjacency should serialize");
        assert_eq!(encoded, r#"{"adjacency_list":{"z":[],"a":["z"]}}"#);
    }
}
