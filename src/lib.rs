pub mod algorithms;
#[cfg(feature = "api")]
pub mod api;
pub mod config;
#[cfg(feature = "sqlx")]
pub mod db;
pub mod error;
pub mod invariants;
pub mod models;
#[cfg(feature = "sqlx")]
pub mod operations;

pub mod prelude {
    pub use crate::algorithms::{adjacency_list, edge_views, node_views, reverse_adjacency_list};
    #[cfg(feature = "api")]
    pub use crate::api::{AppState, GraphApp, app, routes};
    pub use crate::config::{ServerConfig, init_logging};
    #[cfg(feature = "sqlx")]
    pub use crate::db::{
        connect, connect_in_memory, create_graph, create_graph_tables, delete_node,
        get_adjacency_list, get_graph, get_reverse_adjacency_list, next_graph_id,
    };
    pub use crate::error::{ErrorKind, LibError, Result};
    pub use crate::invariants::{GraphViolation, ensure_graph_invariants, graph_violation};
    pub use crate::models::{
        AdjacencyList, CreateGraphPayload, CreatedGraph, DirectedGraph, EdgeData, GraphId,
        NodeData, NodeId,
    };
    #[cfg(feature = "sqlx")]
    pub use crate::operations::{GraphOperation, GraphOperationResult, GraphOperations};
}
