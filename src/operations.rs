use std::sync::Arc;

use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tokio::sync::Mutex;

use crate::db;
use crate::error::Result;
use crate::invariants;
use crate::models::{AdjacencyList, CreateGraphPayload, CreatedGraph, DirectedGraph, GraphId};

/// High-level graph actions, callable without going through HTTP.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "operation", rename_all = "snake_case")]
pub enum GraphOperation {
    Create { payload: CreateGraphPayload },
    Get { graph_id: GraphId },
    AdjacencyList { graph_id: GraphId },
    ReverseAdjacencyList { graph_id: GraphId },
    DeleteNode { graph_id: GraphId, name: String },
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum GraphOperationResult {
    Created { graph: CreatedGraph },
    Graph { graph: DirectedGraph },
    AdjacencyList { adjacency: AdjacencyList },
    Deleted,
}

/// Validator and store behind one handle.
///
/// Graph creation goes through `writer`, so reading the next id and inserting
/// the graph row never interleave between two submissions on this handle.
#[derive(Clone)]
pub struct GraphOperations {
    pool: Arc<SqlitePool>,
    writer: Arc<Mutex<()>>,
}

impl GraphOperations {
    pub fn new(pool: Arc<SqlitePool>) -> Self {
        Self {
            pool,
            writer: Arc::new(Mutex::new(())),
        }
    }

    pub fn from_pool(pool: &SqlitePool) -> Self {
        Self::new(Arc::new(pool.clone()))
    }

    pub fn pool(&self) -> Arc<SqlitePool> {
        Arc::clone(&self.pool)
    }

    pub async fn execute(&self, operation: GraphOperation) -> Result<GraphOperationResult> {
        match operation {
            GraphOperation::Create { payload } => {
                let graph = self.create_graph(payload).await?;
                Ok(GraphOperationResult::Created { graph })
            }
            GraphOperation::Get { graph_id } => {
                let graph = self.get_graph(graph_id).await?;
                Ok(GraphOperationResult::Graph { graph })
            }
            GraphOperation::AdjacencyList { graph_id } => {
                let adjacency = self.adjacency_list(graph_id).await?;
                Ok(GraphOperationResult::AdjacencyList { adjacency })
            }
            GraphOperation::ReverseAdjacencyList { graph_id } => {
                let adjacency = self.reverse_adjacency_list(graph_id).await?;
                Ok(GraphOperationResult::AdjacencyList { adjacency })
            }
            GraphOperation::DeleteNode { graph_id, name } => {
                self.delete_node(graph_id, &name).await?;
                Ok(GraphOperationResult::Deleted)
            }
        }
    }

    pub async fn create_graph(&self, payload: CreateGraphPayload) -> Result<CreatedGraph> {
        invariants::ensure_graph_invariants(&payload.nodes, &payload.edges)?;

        let _guard = self.writer.lock().await;
        let id = db::create_graph(&self.pool, &payload).await?;
        Ok(CreatedGraph { id })
    }

    pub async fn get_graph(&self, graph_id: GraphId) -> Result<DirectedGraph> {
        db::get_graph(&self.pool, graph_id).await
    }

    pub async fn adjacency_list(&self, graph_id: GraphId) -> Result<AdjacencyList> {
        db::get_adjacency_list(&self.pool, graph_id).await
    }

    pub async fn reverse_adjacency_list(&self, graph_id: GraphId) -> Result<AdjacencyList> {
        db::get_reverse_adjacency_list(&self.pool, graph_id).await
    }

    pub async fn delete_node(&self, graph_id: GraphId, name: &str) -> Result<()> {
        db::delete_node(&self.pool, graph_id, name).await
    }
}
