use std::collections::HashMap;
use std::str::FromStr;

use anyhow::anyhow;
use once_cell::sync::Lazy;
use sqlx::migrate::{MigrateError, Migrator};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{FromRow, Sqlite, SqlitePool};

use crate::algorithms;
use crate::error::{LibError, Result};
use crate::invariants::GraphViolation;
use crate::models::{
    AdjacencyList, CreateGraphPayload, DirectedGraph, GraphId, GraphRows, NodeId, StoredEdge,
    StoredNode,
};

pub static MIGRATOR: Lazy<Migrator> = Lazy::new(|| {
    let mut migrator = sqlx::migrate!("./migrations");
    migrator.set_ignore_missing(true);
    migrator
});

pub async fn create_graph_tables(pool: &SqlitePool) -> std::result::Result<(), MigrateError> {
    MIGRATOR.run(pool).await
}

/// Opens a pool against `database_url` with foreign keys enforced.
pub async fn connect(database_url: &str, max_connections: u32) -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(database_url)
        .map_err(|err| db_err("Invalid database URL", err))?
        .foreign_keys(true);

    SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect_with(options)
        .await
        .map_err(|err| db_err("Failed to connect to database", err))
}

/// Single-connection in-memory database with the graph tables applied.
///
/// The connection is never recycled, since closing it would drop the data.
pub async fn connect_in_memory() -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")
        .map_err(|err| db_err("Invalid database URL", err))?
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await
        .map_err(|err| db_err("Failed to open in-memory database", err))?;

    create_graph_tables(&pool).await?;
    Ok(pool)
}

#[derive(Debug, Clone, FromRow)]
struct NodeRow {
    id: i64,
    name: String,
}

#[derive(Debug, Clone, FromRow)]
struct EdgeRow {
    id: i64,
    source_node_id: i64,
    target_node_id: i64,
}

impl From<NodeRow> for StoredNode {
    fn from(value: NodeRow) -> Self {
        Self {
            id: NodeId(value.id),
            name: value.name,
        }
    }
}

impl From<EdgeRow> for StoredEdge {
    fn from(value: EdgeRow) -> Self {
        Self {
            id: value.id,
            source_node_id: NodeId(value.source_node_id),
            target_node_id: NodeId(value.target_node_id),
        }
    }
}

/// Store failure with the generic public message; `context` only reaches the logs.
fn db_err(context: &'static str, err: sqlx::Error) -> LibError {
    let mut error = LibError::from(err);
    error.source = error.source.context(context);
    error
}

fn graph_not_found(graph_id: GraphId) -> LibError {
    LibError::not_found("Graph not found", anyhow!("graph {} has no nodes", graph_id))
}

/// Highest assigned graph id plus one, or zero for an empty store.
///
/// Not safe against a concurrent creator on its own; callers serialize
/// creation (see `GraphOperations`) and the `graphs` primary key rejects
/// any duplicate that still gets through.
pub async fn next_graph_id<'e, E>(executor: E) -> Result<GraphId>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    let next: (i64,) = sqlx::query_as(
        r#"
        SELECT COALESCE(MAX(id) + 1, 0)
        FROM graphs
        "#,
    )
    .fetch_one(executor)
    .await
    .map_err(|err| db_err("Failed to allocate graph id", err))?;

    Ok(GraphId(next.0))
}

/// Persists an already validated graph in one transaction and returns its id.
pub async fn create_graph(pool: &SqlitePool, payload: &CreateGraphPayload) -> Result<GraphId> {
    let mut tx = pool
        .begin()
        .await
        .map_err(|err| db_err("Failed to start transaction", err))?;

    let graph_id = next_graph_id(&mut *tx).await?;

    sqlx::query(
        r#"
        INSERT INTO graphs (id)
        VALUES (?)
        "#,
    )
    .bind(graph_id.0)
    .execute(&mut *tx)
    .await
    .map_err(|err| db_err("Failed to create graph", err))?;

    let mut node_ids: HashMap<&str, NodeId> = HashMap::with_capacity(payload.nodes.len());
    for node in &payload.nodes {
        let inserted = sqlx::query(
            r#"
            INSERT INTO nodes (graph_id, name)
            VALUES (?, ?)
            "#,
        )
        .bind(graph_id.0)
        .bind(&node.name)
        .execute(&mut *tx)
        .await
        .map_err(|err| db_err("Failed to write graph nodes", err))?;
        node_ids.insert(node.name.as_str(), NodeId(inserted.last_insert_rowid()));
    }

    for edge in &payload.edges {
        let (Some(source), Some(target)) = (
            node_ids.get(edge.source.as_str()),
            node_ids.get(edge.target.as_str()),
        ) else {
            let violation = GraphViolation::NonExistentNodeInEdge;
            return Err(LibError::invalid_with_code(
                violation.error_code(),
                violation.public_message(),
                anyhow!("edge {} -> {} has an unknown endpoint", edge.source, edge.target),
            ));
        };

        sqlx::query(
            r#"
            INSERT INTO edges (source_node_id, target_node_id)
            VALUES (?, ?)
            "#,
        )
        .bind(source.0)
        .bind(target.0)
        .execute(&mut *tx)
        .await
        .map_err(|err| db_err("Failed to write graph edges", err))?;
    }

    tx.commit()
        .await
        .map_err(|err| db_err("Failed to commit transaction", err))?;

    tracing::info!(
        graph_id = %graph_id,
        nodes = payload.nodes.len(),
        edges = payload.edges.len(),
        "created graph"
    );
    Ok(graph_id)
}

async fn load_graph_rows(
    tx: &mut sqlx::Transaction<'_, Sqlite>,
    graph_id: GraphId,
) -> Result<GraphRows> {
    let nodes = sqlx::query_as::<_, NodeRow>(
        r#"
        SELECT id, name
        FROM nodes
        WHERE graph_id = ?
        ORDER BY id ASC
        "#,
    )
    .bind(graph_id.0)
    .fetch_all(&mut **tx)
    .await
    .map_err(|err| db_err("Failed to query graph nodes", err))?;

    if nodes.is_empty() {
        return Err(graph_not_found(graph_id));
    }

    let edges = sqlx::query_as::<_, EdgeRow>(
        r#"
        SELECT e.id, e.source_node_id, e.target_node_id
        FROM edges e
        JOIN nodes s ON s.id = e.source_node_id
        WHERE s.graph_id = ?
        ORDER BY e.id ASC
        "#,
    )
    .bind(graph_id.0)
    .fetch_all(&mut **tx)
    .await
    .map_err(|err| db_err("Failed to query graph edges", err))?;

    Ok(GraphRows {
        nodes: nodes.into_iter().map(StoredNode::from).collect(),
        edges: edges.into_iter().map(StoredEdge::from).collect(),
    })
}

/// Loads every node and edge row of a graph inside one read transaction.
pub async fn get_graph_rows(pool: &SqlitePool, graph_id: GraphId) -> Result<GraphRows> {
    let mut tx = pool
        .begin()
        .await
        .map_err(|err| db_err("Failed to start transaction", err))?;

    let rows = load_graph_rows(&mut tx, graph_id).await?;

    tx.commit()
        .await
        .map_err(|err| db_err("Failed to commit transaction", err))?;

    Ok(rows)
}

pub async fn get_graph(pool: &SqlitePool, graph_id: GraphId) -> Result<DirectedGraph> {
    let rows = get_graph_rows(pool, graph_id).await?;
    Ok(DirectedGraph {
        id: graph_id,
        nodes: algorithms::node_views(&rows),
        edges: algorithms::edge_views(&rows),
    })
}

pub async fn get_adjacency_list(pool: &SqlitePool, graph_id: GraphId) -> Result<AdjacencyList> {
    let rows = get_graph_rows(pool, graph_id).await?;
    Ok(AdjacencyList {
        adjacency_list: algorithms::adjacency_list(&rows),
    })
}

pub async fn get_reverse_adjacency_list(
    pool: &SqlitePool,
    graph_id: GraphId,
) -> Result<AdjacencyList> {
    let rows = get_graph_rows(pool, graph_id).await?;
    Ok(AdjacencyList {
        adjacency_list: algorithms::reverse_adjacency_list(&rows),
    })
}

/// Removes a node's incident edges, then the node itself.
pub async fn delete_node(pool: &SqlitePool, graph_id: GraphId, name: &str) -> Result<()> {
    let mut tx = pool
        .begin()
        .await
        .map_err(|err| db_err("Failed to start transaction", err))?;

    let node: Option<(i64,)> = sqlx::query_as(
        r#"
        SELECT id
        FROM nodes
        WHERE graph_id = ?
          AND name = ?
        ORDER BY id ASC
        LIMIT 1
        "#,
    )
    .bind(graph_id.0)
    .bind(name)
    .fetch_optional(&mut *tx)
    .await
    .map_err(|err| db_err("Failed to query node", err))?;

    let Some((node_id,)) = node else {
        return Err(LibError::not_found(
            "Node doesn't exists",
            anyhow!("node {:?} not found in graph {}", name, graph_id),
        ));
    };

    let removed_edges = sqlx::query(
        r#"
        DELETE FROM edges
        WHERE source_node_id = ?
           OR target_node_id = ?
        "#,
    )
    .bind(node_id)
    .bind(node_id)
    .execute(&mut *tx)
    .await
    .map_err(|err| db_err("Failed to delete node edges", err))?;

    sqlx::query(
        r#"
        DELETE FROM nodes
        WHERE id = ?
        "#,
    )
    .bind(node_id)
    .execute(&mut *tx)
    .await
    .map_err(|err| db_err("Failed to delete node", err))?;

    tx.commit()
        .await
        .map_err(|err| db_err("Failed to commit transaction", err))?;

    tracing::info!(
        graph_id = %graph_id,
        node = name,
        edges = removed_edges.rows_affected(),
        "deleted node"
    );
    Ok(())
}
