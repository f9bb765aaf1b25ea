use std::sync::Arc;

use anyhow::Context;
use dag_service::api::{self, AppState};
use dag_service::config::{self, ServerConfig};
use dag_service::db;
use dag_service::operations::GraphOperations;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    config::init_logging();

    let config = ServerConfig::from_env().context("failed to read server configuration")?;

    let pool = db::connect(&config.database_url, config.max_connections)
        .await
        .with_context(|| format!("failed to open database '{}'", config.database_url))?;

    db::create_graph_tables(&pool)
        .await
        .context("failed to run graph migrations")?;

    let state = AppState::new(GraphOperations::new(Arc::new(pool)));
    let app = api::app(state);

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind listener on {}", config.bind_addr))?;

    tracing::info!(bind = %config.bind_addr, "graph api server listening");

    axum::serve(listener, app)
        .await
        .context("graph api server failed")
}
