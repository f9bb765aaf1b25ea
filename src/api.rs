use anyhow::anyhow;
use axum::{
    Json, Router,
    extract::{FromRequestParts, Path, State},
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
};
use serde::de::DeserializeOwned;
use serde_json::json;
use tower_http::trace::TraceLayer;

use crate::error::{ErrorKind, LibError};
use crate::models::{CreateGraphPayload, GraphId};
use crate::operations::GraphOperations;

#[derive(Debug)]
pub struct AppError(pub LibError);

impl From<LibError> for AppError {
    fn from(value: LibError) -> Self {
        Self(value)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self.0.kind {
            ErrorKind::Database => StatusCode::INTERNAL_SERVER_ERROR,
            ErrorKind::InvalidInput => StatusCode::BAD_REQUEST,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Unprocessable => StatusCode::UNPROCESSABLE_ENTITY,
        };

        if status.is_server_error() {
            tracing::error!(kind = ?self.0.kind, code = self.0.code, error = %self.0.source, "graph api request failed");
        } else {
            tracing::debug!(kind = ?self.0.kind, code = self.0.code, error = %self.0.source, "graph api request rejected");
        }
        (status, Json(json!({ "message": self.0.public }))).into_response()
    }
}

/// `Path` extractor whose rejection is a 422 with the API's error body.
#[derive(Debug)]
pub struct ApiPath<T>(pub T);

impl<S, T> FromRequestParts<S> for ApiPath<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Path::<T>::from_request_parts(parts, state).await {
            Ok(Path(value)) => Ok(Self(value)),
            Err(rejection) => Err(AppError(LibError::unprocessable(
                "Invalid path parameter",
                anyhow!(rejection.body_text()),
            ))),
        }
    }
}

pub trait GraphApp {
    fn graph_operations(&self) -> GraphOperations;
}

async fn create_graph_handler<S>(
    State(app): State<S>,
    Json(payload): Json<CreateGraphPayload>,
) -> Result<impl IntoResponse, AppError>
where
    S: GraphApp + Clone + Send + Sync + 'static,
{
    let created = app.graph_operations().create_graph(payload).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn get_graph_handler<S>(
    State(app): State<S>,
    ApiPath(graph_id): ApiPath<GraphId>,
) -> Result<impl IntoResponse, AppError>
where
    S: GraphApp + Clone + Send + Sync + 'static,
{
    let graph = app.graph_operations().get_graph(graph_id).await?;
    Ok(Json(graph))
}

async fn adjacency_list_handler<S>(
    State(app): State<S>,
    ApiPath(graph_id): ApiPath<GraphId>,
) -> Result<impl IntoResponse, AppError>
where
    S: GraphApp + Clone + Send + Sync + 'static,
{
    let adjacency = app.graph_operations().adjacency_list(graph_id).await?;
    Ok(Json(adjacency))
}

async fn reverse_adjacency_list_handler<S>(
    State(app): State<S>,
    ApiPath(graph_id): ApiPath<GraphId>,
) -> Result<impl IntoResponse, AppError>
where
    S: GraphApp + Clone + Send + Sync + 'static,
{
    let adjacency = app
        .graph_operations()
        .reverse_adjacency_list(graph_id)
        .await?;
    Ok(Json(adjacency))
}

async fn delete_node_handler<S>(
    State(app): State<S>,
    ApiPath((graph_id, name)): ApiPath<(GraphId, String)>,
) -> Result<impl IntoResponse, AppError>
where
    S: GraphApp + Clone + Send + Sync + 'static,
{
    app.graph_operations().delete_node(graph_id, &name).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn health_handler() -> Json<serde_json::Value> {
    Json(json!({
        "ok": true
    }))
}

pub fn routes<S>() -> Router<S>
where
    S: GraphApp + Clone + Send + Sync + 'static,
{
    tracing::info!("Registering route /graph [POST]");
    tracing::info!("Registering route /graph/{{graph_id}} [GET]");
    tracing::info!("Registering route /graph/{{graph_id}}/adjacency_list [GET]");
    tracing::info!("Registering route /graph/{{graph_id}}/reverse_adjacency_list [GET]");
    tracing::info!("Registering route /graph/{{graph_id}}/node/{{name}} [DELETE]");

    Router::new()
        .route("/graph", post(create_graph_handler::<S>))
        .route("/graph/{graph_id}", get(get_graph_handler::<S>))
        .route(
            "/graph/{graph_id}/adjacency_list",
            get(adjacency_list_handler::<S>),
        )
        .route(
            "/graph/{graph_id}/reverse_adjacency_list",
            get(reverse_adjacency_list_handler::<S>),
        )
        .route(
            "/graph/{graph_id}/node/{name}",
            delete(delete_node_handler::<S>),
        )
}

/// Graph routes under `/api` plus `/healthz`, wrapped in request tracing.
pub fn app<S>(state: S) -> Router
where
    S: GraphApp + Clone + Send + Sync + 'static,
{
    Router::new()
        .route("/healthz", get(health_handler))
        .nest("/api", routes::<S>())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Clone)]
pub struct AppState {
    operations: GraphOperations,
}

impl AppState {
    pub fn new(operations: GraphOperations) -> Self {
        Self { operations }
    }
}

impl GraphApp for AppState {
    fn graph_operations(&self) -> GraphOperations {
        self.operations.clone()
    }
}
