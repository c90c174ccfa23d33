//! HTTP server mode for `operadoras`.
//!
//! This module exposes a small HTTP+JSON API over the loaded table:
//!
//! - `GET /buscar?termo=<term>` – returns a `SearchResult`.
//! - `GET /health` – reports whether a table is loaded.
//!
//! The server is intentionally thin: it extracts the query string,
//! delegates to the search engine on the blocking pool, and converts
//! errors into JSON HTTP responses.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::{
    extract::{Query, State},
    http::{
        header::{ACCEPT, CONTENT_TYPE},
        HeaderValue, Method, StatusCode,
    },
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tracing::{debug, error, info, warn};

use crate::models::{HealthResponse, SearchResult};
use crate::search::{self, SearchError};
use crate::table::Table;

/// Shared state handed to every handler.
///
/// The table is immutable after load, so handlers share it without
/// locking.
#[derive(Clone)]
pub struct AppState {
    table: Arc<Table>,
}

impl AppState {
    pub fn new(table: Table) -> Self {
        Self {
            table: Arc::new(table),
        }
    }
}

/// JSON error body returned by the API.
#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

/// Error type used by HTTP handlers to map search failures into JSON
/// error responses.
#[derive(Debug)]
struct ApiError {
    status: StatusCode,
    message: String,
    details: Option<String>,
}

impl From<SearchError> for ApiError {
    fn from(err: SearchError) -> Self {
        match err {
            SearchError::DataUnavailable => Self {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                message: SearchError::DataUnavailable.to_string(),
                details: None,
            },
            SearchError::Processing { details } => Self {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                message: "failed to process search".to_string(),
                details: Some(details),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorResponse {
            error: self.message,
            details: self.details,
        });
        (self.status, body).into_response()
    }
}

/// Build the Axum router for the search API.
///
/// `cors_origins` lists the origins allowed to call the API from a
/// browser; an empty list, or one containing `*`, allows any origin.
pub fn router(state: AppState, cors_origins: &[String]) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/buscar", get(buscar))
        .with_state(state)
        .layer(cors_layer(cors_origins))
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([ACCEPT, CONTENT_TYPE]);

    if origins.is_empty() || origins.iter().any(|origin| origin.trim() == "*") {
        return cors.allow_origin(Any);
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    cors.allow_origin(allowed)
}

/// Run the HTTP server bound to the provided socket address.
///
/// This is used by the CLI `operadoras serve` subcommand. The table
/// must already be loaded (or downgraded to the sentinel) so that no
/// request is accepted before loading has finished.
pub async fn run(addr: SocketAddr, table: Table, cors_origins: &[String]) -> Result<()> {
    let listener = TcpListener::bind(addr).await?;
    serve_with_listener(listener, table, cors_origins).await
}

/// Run the HTTP server using an existing `TcpListener`.
pub async fn serve_with_listener(
    listener: TcpListener,
    table: Table,
    cors_origins: &[String],
) -> Result<()> {
    if table.is_unavailable() {
        warn!("serving without data; searches will report data unavailable");
    }
    info!(addr = %listener.local_addr()?, "listening");

    let app = router(AppState::new(table), cors_origins);
    axum::serve(listener, app).await?;
    Ok(())
}

async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    match state.table.info() {
        Some(info) => (
            StatusCode::OK,
            Json(HealthResponse {
                status: "ok",
                table: Some(info),
            }),
        ),
        None => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(HealthResponse {
                status: "unavailable",
                table: None,
            }),
        ),
    }
}

/// First `termo` value in the query string; repeated keys are ignored.
fn first_termo(params: Vec<(String, String)>) -> String {
    params
        .into_iter()
        .find(|(key, _)| key == "termo")
        .map(|(_, value)| value)
        .unwrap_or_default()
}

async fn buscar(
    State(state): State<AppState>,
    Query(params): Query<Vec<(String, String)>>,
) -> Result<Json<SearchResult>, ApiError> {
    let termo = first_termo(params);
    let table = Arc::clone(&state.table);

    respond(run_blocking(move || search::search(&table, &termo)).await)
}

/// Run a search on the blocking pool. A panic or cancellation of the
/// task is reported as a processing error.
async fn run_blocking<F>(scan: F) -> Result<SearchResult, SearchError>
where
    F: FnOnce() -> Result<SearchResult, SearchError> + Send + 'static,
{
    tokio::task::spawn_blocking(scan)
        .await
        .unwrap_or_else(|join_err| {
            Err(SearchError::Processing {
                details: join_err.to_string(),
            })
        })
}

fn respond(outcome: Result<SearchResult, SearchError>) -> Result<Json<SearchResult>, ApiError> {
    match outcome {
        Ok(result) => {
            debug!(total = result.total, "search completed");
            Ok(Json(result))
        }
        Err(err) => {
            error!(error = %err, "search failed");
            Err(ApiError::from(err))
        }
    }
}
