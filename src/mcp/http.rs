//! HTTP front-end: JSON-RPC envelopes POSTed to `/mcp`.
//!
//! - body that is not JSON: 400 with a parse-error envelope
//! - request: 200 with the response envelope, whether it holds a result or an error
//! - notification: 202, empty body
//! - any method other than POST: 405

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{DefaultBodyLimit, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde_json::Value;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

use crate::errors::{CatalogError, Result};

use super::dispatcher::{Dispatch, MethodTable};
use super::transport::DecodeError;

/// The single JSON-RPC endpoint.
pub const MCP_PATH: &str = "/mcp";

/// Maximum request body size (1MB).
const MAX_BODY_SIZE: usize = 1024 * 1024;

/// Called when an `exit` notification is received.
pub type ExitHook = Arc<dyn Fn() + Send + Sync>;

/// Shared state handed to every request.
#[derive(Clone)]
pub struct HttpState {
    table: Arc<MethodTable>,
    on_exit: ExitHook,
}

impl HttpState {
    /// State whose `exit` handling terminates the process with status 0.
    pub fn new(table: Arc<MethodTable>) -> Self {
        Self {
            table,
            on_exit: Arc::new(|| std::process::exit(0)),
        }
    }

    /// Replaces what happens on `exit`.
    pub fn with_exit_hook(mut self, hook: ExitHook) -> Self {
        self.on_exit = hook;
        self
    }
}

/// Builds the router serving [`MCP_PATH`].
pub fn router(state: HttpState) -> Router {
    Router::new()
        .route(MCP_PATH, post(handle_json_rpc))
        .layer(DefaultBodyLimit::max(MAX_BODY_SIZE))
        .with_state(state)
}

/// Binds `addr` and serves until the process ends.
pub async fn run(addr: &str, state: HttpState) -> Result<()> {
    let listener = TcpListener::bind(addr).await.map_err(|e| CatalogError::Bind {
        addr: addr.to_string(),
        source: e,
    })?;
    serve(listener, state).await
}

/// Serves on an already-bound listener.
pub async fn serve(listener: TcpListener, state: HttpState) -> Result<()> {
    match listener.local_addr() {
        Ok(addr) => info!("Starting HTTP MCP server on http://{}{}", addr, MCP_PATH),
        Err(e) => warn!(error = %e, "listener has no local address"),
    }

    axum::serve(listener, router(state)).await?;
    Ok(())
}

async fn handle_json_rpc(State(state): State<HttpState>, body: Bytes) -> Response {
    let value: Value = match serde_json::from_slice(&body) {
        Ok(v) => v,
        Err(e) => {
            let response = DecodeError::Parse(e.to_string()).into_response();
            return (StatusCode::BAD_REQUEST, Json(response)).into_response();
        }
    };

    let table = Arc::clone(&state.table);
    let outcome = match tokio::task::spawn_blocking(move || table.handle_value(value)).await {
        Ok(outcome) => outcome,
        Err(e) => {
            error!(error = %e, "dispatch task failed");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    match outcome {
        Dispatch::Reply(response) => (StatusCode::OK, Json(response)).into_response(),
        Dispatch::Silent => StatusCode::ACCEPTED.into_response(),
        Dispatch::Exit(reply) => {
            info!("exit notification received");
            (state.on_exit)();
            match reply {
                Some(response) => (StatusCode::OK, Json(response)).into_response(),
                None => StatusCode::ACCEPTED.into_response(),
            }
        }
    }
}
