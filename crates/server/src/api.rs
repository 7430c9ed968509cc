use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use dermai_llm::{ProxyReply, ProxyRequest};
use serde::Serialize;
use tracing::{debug, warn};

use crate::state::AppState;

// ── Health ────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub assistant_ready: bool,
}

pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        assistant_ready: state.provider.is_some(),
    })
}

// ── Assistant ─────────────────────────────────────────────────

type ApiError = (StatusCode, Json<ProxyReply>);

fn api_error(status: StatusCode, error: impl Into<String>) -> ApiError {
    (status, Json(ProxyReply::Error { error: error.into() }))
}

/// `POST /api/assistant`: one generation request. Upstream failures come back
/// as `{ "error": ... }` with the upstream status.
pub async fn assistant(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ProxyRequest>,
) -> Result<Json<ProxyReply>, ApiError> {
    let provider = state.provider.as_ref().ok_or_else(|| {
        api_error(
            StatusCode::SERVICE_UNAVAILABLE,
            "Assistant not configured. Set GEMINI_API_KEY on the server.",
        )
    })?;

    if req.prompt.trim().is_empty() {
        return Err(api_error(StatusCode::BAD_REQUEST, "prompt must not be empty"));
    }

    debug!(prompt_chars = req.prompt.len(), "Forwarding assistant request");

    match provider.complete(&req.prompt, &req.generation_config).await {
        Ok(text) => Ok(Json(ProxyReply::Text { text })),
        Err(e) => {
            warn!(error = %e, "Assistant upstream failed");
            let status = StatusCode::from_u16(e.status()).unwrap_or(StatusCode::BAD_GATEWAY);
            Err(api_error(status, e.to_string()))
        }
    }
}
