//! REST endpoints for flow status and manual start/reset.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::engine::FlowEngine;
use crate::error::{Error, FlowError};
use crate::render;

/// Shared state for flow routes.
#[derive(Clone)]
pub struct FlowRouteState {
    pub engine: Arc<FlowEngine>,
}

// ── Health ──────────────────────────────────────────────────────────────

/// GET /health
///
/// Service liveness plus the health of every registered channel.
/// Overall status degrades when any channel's transport is down.
async fn health(State(state): State<FlowRouteState>) -> impl IntoResponse {
    let checks = state.engine.channel_health().await;
    let status = if checks.iter().all(|(_, healthy)| *healthy) {
        "ok"
    } else {
        "degraded"
    };
    let channels: serde_json::Map<String, serde_json::Value> = checks
        .into_iter()
        .map(|(name, healthy)| (name, (if healthy { "ok" } else { "down" }).into()))
        .collect();
    Json(serde_json::json!({
        "status": status,
        "service": "formflow",
        "channels": channels,
    }))
}

// ── Flow queries ────────────────────────────────────────────────────────

/// GET /flows
///
/// Lists every active flow, oldest first.
async fn list_flows(State(state): State<FlowRouteState>) -> impl IntoResponse {
    let flows = state.engine.flows().await;
    Json(serde_json::json!({
        "count": flows.len(),
        "flows": flows,
    }))
}

/// GET /flow/{conversation_id}
///
/// Returns one conversation's flow, or 404 when none is active.
async fn get_flow(
    State(state): State<FlowRouteState>,
    Path(conversation_id): Path<String>,
) -> impl IntoResponse {
    match state.engine.status(&conversation_id).await {
        Ok(flow) => Json(serde_json::to_value(flow).unwrap_or_default()).into_response(),
        Err(_) => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({"error": render::no_active_flow()})),
        )
            .into_response(),
    }
}

// ── Manual control ──────────────────────────────────────────────────────

/// POST /flow/{conversation_id}/start
///
/// Starts a flow and sends the opening prompts on the default channel.
/// 409 when the conversation already has one.
async fn start_flow(
    State(state): State<FlowRouteState>,
    Path(conversation_id): Path<String>,
) -> impl IntoResponse {
    match state.engine.start(&conversation_id).await {
        Ok(()) => Json(serde_json::json!({
            "status": "form_started",
            "conversation_id": conversation_id,
        }))
        .into_response(),
        Err(Error::Flow(FlowError::AlreadyExists { .. })) => (
            StatusCode::CONFLICT,
            Json(serde_json::json!({
                "error": "A form is already active for this conversation"
            })),
        )
            .into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({"error": e.to_string()})),
        )
            .into_response(),
    }
}

/// POST /flow/{conversation_id}/reset
///
/// Discards the conversation's flow. Always 200; resetting a
/// conversation with no flow is a no-op.
async fn reset_flow(
    State(state): State<FlowRouteState>,
    Path(conversation_id): Path<String>,
) -> impl IntoResponse {
    state.engine.reset(&conversation_id).await;
    Json(serde_json::json!({
        "status": "flow_reset",
        "conversation_id": conversation_id,
    }))
}

/// Build the flow REST routes.
pub fn flow_routes(state: FlowRouteState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/flows", get(list_flows))
        .route("/flow/{conversation_id}", get(get_flow))
        .route("/flow/{conversation_id}/start", post(start_flow))
        .route("/flow/{conversation_id}/reset", post(reset_flow))
        .with_state(state)
}
