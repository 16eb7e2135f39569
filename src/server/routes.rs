//! HTTP route handlers for the panel host API.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use crate::chat::{Mode, SessionId, SessionSnapshot, SubmissionController, SubmitOutcome, User};

use super::state::AppState;

type ApiError = (StatusCode, String);

/// Create the API router with all routes.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/sessions", post(open_session))
        .route("/api/sessions/{id}", get(get_session).delete(close_session))
        .route("/api/sessions/{id}/draft", put(set_draft))
        .route("/api/sessions/{id}/messages", post(send_message))
        .route("/api/sessions/{id}/entries", delete(clear_entries))
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "learning-assistant",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Newly opened session.
#[derive(Debug, Serialize)]
pub struct SessionCreated {
    /// Panel id to use in later calls.
    pub id: SessionId,
}

/// Draft update request.
#[derive(Debug, Deserialize)]
pub struct DraftRequest {
    /// New draft text.
    pub text: String,
}

/// Submit request.
#[derive(Debug, Deserialize)]
pub struct MessageRequest {
    /// Asking user.
    #[serde(default)]
    pub user: User,
    /// Mode for this submit; the configured default when absent.
    pub mode: Option<Mode>,
    /// Question text; the current draft is submitted when absent.
    pub query: Option<String>,
}

fn lookup(state: &AppState, id: &SessionId) -> Result<Arc<SubmissionController>, ApiError> {
    state
        .session(id)
        .ok_or_else(|| (StatusCode::NOT_FOUND, format!("Unknown session: {id}")))
}

async fn open_session(State(state): State<Arc<AppState>>) -> (StatusCode, Json<SessionCreated>) {
    let id = state.open_session();
    (StatusCode::CREATED, Json(SessionCreated { id }))
}

async fn get_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<SessionId>,
) -> Result<Json<SessionSnapshot>, ApiError> {
    let controller = lookup(&state, &id)?;
    Ok(Json(controller.snapshot().await))
}

async fn set_draft(
    State(state): State<Arc<AppState>>,
    Path(id): Path<SessionId>,
    Json(request): Json<DraftRequest>,
) -> Result<StatusCode, ApiError> {
    let controller = lookup(&state, &id)?;
    controller.set_draft(request.text).await;
    Ok(StatusCode::NO_CONTENT)
}

async fn send_message(
    State(state): State<Arc<AppState>>,
    Path(id): Path<SessionId>,
    Json(request): Json<MessageRequest>,
) -> Result<Json<SubmitOutcome>, ApiError> {
    let controller = lookup(&state, &id)?;
    let mode = request.mode.unwrap_or(state.config.default_mode);

    let outcome = match request.query {
        Some(query) => controller.submit_text(&request.user, mode, query).await,
        None => controller.submit_draft(&request.user, mode).await,
    };
    Ok(Json(outcome))
}

async fn clear_entries(
    State(state): State<Arc<AppState>>,
    Path(id): Path<SessionId>,
) -> Result<StatusCode, ApiError> {
    let controller = lookup(&state, &id)?;
    controller.reset().await;
    Ok(StatusCode::NO_CONTENT)
}

async fn close_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<SessionId>,
) -> Result<StatusCode, ApiError> {
    if state.close_session(&id) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err((StatusCode::NOT_FOUND, format!("Unknown session: {id}")))
    }
}
