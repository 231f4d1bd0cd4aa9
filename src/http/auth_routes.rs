//! # Auth Routes
//!
//! The seam to the external auth collaborator, plus logout and identity
//! introspection. The provider handshake itself is a black box; this layer
//! only consumes the `(external_key, display_name)` pair it yields.

use std::sync::Arc;

use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::Response;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use super::{AppState, SessionHandle};
use crate::errors::AppError;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/callback", post(callback))
        .route("/auth/logout", post(logout))
        .route("/auth/me", get(me))
}

#[derive(Debug, Deserialize)]
pub struct CallbackRequest {
    /// Stable subject identifier from the provider
    pub external_key: String,
    #[serde(default)]
    pub display_name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

async fn callback(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<CallbackRequest>,
) -> Result<Response, AppError> {
    if !state.config.external_auth_enabled {
        return Err(AppError::forbidden("external auth is not configured"));
    }
    if req.external_key.is_empty() {
        return Err(AppError::InvalidInput(
            "external auth yielded an empty subject".to_string(),
        ));
    }

    let session = SessionHandle::attach(&state, &headers)?;
    let name = req
        .display_name
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| req.external_key.clone());

    let identity = state.sessions.update(&session.id, |s| {
        s.become_external(&req.external_key, &name);
        s.resolve()
    })?;

    Ok(session.finish(Json(identity)))
}

async fn logout(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let session = SessionHandle::attach(&state, &headers)?;
    state.sessions.remove(&session.id)?;

    let body = MessageResponse {
        message: "logged out".to_string(),
    };
    Ok(session.finish(Json(body)))
}

async fn me(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let session = SessionHandle::attach(&state, &headers)?;
    let identity = state.sessions.update(&session.id, |s| s.resolve())?;
    Ok(session.finish(Json(identity)))
}
