//! # HTTP Surface
//!
//! axum routers in front of the core. Handlers resolve the caller's session
//! from the `ot_session` cookie, run identity resolution, the admin check,
//! the policy check, and the deadline gate in that order, and notify the
//! live-update hub after every committed mutation.

pub mod auth_routes;
pub mod item_routes;
pub mod order_routes;
pub mod server;
pub mod ws_routes;

pub use server::{serve, AppState};

use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::errors::{AppError, AppResult};

/// Session cookie name
pub const SESSION_COOKIE: &str = "ot_session";

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    code: u16,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let code = self.status_code();
        let status =
            StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = ErrorBody {
            error: self.to_string(),
            code,
        };
        (status, Json(body)).into_response()
    }
}

/// Extract the session cookie value from request headers
fn cookie_value(headers: &HeaderMap) -> Option<String> {
    let raw = headers.get(header::COOKIE)?.to_str().ok()?;
    raw.split(';')
        .map(str::trim)
        .find_map(|pair| {
            pair.strip_prefix(SESSION_COOKIE)
                .and_then(|rest| rest.strip_prefix('='))
                .map(str::to_string)
        })
}

/// The caller's session for one request. Created on first contact; `fresh`
/// sessions get a Set-Cookie header on the way out.
pub struct SessionHandle {
    pub id: String,
    pub fresh: bool,
}

impl SessionHandle {
    /// Resolve the session id from the cookie, creating a session if the
    /// cookie is missing or stale
    pub fn attach(state: &AppState, headers: &HeaderMap) -> AppResult<Self> {
        if let Some(id) = cookie_value(headers) {
            if state.sessions.contains(&id) {
                return Ok(Self { id, fresh: false });
            }
        }
        let id = state.sessions.create()?;
        Ok(Self { id, fresh: true })
    }

    /// Finish a response, appending the session cookie when newly created
    pub fn finish<R: IntoResponse>(&self, response: R) -> Response {
        let mut response = response.into_response();
        if self.fresh {
            let cookie = format!(
                "{}={}; Path=/; HttpOnly; SameSite=Lax",
                SESSION_COOKIE, self.id
            );
            if let Ok(value) = HeaderValue::from_str(&cookie) {
                response.headers_mut().append(header::SET_COOKIE, value);
            }
        }
        response
    }
}
