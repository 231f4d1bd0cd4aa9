//! # HTTP Server
//!
//! Shared state and the combined router for all endpoints.

use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::{auth_routes, item_routes, order_routes, ws_routes};
use crate::auth::{Policy, SessionStore};
use crate::config::AppConfig;
use crate::orders::{MemoryOrderStore, OrderStore};
use crate::realtime::UpdateHub;

macro_rules! log_info {
    ($($arg:tt)*) => {
        eprintln!("[INFO] {}", format!($($arg)*));
    };
}

/// State shared across all handlers
pub struct AppState {
    pub config: AppConfig,
    pub policy: Policy,
    pub sessions: SessionStore,
    pub store: Arc<dyn OrderStore>,
    pub hub: UpdateHub,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        let policy = Policy::new(config.external_auth_enabled);
        Self {
            config,
            policy,
            sessions: SessionStore::new(),
            store: Arc::new(MemoryOrderStore::new()),
            hub: UpdateHub::new(),
        }
    }

    /// Absolute admin URL for an order (admin-only view data)
    pub fn admin_url(&self, order_id: &str, admin_secret: &str) -> String {
        format!(
            "{}/orders/{}/admin/{}",
            self.config.base_url, order_id, admin_secret
        )
    }

    /// Absolute join URL for an invite token
    pub fn join_url(&self, order_id: &str, token: &str) -> String {
        format!("{}/orders/{}/join/{}", self.config.base_url, order_id, token)
    }
}

/// Build the combined router with all endpoints
pub fn build_router(state: Arc<AppState>) -> Router {
    // Permissive CORS; this is a self-hosted tool behind its own origin
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(order_routes::routes())
        .merge(item_routes::routes())
        .merge(auth_routes::routes())
        .merge(ws_routes::routes())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind and serve until shutdown
pub async fn serve(config: AppConfig) -> std::io::Result<()> {
    let addr = config.socket_addr();
    let state = Arc::new(AppState::new(config));
    let app = build_router(state);

    let listener = TcpListener::bind(&addr).await?;
    log_info!("ordertogether listening on {}", addr);
    axum::serve(listener, app).await
}
