//! # Order Routes
//!
//! Creation, viewing, the admin grant URL, invite tokens, deadline
//! extension, settings, and CSV export.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::Response;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::{AppState, SessionHandle};
use crate::auth::admin::{grant_admin, is_admin, INVALID_ADMIN_LINK};
use crate::auth::{Identity, IdentityKind};
use crate::deadline::{deadline_state, format_local, parse_local_deadline, wire_timestamp, DeadlineState};
use crate::errors::{AppError, AppResult};
use crate::export::{export_csv, export_filename, ExportGroup};
use crate::orders::{InviteToken, NewOrder, Order, OrderItem};

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/orders", post(create_order).get(list_orders))
        .route("/orders/:order_id", get(view_order))
        .route("/orders/:order_id/admin/:admin_secret", get(enter_admin))
        .route("/orders/:order_id/deadline", post(extend_deadline))
        .route("/orders/:order_id/settings", post(update_settings))
        .route("/orders/:order_id/tokens", post(create_token))
        .route("/orders/:order_id/join/:token", get(join_via_token))
        .route("/orders/:order_id/export", get(export_order))
}

/// Fetch an order or fail with `NotFound`
pub(crate) fn load_order(state: &AppState, order_id: &str) -> AppResult<Order> {
    state.store.get_order(order_id)?.ok_or(AppError::NotFound)
}

// ==================
// Request/Response Types
// ==================

#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    pub vendor_name: String,
    pub vendor_url: String,
    #[serde(default)]
    pub payment_url: Option<String>,
    /// Naive local time, e.g. "2026-06-01T18:30"
    pub deadline: String,
    #[serde(default)]
    pub invite_only: bool,
    #[serde(default)]
    pub allow_external_without_invite: bool,
    #[serde(default)]
    pub privacy_mode: bool,
}

#[derive(Debug, Serialize)]
pub struct CreateOrderResponse {
    pub id: String,
    pub admin_url: String,
}

/// One item plus the caller's edit right on it
#[derive(Debug, Serialize)]
pub struct ItemView {
    #[serde(flatten)]
    pub item: OrderItem,
    pub can_edit: bool,
}

#[derive(Debug, Serialize)]
pub struct OrderView {
    #[serde(flatten)]
    pub order: Order,
    pub deadline_local: String,
    pub deadline_passed: bool,
    pub can_add: bool,
    pub is_admin: bool,
    /// Present only for admins
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admin_url: Option<String>,
    pub items: Vec<ItemView>,
}

#[derive(Debug, Serialize)]
pub struct OrderListRow {
    pub id: String,
    pub vendor_name: String,
    pub deadline: String,
    pub deadline_passed: bool,
    pub item_count: usize,
    pub admin_url: String,
}

#[derive(Debug, Deserialize)]
pub struct DeadlineRequest {
    pub new_deadline: String,
}

#[derive(Debug, Serialize)]
pub struct DeadlineResponse {
    pub deadline: String,
    pub deadline_local: String,
}

#[derive(Debug, Deserialize)]
pub struct SettingsRequest {
    pub allow_external_without_invite: bool,
}

#[derive(Debug, Serialize)]
pub struct SettingsResponse {
    pub invite_only: bool,
    pub allow_external_without_invite: bool,
    pub privacy_mode: bool,
}

#[derive(Debug, Deserialize)]
pub struct CreateTokenRequest {
    pub display_name: String,
}

#[derive(Debug, Serialize)]
pub struct CreateTokenResponse {
    pub display_name: String,
    pub token: String,
    pub join_url: String,
}

#[derive(Debug, Serialize)]
pub struct JoinResponse {
    pub order_id: String,
    pub display_name: String,
}

#[derive(Debug, Serialize)]
pub struct GrantResponse {
    pub order_id: String,
    pub granted: bool,
}

#[derive(Debug, Deserialize)]
pub struct ExportQuery {
    #[serde(default)]
    pub group: Option<String>,
}

/// Build the shared view of an order for the resolved caller
pub(crate) fn order_view(
    state: &AppState,
    order: &Order,
    identity: &Identity,
    admin: bool,
) -> AppResult<OrderView> {
    let items = state.store.items_for_order(&order.id)?;
    let items = items
        .into_iter()
        .filter(|item| state.policy.can_see_item(identity, item, order, admin))
        .map(|item| ItemView {
            can_edit: state.policy.can_edit_item(identity, &item, order, admin),
            item,
        })
        .collect();

    Ok(OrderView {
        deadline_local: format_local(order.deadline, state.config.timezone_offset),
        deadline_passed: deadline_state(order.deadline, Utc::now()) == DeadlineState::Closed,
        can_add: state.policy.can_add_item(identity, order, admin),
        is_admin: admin,
        admin_url: admin.then(|| state.admin_url(&order.id, &order.admin_secret)),
        items,
        order: order.clone(),
    })
}

// ==================
// Handlers
// ==================

async fn create_order(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<CreateOrderRequest>,
) -> Result<Response, AppError> {
    let session = SessionHandle::attach(&state, &headers)?;
    let identity = state.sessions.update(&session.id, |s| s.resolve())?;

    let deadline = parse_local_deadline(&req.deadline, state.config.timezone_offset)?;

    let order = Order::create(
        NewOrder {
            vendor_name: req.vendor_name,
            vendor_url: req.vendor_url,
            payment_url: req.payment_url,
            deadline,
            invite_only: req.invite_only,
            allow_external_without_invite: req.allow_external_without_invite,
            privacy_mode: req.privacy_mode,
        },
        &identity,
    );
    state.store.insert_order(&order)?;

    // The creator's session gains admin rights immediately; external
    // creators are additionally recognised by key on any future session
    state
        .sessions
        .update(&session.id, |s| s.grant_admin(&order.id))?;

    let body = CreateOrderResponse {
        admin_url: state.admin_url(&order.id, &order.admin_secret),
        id: order.id,
    };
    Ok(session.finish((StatusCode::CREATED, Json(body))))
}

async fn list_orders(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let session = SessionHandle::attach(&state, &headers)?;
    let identity = state.sessions.update(&session.id, |s| s.resolve())?;

    let key = match &identity {
        Identity::External { key, .. } => key.clone(),
        _ => {
            return Err(AppError::forbidden(
                "login required to view your orders",
            ))
        }
    };

    let now = Utc::now();
    let mut rows = Vec::new();
    for order in state.store.orders_by_creator(&key)? {
        let item_count = state.store.items_for_order(&order.id)?.len();
        rows.push(OrderListRow {
            deadline: wire_timestamp(order.deadline),
            deadline_passed: deadline_state(order.deadline, now) == DeadlineState::Closed,
            item_count,
            admin_url: state.admin_url(&order.id, &order.admin_secret),
            id: order.id,
            vendor_name: order.vendor_name,
        });
    }

    Ok(session.finish(Json(rows)))
}

async fn view_order(
    State(state): State<Arc<AppState>>,
    Path(order_id): Path<String>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let session = SessionHandle::attach(&state, &headers)?;
    let order = load_order(&state, &order_id)?;
    let (identity, admin) = state
        .sessions
        .update(&session.id, |s| (s.resolve(), is_admin(s, &order)))?;

    let view = order_view(&state, &order, &identity, admin)?;
    Ok(session.finish(Json(view)))
}

async fn enter_admin(
    State(state): State<Arc<AppState>>,
    Path((order_id, admin_secret)): Path<(String, String)>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let session = SessionHandle::attach(&state, &headers)?;

    // An unknown order uses the same failure shape as a wrong secret
    let order = state
        .store
        .get_order(&order_id)?
        .ok_or_else(|| AppError::forbidden(INVALID_ADMIN_LINK))?;

    state
        .sessions
        .update(&session.id, |s| grant_admin(s, &order, &admin_secret))??;

    let body = GrantResponse {
        order_id: order.id,
        granted: true,
    };
    Ok(session.finish(Json(body)))
}

async fn extend_deadline(
    State(state): State<Arc<AppState>>,
    Path(order_id): Path<String>,
    headers: HeaderMap,
    Json(req): Json<DeadlineRequest>,
) -> Result<Response, AppError> {
    let session = SessionHandle::attach(&state, &headers)?;
    let mut order = load_order(&state, &order_id)?;

    let admin = state.sessions.update(&session.id, |s| is_admin(s, &order))?;
    if !admin {
        return Err(AppError::forbidden("only the admin can change the deadline"));
    }

    // Admin-only and independent of the current gate state: extending an
    // already-closed order reopens it
    let deadline = parse_local_deadline(&req.new_deadline, state.config.timezone_offset)?;
    order.deadline = deadline;
    state.store.update_order(&order)?;

    // Committed; push the new deadline so countdowns update without a refetch
    state.hub.broadcast(&order.id, Some(wire_timestamp(deadline)));

    let body = DeadlineResponse {
        deadline: wire_timestamp(deadline),
        deadline_local: format_local(deadline, state.config.timezone_offset),
    };
    Ok(session.finish(Json(body)))
}

async fn update_settings(
    State(state): State<Arc<AppState>>,
    Path(order_id): Path<String>,
    headers: HeaderMap,
    Json(req): Json<SettingsRequest>,
) -> Result<Response, AppError> {
    let session = SessionHandle::attach(&state, &headers)?;
    let mut order = load_order(&state, &order_id)?;

    let admin = state.sessions.update(&session.id, |s| is_admin(s, &order))?;
    if !admin {
        return Err(AppError::forbidden("only the admin can change settings"));
    }

    order.set_allow_external(req.allow_external_without_invite);
    state.store.update_order(&order)?;

    let body = SettingsResponse {
        invite_only: order.invite_only,
        allow_external_without_invite: order.allow_external_without_invite,
        privacy_mode: order.privacy_mode,
    };
    Ok(session.finish(Json(body)))
}

async fn create_token(
    State(state): State<Arc<AppState>>,
    Path(order_id): Path<String>,
    headers: HeaderMap,
    Json(req): Json<CreateTokenRequest>,
) -> Result<Response, AppError> {
    let session = SessionHandle::attach(&state, &headers)?;
    let order = load_order(&state, &order_id)?;

    let admin = state.sessions.update(&session.id, |s| is_admin(s, &order))?;
    if !admin {
        return Err(AppError::forbidden("only the admin can generate tokens"));
    }

    let token = InviteToken::issue(&order.id, &req.display_name);
    state.store.insert_token(&token)?;

    let body = CreateTokenResponse {
        join_url: state.join_url(&order.id, &token.token),
        display_name: token.display_name,
        token: token.token,
    };
    Ok(session.finish(Json(body)))
}

async fn join_via_token(
    State(state): State<Arc<AppState>>,
    Path((order_id, token)): Path<(String, String)>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let session = SessionHandle::attach(&state, &headers)?;

    let invite = state
        .store
        .get_token(&order_id, &token)?
        .ok_or(AppError::NotFound)?;

    state.sessions.update(&session.id, |s| {
        s.become_invite(&invite.token, &invite.display_name)
    })?;

    let body = JoinResponse {
        order_id: invite.order_id,
        display_name: invite.display_name,
    };
    Ok(session.finish(Json(body)))
}

async fn export_order(
    State(state): State<Arc<AppState>>,
    Path(order_id): Path<String>,
    Query(query): Query<ExportQuery>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let session = SessionHandle::attach(&state, &headers)?;
    let order = load_order(&state, &order_id)?;
    let (identity, admin) = state
        .sessions
        .update(&session.id, |s| (s.resolve(), is_admin(s, &order)))?;

    let group = ExportGroup::parse(query.group.as_deref().unwrap_or("person"));

    // Privacy filter applies to exports as well
    let items: Vec<_> = state
        .store
        .items_for_order(&order.id)?
        .into_iter()
        .filter(|item| state.policy.can_see_item(&identity, item, &order, admin))
        .collect();

    let csv = export_csv(&items, group);
    let disposition = format!(
        "attachment; filename=\"{}\"",
        export_filename(&order, group)
    );

    Ok(session.finish((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        csv,
    )))
}

// Shared with the item routes: the forced-name rule for invite identities
pub(crate) fn contributor_name(identity: &Identity, requested: &str) -> String {
    match identity.kind() {
        IdentityKind::Invite => identity.display_name().to_string(),
        _ => requested.to_string(),
    }
}
