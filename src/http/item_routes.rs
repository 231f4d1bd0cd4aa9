//! # Item Routes
//!
//! Adding, editing, and deleting contributions. Every mutation resolves the
//! identity, checks admin and policy, passes the deadline gate, and
//! broadcasts to the order's subscribers after the store commit.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::Response;
use axum::routing::{get, put};
use axum::{Json, Router};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::order_routes::{contributor_name, load_order, ItemView};
use super::{AppState, SessionHandle};
use crate::auth::admin::is_admin;
use crate::auth::IdentityKind;
use crate::deadline::{check_write_allowed, deadline_state, DeadlineState};
use crate::errors::AppError;
use crate::orders::{ItemFields, OrderItem};

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/orders/:order_id/items", get(list_items).post(add_item))
        .route(
            "/orders/:order_id/items/:item_id",
            put(edit_item).delete(delete_item),
        )
}

#[derive(Debug, Deserialize)]
pub struct ItemRequest {
    pub person_name: String,
    pub product_name: String,
    #[serde(default)]
    pub quantity: Option<String>,
    #[serde(default)]
    pub product_sku: Option<String>,
    #[serde(default)]
    pub product_url: Option<String>,
    #[serde(default)]
    pub note: Option<String>,
}

impl ItemRequest {
    fn fields(&self) -> ItemFields {
        ItemFields {
            product_name: self.product_name.clone(),
            product_sku: blank_to_none(&self.product_sku),
            product_url: blank_to_none(&self.product_url),
            quantity: self.quantity.clone().unwrap_or_default(),
            note: blank_to_none(&self.note),
        }
    }
}

/// Empty form fields arrive as empty strings; store them as absent
fn blank_to_none(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

#[derive(Debug, Serialize)]
pub struct ItemsResponse {
    pub items: Vec<ItemView>,
    pub deadline_passed: bool,
    pub can_add: bool,
}

async fn list_items(
    State(state): State<Arc<AppState>>,
    Path(order_id): Path<String>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let session = SessionHandle::attach(&state, &headers)?;
    let order = load_order(&state, &order_id)?;
    let (identity, admin) = state
        .sessions
        .update(&session.id, |s| (s.resolve(), is_admin(s, &order)))?;

    let items = state
        .store
        .items_for_order(&order.id)?
        .into_iter()
        .filter(|item| state.policy.can_see_item(&identity, item, &order, admin))
        .map(|item| ItemView {
            can_edit: state.policy.can_edit_item(&identity, &item, &order, admin),
            item,
        })
        .collect();

    let body = ItemsResponse {
        items,
        deadline_passed: deadline_state(order.deadline, Utc::now()) == DeadlineState::Closed,
        can_add: state.policy.can_add_item(&identity, &order, admin),
    };
    Ok(session.finish(Json(body)))
}

async fn add_item(
    State(state): State<Arc<AppState>>,
    Path(order_id): Path<String>,
    headers: HeaderMap,
    Json(req): Json<ItemRequest>,
) -> Result<Response, AppError> {
    let session = SessionHandle::attach(&state, &headers)?;
    let order = load_order(&state, &order_id)?;
    let (identity, admin) = state
        .sessions
        .update(&session.id, |s| (s.resolve(), is_admin(s, &order)))?;

    if !state.policy.can_add_item(&identity, &order, admin) {
        return Err(AppError::forbidden(
            "this order is invite-only; use your invite link to participate",
        ));
    }
    check_write_allowed(order.deadline, Utc::now(), admin)?;

    let name = contributor_name(&identity, &req.person_name);

    // Anonymous users: remember the first chosen name for convenience
    if identity.kind() == IdentityKind::Anonymous
        && identity.display_name().is_empty()
        && !name.is_empty()
    {
        state
            .sessions
            .update(&session.id, |s| s.remember_display_name(&name))?;
    }

    let item = OrderItem::create(&order.id, identity.external_key(), &name, req.fields());
    state.store.insert_item(&item)?;
    state.hub.broadcast(&order.id, None);

    let body = ItemView {
        can_edit: state.policy.can_edit_item(&identity, &item, &order, admin),
        item,
    };
    Ok(session.finish((StatusCode::CREATED, Json(body))))
}

async fn edit_item(
    State(state): State<Arc<AppState>>,
    Path((order_id, item_id)): Path<(String, String)>,
    headers: HeaderMap,
    Json(req): Json<ItemRequest>,
) -> Result<Response, AppError> {
    let session = SessionHandle::attach(&state, &headers)?;
    let order = load_order(&state, &order_id)?;
    let (identity, admin) = state
        .sessions
        .update(&session.id, |s| (s.resolve(), is_admin(s, &order)))?;

    let mut item = state
        .store
        .get_item(&order_id, &item_id)?
        .ok_or(AppError::NotFound)?;

    if !state.policy.can_edit_item(&identity, &item, &order, admin) {
        return Err(AppError::forbidden("not allowed to edit this item"));
    }
    check_write_allowed(order.deadline, Utc::now(), admin)?;

    let name = contributor_name(&identity, &req.person_name);
    item.apply(&name, req.fields());
    state.store.update_item(&item)?;
    state.hub.broadcast(&order.id, None);

    let body = ItemView {
        can_edit: state.policy.can_edit_item(&identity, &item, &order, admin),
        item,
    };
    Ok(session.finish(Json(body)))
}

async fn delete_item(
    State(state): State<Arc<AppState>>,
    Path((order_id, item_id)): Path<(String, String)>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let session = SessionHandle::attach(&state, &headers)?;
    let order = load_order(&state, &order_id)?;
    let (identity, admin) = state
        .sessions
        .update(&session.id, |s| (s.resolve(), is_admin(s, &order)))?;

    let item = state
        .store
        .get_item(&order_id, &item_id)?
        .ok_or(AppError::NotFound)?;

    if !state.policy.can_edit_item(&identity, &item, &order, admin) {
        return Err(AppError::forbidden("not allowed to delete this item"));
    }
    check_write_allowed(order.deadline, Utc::now(), admin)?;

    state.store.delete_item(&order_id, &item_id)?;
    state.hub.broadcast(&order.id, None);

    Ok(session.finish(StatusCode::NO_CONTENT))
}
