//! # Order Data Model
//!
//! Orders, their line items, and invite tokens. All timestamps are UTC.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::crypto::generate_token;
use crate::auth::identity::Identity;

/// Parameters for creating an order
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub vendor_name: String,
    pub vendor_url: String,
    pub payment_url: Option<String>,
    pub deadline: DateTime<Utc>,
    pub invite_only: bool,
    pub allow_external_without_invite: bool,
    pub privacy_mode: bool,
}

/// The shared coordination unit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: String,

    /// Capability granting full rights over this order; never shown to
    /// non-admins and never regenerated
    #[serde(skip_serializing)]
    pub admin_secret: String,

    pub vendor_name: String,
    pub vendor_url: String,

    /// Opaque metadata, never interpreted
    pub payment_url: Option<String>,

    pub deadline: DateTime<Utc>,

    pub creator_name: String,

    /// External key of the creator, set only when the order was created by
    /// an external identity. Anchors permanent admin recognition, so it is
    /// never serialized; responses carry `is_admin` instead.
    #[serde(skip_serializing)]
    pub creator_external_key: Option<String>,

    pub invite_only: bool,

    /// Let external identities participate without an invite link. Only
    /// meaningful while `invite_only`.
    pub allow_external_without_invite: bool,

    /// Each participant only sees their own items. Only meaningful while
    /// `invite_only`.
    pub privacy_mode: bool,

    pub created_at: DateTime<Utc>,
}

impl Order {
    /// Create an order, enforcing the flag invariant:
    /// `allow_external_without_invite` and `privacy_mode` are force-cleared
    /// unless `invite_only` is set.
    pub fn create(params: NewOrder, creator: &Identity) -> Self {
        let invite_only = params.invite_only;
        let creator_name = if creator.display_name().is_empty() {
            "Admin".to_string()
        } else {
            creator.display_name().to_string()
        };

        Self {
            id: Uuid::new_v4().to_string(),
            admin_secret: generate_token(),
            vendor_name: params.vendor_name,
            vendor_url: params.vendor_url,
            payment_url: params.payment_url,
            deadline: params.deadline,
            creator_name,
            creator_external_key: match creator {
                Identity::External { key, .. } => Some(key.clone()),
                _ => None,
            },
            invite_only,
            allow_external_without_invite: params.allow_external_without_invite && invite_only,
            privacy_mode: params.privacy_mode && invite_only,
            created_at: Utc::now(),
        }
    }

    /// Toggle external participation; force-cleared while not invite-only
    pub fn set_allow_external(&mut self, allow: bool) {
        self.allow_external_without_invite = allow && self.invite_only;
    }
}

/// Fields shared by item creation and edits
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemFields {
    pub product_name: String,
    pub product_sku: Option<String>,
    pub product_url: Option<String>,
    /// Free-form string; not guaranteed numeric
    pub quantity: String,
    pub note: Option<String>,
}

/// One contribution to an order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: String,
    pub order_id: String,

    /// The authorization anchor for edit/delete: copied from the identity
    /// that created the item. For invite contributors this is the invite
    /// token itself, so it is never serialized; responses carry `can_edit`
    /// instead.
    #[serde(skip_serializing)]
    pub contributor_key: String,
    pub contributor_name: String,

    pub product_name: String,
    pub product_sku: Option<String>,
    pub product_url: Option<String>,
    pub quantity: String,
    pub note: Option<String>,

    pub created_at: DateTime<Utc>,
}

impl OrderItem {
    pub fn create(
        order_id: &str,
        contributor_key: &str,
        contributor_name: &str,
        fields: ItemFields,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            order_id: order_id.to_string(),
            contributor_key: contributor_key.to_string(),
            contributor_name: contributor_name.to_string(),
            product_name: fields.product_name,
            product_sku: fields.product_sku,
            product_url: fields.product_url,
            quantity: normalize_quantity(fields.quantity),
            note: fields.note,
            created_at: Utc::now(),
        }
    }

    /// Apply an edit, keeping id, ownership, and creation time
    pub fn apply(&mut self, contributor_name: &str, fields: ItemFields) {
        self.contributor_name = contributor_name.to_string();
        self.product_name = fields.product_name;
        self.product_sku = fields.product_sku;
        self.product_url = fields.product_url;
        self.quantity = normalize_quantity(fields.quantity);
        self.note = fields.note;
    }
}

/// Empty quantities default to "1"; everything else passes through opaque
fn normalize_quantity(quantity: String) -> String {
    if quantity.trim().is_empty() {
        "1".to_string()
    } else {
        quantity
    }
}

/// A durable capability granting named participation in one order.
///
/// Never expires and is not single-use: multiple sessions may redeem the
/// same token, each becoming the same named participant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InviteToken {
    /// Opaque, unguessable; doubles as the primary key
    pub token: String,
    pub order_id: String,
    /// Fixed at issuance
    pub display_name: String,
    pub created_at: DateTime<Utc>,
}

impl InviteToken {
    pub fn issue(order_id: &str, display_name: &str) -> Self {
        Self {
            token: generate_token(),
            order_id: order_id.to_string(),
            display_name: display_name.to_string(),
            created_at: Utc::now(),
        }
    }
}
