//! # Authorization Policy
//!
//! Pure decision functions over `(identity, order, is_admin)`. No side
//! effects, no I/O, no clock: everything needed for a decision is in the
//! arguments, which is what keeps these independently unit-testable.
//!
//! Tie-break order is fixed: admin short-circuits every check first.
//! Decisions are per item, not per order; privacy and edit rights are
//! attribute-level.

use super::identity::Identity;
use crate::orders::{Order, OrderItem};

/// Deployment-level authorization configuration
#[derive(Debug, Clone, Copy)]
pub struct Policy {
    /// Whether an external auth provider is configured. Without one, public
    /// orders run in fully-open mode where anyone may edit anything.
    pub external_auth_enabled: bool,
}

impl Policy {
    pub fn new(external_auth_enabled: bool) -> Self {
        Self {
            external_auth_enabled,
        }
    }

    /// May this identity add items to the order?
    pub fn can_add_item(&self, identity: &Identity, order: &Order, is_admin: bool) -> bool {
        if is_admin {
            return true;
        }
        if order.invite_only {
            return match identity {
                // Invited participants can always contribute
                Identity::Invite { .. } => true,
                // External identities only when the admin has enabled it
                Identity::External { .. } => order.allow_external_without_invite,
                Identity::Anonymous { .. } => false,
            };
        }
        true
    }

    /// May this identity edit or delete the given item?
    pub fn can_edit_item(
        &self,
        identity: &Identity,
        item: &OrderItem,
        order: &Order,
        is_admin: bool,
    ) -> bool {
        if is_admin {
            return true;
        }
        if !self.external_auth_enabled && !order.invite_only {
            // Fully open mode: an ungated public order board
            return true;
        }
        identity.external_key() == item.contributor_key
    }

    /// May this identity see the given item?
    pub fn can_see_item(
        &self,
        identity: &Identity,
        item: &OrderItem,
        order: &Order,
        is_admin: bool,
    ) -> bool {
        if !order.privacy_mode {
            return true;
        }
        if is_admin {
            return true;
        }
        identity.external_key() == item.contributor_key
    }
}
