//! # Identity Model
//!
//! The resolved caller of a request. A session holds exactly one identity at
//! a time; assigning a new kind replaces the previous one wholesale, so the
//! variants never mix.

use serde::{Deserialize, Serialize};

/// Identity provenance tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentityKind {
    Anonymous,
    Invite,
    External,
}

/// One caller, one of three provenances
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Identity {
    /// First-contact visitor. The key is a freshly generated random
    /// identifier, assigned once and stable for the life of the session.
    Anonymous { key: String, display_name: String },

    /// Holder of an invite token. The token doubles as the stable key and
    /// the display name is fixed at issuance.
    Invite { token: String, display_name: String },

    /// Asserted by the external auth provider: a stable subject key plus a
    /// display name.
    External { key: String, display_name: String },
}

impl Identity {
    /// Which of the three provenances this identity has
    pub fn kind(&self) -> IdentityKind {
        match self {
            Identity::Anonymous { .. } => IdentityKind::Anonymous,
            Identity::Invite { .. } => IdentityKind::Invite,
            Identity::External { .. } => IdentityKind::External,
        }
    }

    /// The stable key that anchors item ownership and admin recognition.
    /// For invite identities the token itself is the key.
    pub fn external_key(&self) -> &str {
        match self {
            Identity::Anonymous { key, .. } => key,
            Identity::Invite { token, .. } => token,
            Identity::External { key, .. } => key,
        }
    }

    /// The name shown next to contributions
    pub fn display_name(&self) -> &str {
        match self {
            Identity::Anonymous { display_name, .. }
            | Identity::Invite { display_name, .. }
            | Identity::External { display_name, .. } => display_name,
        }
    }

    /// Update the display name. Invite names are fixed at issuance, so this
    /// is a no-op for invite identities.
    pub fn set_display_name(&mut self, name: &str) {
        match self {
            Identity::Anonymous { display_name, .. }
            | Identity::External { display_name, .. } => {
                *display_name = name.to_string();
            }
            Identity::Invite { .. } => {}
        }
    }
}
