//! # Identity & Authorization
//!
//! This module provides identity resolution, the session context and store,
//! the pure authorization policy, and the per-order admin grant protocol.

pub mod admin;
pub mod crypto;
pub mod identity;
pub mod policy;
pub mod session;

pub use admin::{grant_admin, is_admin};
pub use identity::{Identity, IdentityKind};
pub use policy::Policy;
pub use session::{SessionContext, SessionStore};
