//! # Orders
//!
//! The data model for orders, items, and invite tokens, together with the
//! storage seam the HTTP layer talks to.

pub mod model;
pub mod store;

pub use model::{InviteToken, ItemFields, NewOrder, Order, OrderItem};
pub use store::{MemoryOrderStore, OrderStore};
