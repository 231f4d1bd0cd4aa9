//! # Live Updates
//!
//! Per-order fan-out of "something changed" notifications to open WebSocket
//! connections. Delivery is best-effort: failures prune the dead connection
//! and are never visible to the caller.

pub mod hub;

pub use hub::{ConnectionHandle, UpdateHub, UpdateNotice};
