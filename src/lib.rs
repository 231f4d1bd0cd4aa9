//! ordertogether - self-hostable group order coordination
//!
//! An admin opens a shared order, participants add line items under one of
//! three identity modes, and every open page sees additions live.

pub mod auth;
pub mod cli;
pub mod config;
pub mod deadline;
pub mod errors;
pub mod export;
pub mod http;
pub mod orders;
pub mod realtime;
