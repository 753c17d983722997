//! Hiroba chat core and Message Log server.
//!
//! A public chat room without accounts: clients pick a display name and
//! exchange short messages that every connected client sees in the same
//! order. This crate provides the domain model, the use cases consumed by
//! presentation layers, the authoritative in-memory Message Log and an
//! HTTP/WebSocket server exposing it.

pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod ui;
pub mod usecase;

// Re-export entry points
pub use config::{ServerArgs, ServerConfig};
pub use ui::run as run_server;
