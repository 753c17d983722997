//! Hiroba CLI chat client.
//!
//! Connects the chat core from `hiroba-server` to a running server through
//! [`infrastructure::RemoteMessageLog`] and keeps the identity in a local
//! JSON file.

pub mod config;
pub mod error;
pub mod infrastructure;
pub mod ui;

// Re-export entry points
pub use config::{ClientArgs, ClientConfig};
pub use error::ClientError;
pub use ui::run as run_client;
