//! Infrastructure layer.
//!
//! Concrete implementations of the collaborator traits defined by the domain,
//! plus the wire DTOs shared by the server and the client.

pub mod dto;
pub mod identity_store;
pub mod journal;
pub mod log;

pub use identity_store::InMemoryIdentityStore;
pub use journal::{Journal, JournalError};
pub use log::InMemoryMessageLog;
