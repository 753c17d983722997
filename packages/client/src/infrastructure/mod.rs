//! Infrastructure layer of the client.

pub mod identity_store;
pub mod remote_log;

pub use identity_store::FileIdentityStore;
pub use remote_log::{Backoff, RemoteMessageLog};
