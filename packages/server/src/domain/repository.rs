//! Collaborator interfaces defined by the domain.
//!
//! The use cases depend on these traits only; infrastructure provides the
//! implementations (dependency inversion).

use std::fmt;

use async_trait::async_trait;
use tokio::sync::mpsc::UnboundedSender;

use super::{
    entity::NewMessage,
    error::{IdentityStoreError, MessageLogError},
    value_object::MessageId,
    window::MessageWindow,
};

/// Handle of a standing log subscription
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionHandle(u64);

impl SubscriptionHandle {
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for SubscriptionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

/// Append-only, totally ordered message log.
///
/// The log is the single ordering authority: it assigns ids and timestamps
/// from its own clock.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessageLog: Send + Sync {
    /// Append a message and return its log-assigned id.
    async fn append(&self, message: NewMessage) -> Result<MessageId, MessageLogError>;

    /// Register `sink` for windows of the `limit` most recent messages.
    ///
    /// The current window is sent right away, then again after every change.
    async fn subscribe_ordered(
        &self,
        limit: usize,
        sink: UnboundedSender<MessageWindow>,
    ) -> Result<SubscriptionHandle, MessageLogError>;

    /// Stop deliveries for `handle`. Unknown handles are ignored.
    async fn unsubscribe(&self, handle: SubscriptionHandle);
}

/// Local, per-device key-value slot for the identity.
#[cfg_attr(test, mockall::automock)]
pub trait IdentityStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, IdentityStoreError>;

    fn set(&self, key: &str, value: &str) -> Result<(), IdentityStoreError>;
}
