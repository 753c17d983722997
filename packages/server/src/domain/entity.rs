//! Core domain models for the chat room.

use std::cmp::Ordering;

use super::value_object::{DisplayName, MessageId, MessageText, Timestamp};

/// A message as submitted by a client, before the log stamps it.
///
/// It has no id and no timestamp, so it is never part of an ordered window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMessage {
    /// Author captured at send time
    pub author: DisplayName,
    /// Trimmed message text
    pub text: MessageText,
}

impl NewMessage {
    pub fn new(author: DisplayName, text: MessageText) -> Self {
        Self { author, text }
    }
}

/// A message stamped by the Message Log.
///
/// Immutable once created. Ordered by `(created_at, id)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Log-assigned identifier
    pub id: MessageId,
    /// Author display name
    pub author: DisplayName,
    /// Message text
    pub text: MessageText,
    /// Server-assigned timestamp
    pub created_at: Timestamp,
}

impl Message {
    /// Create a new stamped message
    pub fn new(
        id: MessageId,
        author: DisplayName,
        text: MessageText,
        created_at: Timestamp,
    ) -> Self {
        Self {
            id,
            author,
            text,
            created_at,
        }
    }

    /// Stamp a submitted message with the log-assigned id and timestamp
    pub fn stamp(message: NewMessage, id: MessageId, created_at: Timestamp) -> Self {
        Self::new(id, message.author, message.text, created_at)
    }

    /// Key of the total order
    pub fn order_key(&self) -> (Timestamp, &MessageId) {
        (self.created_at, &self.id)
    }
}

impl PartialOrd for Message {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Message {
    fn cmp(&self, other: &Self) -> Ordering {
        self.order_key().cmp(&other.order_key())
    }
}
