//! Bounded, totally ordered view of the most recent messages.

use std::collections::HashSet;

use super::entity::Message;

/// Default number of messages a window holds
pub const DEFAULT_WINDOW_LIMIT: usize = 200;

/// The most recent `limit` messages of the log, ascending by `(created_at, id)`.
///
/// The cap is applied on the read side only; the log keeps everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageWindow {
    messages: Vec<Message>,
}

impl MessageWindow {
    /// Build a window from messages in any order.
    ///
    /// Sorts by the total order, keeps the first occurrence of each id and
    /// retains the `limit` most recent messages.
    pub fn new(mut messages: Vec<Message>, limit: usize) -> Self {
        messages.sort();
        let mut seen = HashSet::with_capacity(messages.len());
        messages.retain(|m| seen.insert(m.id.clone()));

        let excess = messages.len().saturating_sub(limit);
        messages.drain(..excess);

        Self { messages }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn as_slice(&self) -> &[Message] {
        &self.messages
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Message> {
        self.messages.iter()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Oldest retained message
    pub fn oldest(&self) -> Option<&Message> {
        self.messages.first()
    }

    /// Newest message
    pub fn latest(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// True when `self` ends strictly before `other` in the total order,
    /// i.e. `self` is an outdated view compared to `other`.
    pub fn is_older_than(&self, other: &MessageWindow) -> bool {
        match (self.latest(), other.latest()) {
            (Some(mine), Some(theirs)) => mine < theirs,
            (None, Some(_)) => true,
            _ => false,
        }
    }

    pub fn into_vec(self) -> Vec<Message> {
        self.messages
    }
}

impl<'a> IntoIterator for &'a MessageWindow {
    type Item = &'a Message;
    type IntoIter = std::slice::Iter<'a, Message>;

    fn into_iter(self) -> Self::IntoIter {
        self.messages.iter()
    }
}
