//! Author grouping for rendering.

use super::entity::Message;

/// True when a divider goes right before `messages[index]`.
///
/// That is exactly when the previous message has a different author.
pub fn needs_divider(messages: &[Message], index: usize) -> bool {
    index > 0
        && index < messages.len()
        && messages[index - 1].author != messages[index].author
}

/// Indices before which a divider goes.
pub fn divider_positions(messages: &[Message]) -> Vec<usize> {
    (1..messages.len())
        .filter(|&i| needs_divider(messages, i))
        .collect()
}
