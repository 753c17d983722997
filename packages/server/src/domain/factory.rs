//! Domain factories for creating domain entities and value objects.

use super::{MessageId, error::ValueObjectError};

/// Factory for generating MessageId instances.
///
/// This factory encapsulates the logic for generating new message identifiers,
/// separating the generation concern from the validation logic in MessageId.
pub struct MessageIdFactory;

impl MessageIdFactory {
    /// Generate a new MessageId with a random UUID v4.
    ///
    /// # Errors
    ///
    /// This method should not fail in practice, but returns Result for consistency
    /// with the domain error handling pattern.
    pub fn generate() -> Result<MessageId, ValueObjectError> {
        MessageId::new(uuid::Uuid::new_v4().to_string())
    }
}
