//! Value Objects for domain models.
//!
//! Value Objects are immutable objects that represent values in the domain.
//! They are compared by their value, not by identity.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::error::ValueObjectError;

/// Maximum length of a display name, in characters
pub const DISPLAY_NAME_MAX_CHARS: usize = 20;

/// Maximum length of a message text, in characters
pub const MESSAGE_TEXT_MAX_CHARS: usize = 500;

/// Display name value object.
///
/// A client-chosen or generated name. It is neither unique nor a credential.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DisplayName(String);

impl DisplayName {
    /// Create a new DisplayName.
    ///
    /// # Arguments
    ///
    /// * `name` - The display name, 1 to 20 printable characters
    ///
    /// # Returns
    ///
    /// A Result containing the DisplayName or an error if validation fails
    pub fn new(name: String) -> Result<Self, ValueObjectError> {
        if name.is_empty() {
            return Err(ValueObjectError::DisplayNameEmpty);
        }
        let len = name.chars().count();
        if len > DISPLAY_NAME_MAX_CHARS {
            return Err(ValueObjectError::DisplayNameTooLong {
                max: DISPLAY_NAME_MAX_CHARS,
                actual: len,
            });
        }
        if name.chars().any(char::is_control) {
            return Err(ValueObjectError::DisplayNameNotPrintable);
        }
        Ok(Self(name))
    }

    /// Get the inner string value.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Convert to owned String.
    pub fn into_string(self) -> String {
        self.0
    }
}

impl TryFrom<String> for DisplayName {
    type Error = ValueObjectError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl fmt::Display for DisplayName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Message text value object.
///
/// Always stored trimmed; 1 to 500 characters after trimming.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageText(String);

impl MessageText {
    /// Create a new MessageText from raw input, trimming surrounding whitespace.
    pub fn new(text: &str) -> Result<Self, ValueObjectError> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(ValueObjectError::MessageTextEmpty);
        }
        let len = trimmed.chars().count();
        if len > MESSAGE_TEXT_MAX_CHARS {
            return Err(ValueObjectError::MessageTextTooLong {
                max: MESSAGE_TEXT_MAX_CHARS,
                actual: len,
            });
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Get the inner string value.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Convert to owned String.
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for MessageText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Message identifier value object.
///
/// Opaque, assigned by the Message Log. Ordered only to act as the
/// tie-break key of the total order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MessageId(String);

impl MessageId {
    pub fn new(id: String) -> Result<Self, ValueObjectError> {
        if id.is_empty() {
            return Err(ValueObjectError::MessageIdEmpty);
        }
        Ok(Self(id))
    }

    /// Get the inner string value.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Convert to owned String.
    pub fn into_string(self) -> String {
        self.0
    }
}

impl TryFrom<String> for MessageId {
    type Error = ValueObjectError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Timestamp value object.
///
/// Represents a Unix timestamp in milliseconds, assigned by the log's clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Timestamp(i64);

impl Timestamp {
    /// Create a new Timestamp.
    ///
    /// # Arguments
    ///
    /// * `value` - Unix timestamp in milliseconds
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    /// Get the inner i64 value.
    pub fn value(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
