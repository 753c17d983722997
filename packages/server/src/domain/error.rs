//! Domain layer error definitions.

use thiserror::Error;

/// Errors related to Value Objects validation
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValueObjectError {
    /// DisplayName validation error
    #[error("DisplayName cannot be empty")]
    DisplayNameEmpty,

    /// DisplayName too long error
    #[error("DisplayName cannot exceed {max} characters (got {actual})")]
    DisplayNameTooLong { max: usize, actual: usize },

    /// DisplayName contains a control character
    #[error("DisplayName must contain printable characters only")]
    DisplayNameNotPrintable,

    /// MessageText validation error
    #[error("MessageText cannot be empty")]
    MessageTextEmpty,

    /// MessageText too long error
    #[error("MessageText cannot exceed {max} characters (got {actual})")]
    MessageTextTooLong { max: usize, actual: usize },

    /// MessageId validation error
    #[error("MessageId cannot be empty")]
    MessageIdEmpty,
}

/// Errors reported by a Message Log collaborator
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MessageLogError {
    /// The log cannot be reached (connectivity loss, journal failure, ...)
    #[error("message log unavailable: {0}")]
    Unavailable(String),

    /// The log refused the message as invalid
    #[error("message rejected by the log: {0}")]
    Rejected(String),
}

/// Errors reported by a local identity store
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IdentityStoreError {
    /// Storage is disabled or broken
    #[error("identity store unavailable: {0}")]
    Unavailable(String),
}
