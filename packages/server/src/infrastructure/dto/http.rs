//! HTTP API DTOs.

use serde::{Deserialize, Serialize};

use crate::domain::{DisplayName, Message, MessageId, MessageText, Timestamp, ValueObjectError};

/// A stamped message on the wire
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageDto {
    pub id: String,
    pub author: String,
    pub text: String,
    /// Unix timestamp (milliseconds since epoch), assigned by the server
    pub created_at: i64,
}

impl From<&Message> for MessageDto {
    fn from(message: &Message) -> Self {
        Self {
            id: message.id.as_str().to_string(),
            author: message.author.as_str().to_string(),
            text: message.text.as_str().to_string(),
            created_at: message.created_at.value(),
        }
    }
}

impl TryFrom<MessageDto> for Message {
    type Error = ValueObjectError;

    fn try_from(dto: MessageDto) -> Result<Self, Self::Error> {
        Ok(Message::new(
            MessageId::new(dto.id)?,
            DisplayName::new(dto.author)?,
            MessageText::new(&dto.text)?,
            Timestamp::new(dto.created_at),
        ))
    }
}

/// Query parameters of `GET /api/messages` and `GET /ws`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MessagesQuery {
    pub limit: Option<usize>,
}

/// Response of `GET /api/messages`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessagesResponse {
    pub messages: Vec<MessageDto>,
}

/// Body of `POST /api/messages`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppendMessageRequest {
    pub author: String,
    pub text: String,
}

/// Response of `POST /api/messages`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppendMessageResponse {
    pub id: String,
}

/// Error body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
