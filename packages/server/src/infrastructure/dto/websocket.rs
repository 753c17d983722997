//! WebSocket message DTOs.

use serde::{Deserialize, Serialize};

use super::http::MessageDto;
use crate::domain::{Message, MessageWindow};

/// Message type enum
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MessageType {
    Window,
}

/// Full window pushed to a subscriber on connect and on every change
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindowMessage {
    pub r#type: MessageType,
    pub messages: Vec<MessageDto>,
}

impl From<&MessageWindow> for WindowMessage {
    fn from(window: &MessageWindow) -> Self {
        Self {
            r#type: MessageType::Window,
            messages: window.iter().map(MessageDto::from).collect(),
        }
    }
}

impl WindowMessage {
    /// Convert into a domain window, skipping entries that fail validation.
    pub fn into_window(self, limit: usize) -> MessageWindow {
        let messages = self
            .messages
            .into_iter()
            .filter_map(|dto| match Message::try_from(dto) {
                Ok(message) => Some(message),
                Err(e) => {
                    tracing::warn!("Dropping invalid message from window: {}", e);
                    None
                }
            })
            .collect();
        MessageWindow::new(messages, limit)
    }
}
