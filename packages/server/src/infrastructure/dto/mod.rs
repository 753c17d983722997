//! Data transfer objects for the HTTP API, the WebSocket feed and the journal.

pub mod http;
pub mod websocket;

pub use http::{
    AppendMessageRequest, AppendMessageResponse, ErrorResponse, MessageDto, MessagesQuery,
    MessagesResponse,
};
pub use websocket::{MessageType, WindowMessage};
