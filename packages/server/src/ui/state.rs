//! Server state.

use std::sync::Arc;

use tokio::sync::watch;

use crate::domain::MessageLog;

/// Shared application state
pub struct AppState {
    /// Message Log（データアクセス層の抽象化）
    pub log: Arc<dyn MessageLog>,
    /// Maximum window size a client may request
    pub window_limit: usize,
    /// `true` once the server is shutting down
    closing: watch::Sender<bool>,
}

impl AppState {
    pub fn new(log: Arc<dyn MessageLog>, window_limit: usize) -> Self {
        Self {
            log,
            window_limit,
            closing: watch::Sender::new(false),
        }
    }

    /// Ask every open WebSocket feed to close
    pub fn close_feeds(&self) {
        self.closing.send_replace(true);
    }

    /// Resolves once [`close_feeds`](Self::close_feeds) has been called
    pub async fn feeds_closed(&self) {
        let mut closing = self.closing.subscribe();
        // the sender lives as long as `self`, so `wait_for` cannot fail here
        let _ = closing.wait_for(|closing| *closing).await;
    }

    /// Requested window size, defaulting to and capped at `window_limit`
    pub fn clamp_limit(&self, requested: Option<usize>) -> usize {
        requested
            .unwrap_or(self.window_limit)
            .clamp(1, self.window_limit)
    }
}
