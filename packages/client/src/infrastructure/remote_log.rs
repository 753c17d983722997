//! Message Log reached over the Hiroba server API.
//!
//! Appends go through `POST /api/messages`; a 4xx answer means the message
//! was rejected, anything else that fails means the log is unavailable.
//! Each subscription owns one WebSocket connection to `/ws?limit=N` and
//! reconnects with capped exponential backoff when the connection drops; the
//! subscriber keeps its last window in the meantime.

use std::{
    collections::HashMap,
    sync::{
        Mutex,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use futures_util::StreamExt;
use tokio::{net::TcpStream, sync::mpsc::UnboundedSender, task::JoinHandle};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message};

use hiroba_server::{
    domain::{
        MessageId, MessageLog, MessageLogError, MessageWindow, NewMessage, SubscriptionHandle,
    },
    infrastructure::dto::{
        AppendMessageRequest, AppendMessageResponse, ErrorResponse, WindowMessage,
    },
};

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Reconnection delays of a live feed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    pub initial: Duration,
    pub max: Duration,
}

impl Backoff {
    pub fn next(&self, current: Duration) -> Duration {
        current.saturating_mul(2).min(self.max)
    }
}

impl Default for Backoff {
    fn default() -> Self {
        Self {
            initial: Duration::from_millis(500),
            max: Duration::from_secs(10),
        }
    }
}

pub struct RemoteMessageLog {
    base_url: String,
    http: reqwest::Client,
    backoff: Backoff,
    next_handle: AtomicU64,
    feeds: Mutex<HashMap<SubscriptionHandle, JoinHandle<()>>>,
}

impl RemoteMessageLog {
    /// `base_url` is the server's HTTP root, e.g. `http://127.0.0.1:8080`
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_backoff(base_url, Backoff::default())
    }

    pub fn with_backoff(base_url: impl Into<String>, backoff: Backoff) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http: reqwest::Client::new(),
            backoff,
            next_handle: AtomicU64::new(1),
            feeds: Mutex::new(HashMap::new()),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// WebSocket URL of the live feed
    pub fn feed_url(&self, limit: usize) -> String {
        let root = if let Some(rest) = self.base_url.strip_prefix("https://") {
            format!("wss://{rest}")
        } else if let Some(rest) = self.base_url.strip_prefix("http://") {
            format!("ws://{rest}")
        } else {
            self.base_url.clone()
        };
        format!("{root}/ws?limit={limit}")
    }

    /// Number of registered feeds, including finished ones not yet pruned
    pub fn feed_count(&self) -> usize {
        self.feeds.lock().map(|feeds| feeds.len()).unwrap_or(0)
    }
}

#[async_trait]
impl MessageLog for RemoteMessageLog {
    async fn append(&self, message: NewMessage) -> Result<MessageId, MessageLogError> {
        let request = AppendMessageRequest {
            author: message.author.into_string(),
            text: message.text.into_string(),
        };

        let response = self
            .http
            .post(format!("{}/api/messages", self.base_url))
            .json(&request)
            .send()
            .await
            .map_err(|e| MessageLogError::Unavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let reason = match response.json::<ErrorResponse>().await {
                Ok(body) => body.error,
                Err(_) => status.to_string(),
            };
            tracing::warn!("Append failed ({}): {}", status, reason);
            return Err(if status.is_client_error() {
                MessageLogError::Rejected(reason)
            } else {
                MessageLogError::Unavailable(format!("{status}: {reason}"))
            });
        }

        let body: AppendMessageResponse = response
            .json()
            .await
            .map_err(|e| MessageLogError::Unavailable(e.to_string()))?;
        MessageId::new(body.id).map_err(|e| MessageLogError::Unavailable(e.to_string()))
    }

    async fn subscribe_ordered(
        &self,
        limit: usize,
        sink: UnboundedSender<MessageWindow>,
    ) -> Result<SubscriptionHandle, MessageLogError> {
        let url = self.feed_url(limit);
        let (socket, _) = connect_async(url.as_str())
            .await
            .map_err(|e| MessageLogError::Unavailable(format!("{url}: {e}")))?;

        let handle = SubscriptionHandle::new(self.next_handle.fetch_add(1, Ordering::Relaxed));
        tracing::info!("Live feed connected ({}, {})", handle, url);
        let task = tokio::spawn(run_feed(url, limit, socket, sink, self.backoff));

        let mut feeds = self.feeds.lock().map_err(|e| {
            task.abort();
            MessageLogError::Unavailable(e.to_string())
        })?;
        // feeds whose subscriber went away without unsubscribing
        feeds.retain(|_, feed| !feed.is_finished());
        feeds.insert(handle, task);
        Ok(handle)
    }

    async fn unsubscribe(&self, handle: SubscriptionHandle) {
        let task = match self.feeds.lock() {
            Ok(mut feeds) => feeds.remove(&handle),
            Err(e) => {
                tracing::warn!("Feed registry poisoned: {}", e);
                None
            }
        };
        if let Some(task) = task {
            task.abort();
            tracing::info!("Live feed closed ({})", handle);
        }
    }
}

impl Drop for RemoteMessageLog {
    fn drop(&mut self) {
        if let Ok(feeds) = self.feeds.get_mut() {
            for (_, task) in feeds.drain() {
                task.abort();
            }
        }
    }
}

enum FeedEnd {
    SinkClosed,
    Disconnected,
}

/// Forward windows until the subscriber goes away, reconnecting on drops
async fn run_feed(
    url: String,
    limit: usize,
    mut socket: Socket,
    sink: UnboundedSender<MessageWindow>,
    backoff: Backoff,
) {
    loop {
        if let FeedEnd::SinkClosed = forward_windows(&mut socket, limit, &sink).await {
            return;
        }
        tracing::warn!("Live feed disconnected from {}", url);

        let mut delay = backoff.initial;
        socket = loop {
            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = sink.closed() => return,
            }
            match connect_async(url.as_str()).await {
                Ok((socket, _)) => {
                    tracing::info!("Live feed reconnected to {}", url);
                    break socket;
                }
                Err(e) => {
                    delay = backoff.next(delay);
                    tracing::debug!("Reconnect failed ({}), retrying in {:?}", e, delay);
                }
            }
        };
    }
}

async fn forward_windows(
    socket: &mut Socket,
    limit: usize,
    sink: &UnboundedSender<MessageWindow>,
) -> FeedEnd {
    loop {
        let frame = tokio::select! {
            frame = socket.next() => frame,
            _ = sink.closed() => return FeedEnd::SinkClosed,
        };
        match frame {
            Some(Ok(Message::Text(text))) => {
                match serde_json::from_str::<WindowMessage>(text.as_str()) {
                    Ok(message) => {
                        let window = message.into_window(limit);
                        tracing::debug!("Received window of {} messages", window.len());
                        if sink.send(window).is_err() {
                            return FeedEnd::SinkClosed;
                        }
                    }
                    Err(e) => tracing::warn!("Ignoring undecodable frame: {}", e),
                }
            }
            Some(Ok(Message::Close(_))) | None => return FeedEnd::Disconnected,
            Some(Ok(_)) => {}
            Some(Err(e)) => {
                tracing::warn!("WebSocket error: {}", e);
                return FeedEnd::Disconnected;
            }
        }
    }
}
