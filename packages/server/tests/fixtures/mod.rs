//! Test fixtures: an in-process server on an ephemeral port.

use std::{net::SocketAddr, sync::Arc};

use hiroba_server::{infrastructure::InMemoryMessageLog, ui, ui::state::AppState};
use tokio::{net::TcpListener, sync::oneshot, task::JoinHandle};

pub struct TestServer {
    addr: SocketAddr,
    shutdown: Option<oneshot::Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl TestServer {
    /// Start a server backed by a fresh in-memory log
    pub async fn start() -> Self {
        Self::start_with_limit(200).await
    }

    pub async fn start_with_limit(window_limit: usize) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test listener");
        let addr = listener.local_addr().expect("Failed to read local address");
        let state = Arc::new(AppState::new(
            Arc::new(InMemoryMessageLog::new()),
            window_limit,
        ));
        let (tx, rx) = oneshot::channel();
        let handle = tokio::spawn(async move {
            ui::serve(listener, state, async {
                let _ = rx.await;
            })
            .await
            .expect("Test server failed");
        });

        Self {
            addr,
            shutdown: Some(tx),
            handle: Some(handle),
        }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    #[allow(dead_code)]
    pub fn ws_url(&self, limit: Option<usize>) -> String {
        match limit {
            Some(limit) => format!("ws://{}/ws?limit={}", self.addr, limit),
            None => format!("ws://{}/ws", self.addr),
        }
    }

    /// Stop the server and wait for it to finish
    #[allow(dead_code)]
    pub async fn stop(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}
