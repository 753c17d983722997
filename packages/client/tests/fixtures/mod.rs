//! Test fixtures: an in-process Hiroba server on an ephemeral port.

use std::{net::SocketAddr, sync::Arc, time::Duration};

use hiroba_server::{
    domain::MessageWindow, infrastructure::InMemoryMessageLog, ui, ui::state::AppState,
};
use tokio::{
    net::TcpListener,
    sync::{mpsc::UnboundedReceiver, oneshot},
    task::JoinHandle,
};

pub struct TestServer {
    addr: SocketAddr,
    shutdown: Option<oneshot::Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

#[allow(dead_code)]
impl TestServer {
    pub async fn start() -> Self {
        let addr = SocketAddr::from(([127, 0, 0, 1], 0));
        Self::start_with(Arc::new(InMemoryMessageLog::new()), addr).await
    }

    /// Serve `log` on `addr` (port 0 picks a free port)
    pub async fn start_with(log: Arc<InMemoryMessageLog>, addr: SocketAddr) -> Self {
        let listener = TcpListener::bind(addr)
            .await
            .expect("Failed to bind test listener");
        let addr = listener.local_addr().expect("Failed to read local address");
        let state = Arc::new(AppState::new(log, 200));
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

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Shut down gracefully, closing every live feed
    pub async fn stop(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = tokio::time::timeout(Duration::from_secs(3), handle).await;
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

/// Receive windows until one satisfies `predicate`
#[allow(dead_code)]
pub async fn wait_for_window<F>(rx: &mut UnboundedReceiver<MessageWindow>, predicate: F) -> MessageWindow
where
    F: Fn(&MessageWindow) -> bool,
{
    tokio::time::timeout(Duration::from_secs(3), async {
        loop {
            let window = rx.recv().await.expect("Window channel closed");
            if predicate(&window) {
                return window;
            }
        }
    })
    .await
    .expect("Timed out waiting for a window")
}
