//! Server runner.

use std::{future::Future, sync::Arc};

use axum::{Router, routing::get};
use thiserror::Error;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::{
    config::ServerConfig,
    domain::MessageLog,
    infrastructure::{InMemoryMessageLog, JournalError},
    ui::{
        handler::{get_messages, health_check, post_message, websocket_handler},
        signal::shutdown_signal,
        state::AppState,
    },
};

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("server error: {0}")]
    Serve(#[source] std::io::Error),

    #[error(transparent)]
    Journal(#[from] JournalError),
}

/// Build the application router
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/health", get(health_check))
        .route("/api/messages", get(get_messages).post(post_message))
        .route("/ws", get(websocket_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve on an already bound listener until `shutdown` resolves
pub async fn serve<F>(
    listener: TcpListener,
    state: Arc<AppState>,
    shutdown: F,
) -> Result<(), ServerError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let router = build_router(state.clone());
    axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            shutdown.await;
            tracing::info!("Shutting down, closing live feeds");
            state.close_feeds();
        })
        .await
        .map_err(ServerError::Serve)
}

/// Open the message log described by `config`
pub async fn open_log(config: &ServerConfig) -> Result<Arc<dyn MessageLog>, ServerError> {
    let log = match &config.journal {
        Some(path) => InMemoryMessageLog::open_journal(path).await?,
        None => InMemoryMessageLog::new(),
    };
    Ok(Arc::new(log))
}

/// Run the server until a shutdown signal is received
pub async fn run(config: ServerConfig) -> Result<(), ServerError> {
    let log = open_log(&config).await?;
    let state = Arc::new(AppState::new(log, config.window_limit));

    let listener = TcpListener::bind(&config.bind)
        .await
        .map_err(|source| ServerError::Bind {
            address: config.bind.clone(),
            source,
        })?;
    tracing::info!(
        "Listening on {} (window limit {})",
        config.bind,
        config.window_limit
    );

    serve(listener, state, shutdown_signal()).await
}
