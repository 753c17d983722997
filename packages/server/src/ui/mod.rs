//! HTTP and WebSocket server for the Message Log.

mod error;
mod handler;
mod runner;
mod signal;
pub mod state;

pub use error::ApiError;
pub use runner::{ServerError, build_router, open_log, run, serve};
pub use signal::shutdown_signal;
