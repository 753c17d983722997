//! Terminal presentation of the chat session.

pub mod render;
pub mod runner;

pub use render::Renderer;
pub use runner::{Flow, connect_live_view, handle_line, run, run_session};
