//! Server configuration.

use std::{net::SocketAddr, path::PathBuf};

use clap::Parser;

use crate::domain::DEFAULT_WINDOW_LIMIT;

/// Command line arguments of the Hiroba server
#[derive(Debug, Clone, Parser)]
#[command(name = "hiroba-server", version, about = "Hiroba public chat room server")]
pub struct ServerArgs {
    /// Address to bind
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    /// Port to bind
    #[arg(short, long, default_value_t = 8080)]
    pub port: u16,

    /// Maximum number of messages in a delivered window
    #[arg(long, default_value_t = DEFAULT_WINDOW_LIMIT)]
    pub window_limit: usize,

    /// JSON Lines journal for persisting messages across restarts
    #[arg(long)]
    pub journal: Option<PathBuf>,

    /// Default log level (overridden by RUST_LOG)
    #[arg(long, default_value = "debug")]
    pub log_level: String,
}

impl ServerArgs {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Resolved server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind: String,
    pub window_limit: usize,
    pub journal: Option<PathBuf>,
}

impl From<&ServerArgs> for ServerConfig {
    fn from(args: &ServerArgs) -> Self {
        Self {
            bind: args.bind_address(),
            window_limit: args.window_limit.max(1),
            journal: args.journal.clone(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([127, 0, 0, 1], 8080)).to_string(),
            window_limit: DEFAULT_WINDOW_LIMIT,
            journal: None,
        }
    }
}
