//! Client configuration.

use std::path::PathBuf;

use clap::Parser;

/// Command line arguments of the Hiroba client
#[derive(Debug, Clone, Parser)]
#[command(name = "hiroba-client", version, about = "Hiroba public chat room client")]
pub struct ClientArgs {
    /// Base URL of the Hiroba server
    #[arg(long, default_value = "http://127.0.0.1:8080")]
    pub server_url: String,

    /// File holding the chosen display name
    #[arg(long, default_value = ".hiroba-identity.json")]
    pub identity_file: PathBuf,

    /// Default log level (overridden by RUST_LOG)
    #[arg(long, default_value = "warn")]
    pub log_level: String,
}

/// Resolved client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub server_url: String,
    pub identity_file: PathBuf,
}

impl From<&ClientArgs> for ClientConfig {
    fn from(args: &ClientArgs) -> Self {
        Self {
            server_url: args.server_url.trim_end_matches('/').to_string(),
            identity_file: args.identity_file.clone(),
        }
    }
}
