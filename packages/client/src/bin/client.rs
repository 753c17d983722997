//! Hiroba CLI chat client.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin hiroba-client -- --server-url http://127.0.0.1:8080
//! ```

use clap::Parser;

use hiroba_client::{ClientArgs, ClientConfig, run_client};
use hiroba_shared::logger::setup_logger;

#[tokio::main]
async fn main() {
    let args = ClientArgs::parse();
    setup_logger(env!("CARGO_BIN_NAME"), &args.log_level);

    if let Err(e) = run_client(ClientConfig::from(&args)).await {
        tracing::error!("Client error: {}", e);
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
