//! Logger setup for Hiroba binaries.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Build the default filter directive for a binary.
///
/// Binary names use hyphens while tracing targets use the crate name with
/// underscores (`hiroba-server` -> `hiroba_server`).
pub fn default_directive(bin_name: &str, level: &str) -> String {
    let target = bin_name.replace('-', "_");
    format!("{target}={level},hiroba_server={level},hiroba_shared={level},tower_http={level}")
}

/// Initialize tracing for a binary.
///
/// `RUST_LOG` takes precedence over the default directive. Logs go to stderr.
/// Calling this more than once is a no-op.
pub fn setup_logger(bin_name: &str, default_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(bin_name, default_level)));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_writer(std::io::stderr),
        )
        .try_init();
}
