//! Logging configuration for vendsum.
//!
//! Logs go to stderr so stdout stays clean for the rendered summary and
//! shell redirection.

use tracing_subscriber::EnvFilter;

/// Initializes stderr logging with RUST_LOG support, defaulting to `info`.
pub fn init() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}
