//! Diagnostic logging.
//!
//! Logs go to **stderr** through `tracing`, so stdout carries only command
//! output (the import summary, query results). The filter comes from
//! `INTERCEPTS_LOG`, then `RUST_LOG`, then the default level.

use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "INTERCEPTS_LOG";

/// Install the global subscriber. Calling it twice is harmless.
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
