//! Diagnostic logging via `tracing`.
//!
//! The filter is built from the configured level only; the environment is
//! never consulted, so a run's behavior depends on its flags and config file
//! alone. Logs go to stderr, leaving stdout for the run banner and summary.

use tracing_subscriber::EnvFilter;

/// Filter directive scoping `level` to this crate.
pub fn filter_directive(level: &str) -> String {
    format!(
        "{}={}",
        env!("CARGO_PKG_NAME").replace('-', "_"),
        level.to_ascii_lowercase()
    )
}

/// Install the global subscriber. Safe to call more than once; later calls
/// are ignored.
pub fn init_logging(level: &str) {
    let filter = EnvFilter::try_new(filter_directive(level))
        .unwrap_or_else(|_| EnvFilter::new(filter_directive("info")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .ok();
}
