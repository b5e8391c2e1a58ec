//! Development-time tracing for the CLI.
//!
//! Diagnostics only: replay results are reported on stdout and in the
//! transcript file, unaffected by `RUST_LOG`.

use tracing_subscriber::EnvFilter;

/// Initialize the tracing subscriber: compact output on stderr, filtered by
/// `RUST_LOG`.
///
/// Without `RUST_LOG` only warnings show; `RUST_LOG=sokorun=debug` traces
/// every rejection and cycle truncation during a replay.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}
