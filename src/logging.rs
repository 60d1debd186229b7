//! Logging initialization for the symscan binary.
//!
//! Logs go to stderr so JSON reports on stdout stay machine-readable.

use tracing_subscriber::EnvFilter;

/// Install the global subscriber.
///
/// `verbose` forces debug level; otherwise `RUST_LOG` is honored with a
/// default of `warn`. Calling this twice is harmless.
pub fn init(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("symscan=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
