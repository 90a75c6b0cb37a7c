//! Diagnostic logging for hopperctl.
//!
//! Filter comes from `$HOPPER_LOG` (EnvFilter syntax), otherwise `warn`,
//! or `debug` with `-v`. Output goes to stderr so it never mixes with
//! the chat transcript.

use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter
pub const LOG_ENV: &str = "HOPPER_LOG";

pub fn init(verbose: bool) {
    let fallback = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(fallback));

    // Ignore a second init (tests may call this more than once)
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
