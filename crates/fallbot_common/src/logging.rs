//! Tracing setup shared by the binaries.
//!
//! Logs go to stderr so spoken output on stdout stays clean. The filter is
//! read from $FALLBOT_LOG (e.g. `FALLBOT_LOG=fallbot_common=debug`).

use tracing_subscriber::EnvFilter;

pub const LOG_ENV: &str = "FALLBOT_LOG";

pub fn init(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default));

    // A second init (tests, embedding hosts) keeps the first subscriber
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
