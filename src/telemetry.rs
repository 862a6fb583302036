use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter, e.g. `STOCKVIEW_LOG=debug`.
pub const LOG_ENV: &str = "STOCKVIEW_LOG";

/// Install the global subscriber. Logs go to stderr so report output on
/// stdout stays clean. Returns `false` if a subscriber was already set.
pub fn init_tracing() -> bool {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .try_init()
        .is_ok()
}
