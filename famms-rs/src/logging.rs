//! Log subscriber setup for the `famms` binary.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Environment variable holding the filter directives.
pub const LOG_ENV: &str = "FAMMS_LOG";

/// Filter for the given verbosity: `-d` wins over `-q`, both win over
/// `FAMMS_LOG`, which defaults to `warn`.
pub fn filter(debug: bool, quiet: bool) -> EnvFilter {
    if debug {
        EnvFilter::new("debug")
    } else if quiet {
        EnvFilter::new("error")
    } else {
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"))
    }
}

/// Install a stderr subscriber.  A second call is a no-op.
pub fn init(debug: bool, quiet: bool) {
    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_filter(filter(debug, quiet));

    let _ = tracing_subscriber::registry().with(stderr_layer).try_init();
}
