use std::env;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

pub const LOG_ENV: &str = "CLEANKIRO_LOG";

/// Filter directive used when `CLEANKIRO_LOG` is unset.
pub fn default_directive(verbose: bool) -> &'static str {
    if verbose {
        "cleankiro=debug"
    } else {
        "warn"
    }
}

/// Install the global subscriber. Logs go to stderr so JSON on stdout stays clean.
pub fn init(verbose: bool) {
    let filter = env::var(LOG_ENV)
        .ok()
        .and_then(|raw| EnvFilter::try_new(raw).ok())
        .unwrap_or_else(|| EnvFilter::new(default_directive(verbose)));

    let _ = tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .without_time(),
        )
        .with(filter)
        .try_init();
}
