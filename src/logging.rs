//! Logging setup
//!
//! Console logging through `tracing`. `RUST_LOG` takes precedence over the
//! `Miscellaneous.log_filter` config value, e.g. `RUST_LOG=ctrfront::loader=debug`.

use tracing::warn;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::settings::DEFAULT_LOG_FILTER;

/// Build the filter: `RUST_LOG` if set, else `configured`, else the default
pub fn build_filter(configured: &str) -> (EnvFilter, Option<String>) {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return (filter, None);
    }
    match EnvFilter::try_new(configured) {
        Ok(filter) => (filter, None),
        Err(e) => (
            EnvFilter::new(DEFAULT_LOG_FILTER),
            Some(format!("invalid log filter {:?}: {}", configured, e)),
        ),
    }
}

/// Install the global subscriber
pub fn init(configured: &str) {
    let (filter, problem) = build_filter(configured);

    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_filter(filter);

    // Ignore a second init (tests, or a subscriber installed by the host)
    let _ = tracing_subscriber::registry().with(console_layer).try_init();

    if let Some(problem) = problem {
        warn!("{}, falling back to {:?}", problem, DEFAULT_LOG_FILTER);
    }
}
