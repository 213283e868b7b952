//! JSON log subscriber.
//!
//! One JSON object per line with a timestamp, the level, the message and
//! the fields of the current span (directory operations record the
//! caller's username and role there). `RUST_LOG` overrides the defaults.

use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is unset or invalid.
pub const DEFAULT_DIRECTIVES: &str = "info,sqlx=warn";

/// Install the global subscriber. Later calls are no-ops.
pub fn init(default_directives: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives));

    let installed = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .json()
        .with_current_span(true)
        .with_span_list(false)
        .with_timer(tracing_subscriber::fmt::time::SystemTime)
        .with_target(false)
        .try_init()
        .is_ok();

    if installed {
        tracing::debug!(default_directives, "logging initialised");
    }
}
