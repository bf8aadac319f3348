//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber once at startup
//! - Derive the default filter from config, with `--debug` forcing debug level
//! - Allow `RUST_LOG` to override everything
//!
//! # Design Decisions
//! - Uses the tracing crate for structured logging
//! - Initialization happens before any other subsystem so that startup
//!   failures are captured

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the global tracing subscriber.
///
/// `level` comes from `observability.log_level`; `debug` (the CLI flag)
/// forces `debug` regardless of the configured level.
pub fn init_logging(level: &str, debug: bool) {
    let default_filter = if debug {
        "printdeck=debug,tower_http=debug".to_string()
    } else {
        format!("printdeck={level}")
    };

    // try_init: embedding callers (and tests) may have installed their own
    // subscriber already; that is not an error.
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}
