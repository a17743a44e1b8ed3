//! Structured logging bootstrap.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber for binaries and examples
//! - Respect `RUST_LOG` when set, falling back to the configured filter
//!
//! # Design Decisions
//! - Called from the host binary only; the library itself never installs a
//!   global subscriber

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Install the global tracing subscriber. `default_filter` is used when
/// `RUST_LOG` is not set, e.g. `"micro_router=info"`.
pub fn init(default_filter: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
