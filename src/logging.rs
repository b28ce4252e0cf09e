//! Tracing setup shared by both binaries.
//!
//! Output always goes to stderr: on the stdio transport, stdout is the
//! protocol channel and must carry nothing but response frames.

use tracing_subscriber::{filter::EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Default filter when `RUST_LOG` is unset.
const DEFAULT_FILTER: &str = "info";

/// Installs the global subscriber.
///
/// `RUST_LOG` wins when set; otherwise `verbose` selects `debug` over the
/// default `info`. Calling this twice is harmless (the second call is a no-op).
pub fn init_tracing(verbose: bool) {
    let fallback = if verbose { "debug" } else { DEFAULT_FILTER };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .try_init();
}
