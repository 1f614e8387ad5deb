use crate::error::{ShareError, ShareResult};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter used when neither `RUST_LOG` nor the caller provides one
pub const DEFAULT_FILTER: &str = "secure_share=info";

/// Install the global tracing subscriber
///
/// `RUST_LOG` takes precedence over `default_filter`. Output goes to stderr so
/// stdout stays free for JSON results. Fails if a subscriber is already set.
pub fn init_logging(default_filter: &str) -> ShareResult<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter))
        .map_err(|e| ShareError::ConfigError(format!("Invalid log filter: {}", e)))?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .with(filter)
        .try_init()
        .map_err(|e| ShareError::Internal(format!("Failed to initialize logging: {}", e)))
}
