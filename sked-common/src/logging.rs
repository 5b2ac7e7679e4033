//! Tracing subscriber bootstrap
//!
//! `RUST_LOG` wins when set; otherwise the configured level applies to the
//! sked crates.

use crate::config::LoggingConfig;
use crate::{Error, Result};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Build the filter used by [`init_tracing`]
pub fn env_filter(logging: &LoggingConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = logging.level.trim().to_lowercase();
        EnvFilter::new(format!("sked_match={level},sked_common={level}"))
    })
}

/// Install the global subscriber, logging to stderr
///
/// Fails if a global subscriber is already installed.
pub fn init_tracing(logging: &LoggingConfig) -> Result<()> {
    tracing_subscriber::registry()
        .with(env_filter(logging))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init()
        .map_err(|e| Error::Internal(format!("Tracing init failed: {}", e)))
}
