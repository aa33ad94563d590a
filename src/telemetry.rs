//! Tracing subscriber installation.

use thiserror::Error;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Errors raised while installing the global subscriber.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// The filter directive does not parse.
    #[error("invalid log filter '{directive}': {source}")]
    InvalidFilter {
        /// Offending directive.
        directive: String,
        /// Parser error.
        #[source]
        source: tracing_subscriber::filter::ParseError,
    },

    /// A global subscriber is already installed.
    #[error("tracing subscriber already installed: {0}")]
    AlreadyInstalled(#[from] tracing_subscriber::util::TryInitError),
}

/// Installs a formatting subscriber filtered by `directive`.
///
/// `RUST_LOG`, when set, takes precedence over `directive`.
///
/// # Errors
///
/// Returns [`TelemetryError`] when `RUST_LOG` or the directive is invalid, or
/// when a subscriber has already been installed.
pub fn init_tracing(directive: &str) -> Result<(), TelemetryError> {
    let filter = build_filter(std::env::var(EnvFilter::DEFAULT_ENV).ok(), directive)?;

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init()?;
    Ok(())
}

/// Picks the environment override when present and non-blank.
///
/// A malformed override is an error rather than a silent fallback, so a typo
/// in `RUST_LOG` surfaces at startup.
fn build_filter(env_value: Option<String>, directive: &str) -> Result<EnvFilter, TelemetryError> {
    let chosen = env_value
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| directive.to_owned());
    EnvFilter::try_new(&chosen)
        .map_err(|source| TelemetryError::InvalidFilter {
            directive: chosen,
            source,
        })
}
