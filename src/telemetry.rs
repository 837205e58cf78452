//! Tracing subscriber setup.

use std::env;
use thiserror::Error;
use tracing_subscriber::{
    EnvFilter,
    filter::{FromEnvError, ParseError},
    fmt,
    layer::SubscriberExt,
    util::{SubscriberInitExt, TryInitError},
};

/// Filter applied when `RUST_LOG` is unset.
pub const DEFAULT_FILTER: &str = "taskboard=info";

/// Errors raised while installing the subscriber.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// `RUST_LOG` holds a directive that cannot be parsed.
    #[error("invalid RUST_LOG filter: {0}")]
    Env(#[from] FromEnvError),

    /// The fallback filter cannot be parsed.
    #[error("invalid default log filter: {0}")]
    Default(#[from] ParseError),

    /// A global subscriber is already installed.
    #[error("failed to install tracing subscriber: {0}")]
    Install(#[from] TryInitError),
}

/// Builds the event filter from `RUST_LOG`, falling back to
/// [`DEFAULT_FILTER`] when the variable is unset.
///
/// # Errors
///
/// Returns [`TelemetryError`] when the selected filter cannot be parsed.
pub fn env_filter() -> Result<EnvFilter, TelemetryError> {
    if env::var_os(EnvFilter::DEFAULT_ENV).is_some() {
        Ok(EnvFilter::try_from_default_env()?)
    } else {
        Ok(EnvFilter::try_new(DEFAULT_FILTER)?)
    }
}

/// Installs a formatted global subscriber using [`env_filter`].
///
/// # Errors
///
/// Returns [`TelemetryError`] when the filter is invalid or a global
/// subscriber has already been installed.
pub fn init_tracing() -> Result<(), TelemetryError> {
    tracing_subscriber::registry()
        .with(env_filter()?)
        .with(fmt::layer().with_target(false))
        .try_init()?;
    Ok(())
}
