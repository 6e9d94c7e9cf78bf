//! Process-wide `tracing` subscriber for hosts embedding the runtime.
//!
//! The runtime itself only emits events. A host that wants them on stderr
//! calls [`initialise`] once during setup, before building dispatchers.

use std::io::{self, IsTerminal};

use once_cell::sync::OnceCell;
use tracing::{Subscriber, subscriber::SetGlobalDefaultError};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;

use stagehand_config::{Config, LogFormat};

static TELEMETRY: OnceCell<LogFormat> = OnceCell::new();

/// Proof that the global subscriber is installed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TelemetryHandle {
    format: LogFormat,
}

impl TelemetryHandle {
    /// Format chosen by the call that installed the subscriber.
    #[must_use]
    pub const fn format(self) -> LogFormat {
        self.format
    }
}

/// Errors raised while installing the subscriber.
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    /// The configured filter is not a valid `EnvFilter` directive.
    #[error("invalid log filter '{filter}': {message}")]
    Filter {
        /// Filter as configured.
        filter: String,
        /// Parser diagnostic.
        message: String,
    },
    /// Another global subscriber was already installed.
    #[error("failed to install telemetry subscriber: {0}")]
    Subscriber(#[from] SetGlobalDefaultError),
}

/// Installs the global subscriber on first call.
///
/// Later calls return a handle describing the subscriber already in place;
/// their configuration is ignored.
///
/// # Errors
///
/// Returns [`TelemetryError::Filter`] when `config.log_filter()` does not
/// parse, and [`TelemetryError::Subscriber`] when some other subscriber
/// already owns the global slot.
pub fn initialise(config: &Config) -> Result<TelemetryHandle, TelemetryError> {
    TELEMETRY
        .get_or_try_init(|| install(config))
        .map(|format| TelemetryHandle { format: *format })
}

/// Parses the configured filter directive.
///
/// # Errors
///
/// Returns [`TelemetryError::Filter`] for an invalid directive.
pub fn parse_filter(filter: &str) -> Result<EnvFilter, TelemetryError> {
    EnvFilter::try_new(filter).map_err(|error| TelemetryError::Filter {
        filter: filter.to_owned(),
        message: error.to_string(),
    })
}

fn install(config: &Config) -> Result<LogFormat, TelemetryError> {
    let filter = parse_filter(config.log_filter())?;
    let format = config.log_format();

    let builder = fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_target(true)
        .with_level(true)
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal())
        .with_timer(fmt::time::UtcTime::rfc_3339());

    let subscriber: Box<dyn Subscriber + Send + Sync> = match format {
        LogFormat::Json => Box::new(builder.json().flatten_event(true).finish()),
        LogFormat::Compact => Box::new(builder.compact().finish()),
    };
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(format)
}
