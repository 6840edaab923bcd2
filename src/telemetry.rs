//! Tracing subscriber setup for the CLI.

use std::io::{self, IsTerminal};

use once_cell::sync::OnceCell;
use tracing::subscriber::SetGlobalDefaultError;
use tracing_subscriber::{EnvFilter, fmt};

/// Environment variable holding the log filter, e.g. `agentmatch=debug`.
pub const LOG_ENV: &str = "AGENTMATCH_LOG";

const DEFAULT_FILTER: &str = "warn";

static TELEMETRY_GUARD: OnceCell<()> = OnceCell::new();

#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    #[error("invalid AGENTMATCH_LOG filter: {0}")]
    Filter(String),
    #[error("failed to install log subscriber: {0}")]
    Subscriber(SetGlobalDefaultError),
}

/// Install the global stderr subscriber once; later calls are no-ops.
pub fn initialise() -> Result<(), TelemetryError> {
    TELEMETRY_GUARD.get_or_try_init(install_subscriber).map(|_| ())
}

fn install_subscriber() -> Result<(), TelemetryError> {
    let directives = std::env::var(LOG_ENV).unwrap_or_else(|_| DEFAULT_FILTER.to_string());
    let filter = EnvFilter::try_new(&directives).map_err(|error| TelemetryError::Filter(error.to_string()))?;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_target(true)
        .with_level(true)
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal())
        .finish();

    tracing::subscriber::set_global_default(subscriber).map_err(TelemetryError::Subscriber)
}
