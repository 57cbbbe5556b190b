//! Tracing subscriber initialisation.
//!
//! Library code only emits events; a binary or test harness calls
//! [`init_tracing`] once to decide where they go.

use tracing_subscriber::EnvFilter;

use dealmatch_types::{LogConfig, LogFormat, Result, SolverError};

/// Install the global subscriber described by `config`.
///
/// `RUST_LOG` overrides `config.filter` when set. Output goes to stderr.
///
/// # Errors
/// `Configuration` if the filter directive does not parse or a global
/// subscriber is already installed.
pub fn init_tracing(config: &LogConfig) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.filter)
            .map_err(|e| SolverError::Configuration(format!("log filter: {e}")))?,
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    let installed = match config.format {
        LogFormat::Text => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    installed.map_err(|e| SolverError::Configuration(format!("tracing: {e}")))
}
