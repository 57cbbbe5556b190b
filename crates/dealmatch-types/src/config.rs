//! Configuration types for the solver.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{Result, SolverError, constants};

/// Solver configuration.
///
/// Every field has a default, so a config file only needs to name what it
/// changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    /// Period of the recurring matching scan.
    pub scan_interval: Duration,
    /// Period of the timeout sweep.
    pub timeout_sweep_interval: Duration,
    /// Bounded retries for external-signal transitions that lose a
    /// compare-and-set race.
    pub max_transition_retries: u32,
    /// Run an extra scan whenever a new offer is submitted.
    pub scan_on_submit: bool,
    pub log: LogConfig,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            scan_interval: Duration::from_millis(constants::DEFAULT_SCAN_INTERVAL_MS),
            timeout_sweep_interval: Duration::from_millis(
                constants::DEFAULT_TIMEOUT_SWEEP_INTERVAL_MS,
            ),
            max_transition_retries: constants::DEFAULT_MAX_TRANSITION_RETRIES,
            scan_on_submit: true,
            log: LogConfig::default(),
        }
    }
}

impl SolverConfig {
    /// Parse and validate a JSON config document.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let cfg: Self = serde_json::from_str(json)
            .map_err(|e| SolverError::Configuration(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        if self.scan_interval.is_zero() {
            return Err(SolverError::Configuration(
                "scan_interval must be non-zero".into(),
            ));
        }
        if self.timeout_sweep_interval.is_zero() {
            return Err(SolverError::Configuration(
                "timeout_sweep_interval must be non-zero".into(),
            ));
        }
        if self.log.filter.trim().is_empty() {
            return Err(SolverError::Configuration("log.filter is empty".into()));
        }
        Ok(())
    }
}

/// Output format of the tracing subscriber.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// `tracing_subscriber::EnvFilter` directive, e.g. `"dealmatch=debug"`.
    /// `RUST_LOG` takes precedence when set.
    pub filter: String,
    pub format: LogFormat,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: constants::DEFAULT_LOG_FILTER.to_string(),
            format: LogFormat::Text,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let cfg = SolverConfig::default();
        assert_eq!(cfg.scan_interval.as_millis(), 1000);
        assert_eq!(cfg.max_transition_retries, 3);
        assert!(cfg.scan_on_submit);
        assert_eq!(cfg.log.format, LogFormat::Text);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let cfg = SolverConfig::from_json_str(
            r#"{"max_transition_retries": 7, "log": {"format": "json"}}"#,
        )
        .unwrap();
        assert_eq!(cfg.max_transition_retries, 7);
        assert_eq!(cfg.log.format, LogFormat::Json);
        assert_eq!(cfg.log.filter, "info");
        assert_eq!(cfg.scan_interval, SolverConfig::default().scan_interval);
    }

    #[test]
    fn zero_interval_rejected() {
        let err = SolverConfig::from_json_str(r#"{"scan_interval": {"secs": 0, "nanos": 0}}"#)
            .unwrap_err();
        assert!(matches!(err, SolverError::Configuration(_)));
    }

    #[test]
    fn malformed_json_is_configuration_error() {
        let err = SolverConfig::from_json_str("{not json").unwrap_err();
        assert!(matches!(err, SolverError::Configuration(_)));
    }

    #[test]
    fn serde_roundtrip() {
        let cfg = SolverConfig::default();
        let json = serde_json::to_string(&cfg).unwrap();
        let back: SolverConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(cfg, back);
    }
}
