//! System-wide constants for the dealmatch solver.

/// Default interval between recurring scans, in milliseconds.
pub const DEFAULT_SCAN_INTERVAL_MS: u64 = 1000;

/// Default interval between timeout sweeps, in milliseconds.
pub const DEFAULT_TIMEOUT_SWEEP_INTERVAL_MS: u64 = 1000;

/// How many times an external-signal transition re-reads and retries after
/// losing a compare-and-set race.
pub const DEFAULT_MAX_TRANSITION_RETRIES: u32 = 3;

/// Default `tracing` filter directive.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Engine name.
pub const ENGINE_NAME: &str = "dealmatch";
