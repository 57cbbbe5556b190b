//! Background driver for recurring scans and timeout sweeps.
//!
//! One tokio task owns the cadence: a scan every `scan_interval`, an extra
//! scan whenever a submission fires the solver's scan trigger, and a
//! timeout sweep every `timeout_sweep_interval`. It stops when the
//! shutdown channel flips to `true` or its sender is dropped.
//!
//! Scans and sweeps are synchronous and take store locks, so each one runs
//! on the blocking pool and the loop awaits it before selecting again.

use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, error, info};

use dealmatch_types::constants::{ENGINE_NAME, VERSION};

use crate::service::Solver;

/// Spawn [`run`] on the current runtime.
#[must_use]
pub fn spawn(solver: Arc<Solver>, shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
    tokio::spawn(run(solver, shutdown))
}

/// Drive `solver` until shutdown.
pub async fn run(solver: Arc<Solver>, mut shutdown: watch::Receiver<bool>) {
    let config = solver.config().clone();
    let mut scan_tick = interval(config.scan_interval);
    scan_tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut sweep_tick = interval(config.timeout_sweep_interval);
    sweep_tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let trigger = solver.scan_trigger();

    info!(
        engine = ENGINE_NAME,
        version = VERSION,
        scan_interval = ?config.scan_interval,
        sweep_interval = ?config.timeout_sweep_interval,
        "Scheduler started"
    );

    loop {
        tokio::select! {
            biased;
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    info!("Scheduler shutting down");
                    break;
                }
            }
            _ = sweep_tick.tick() => sweep(&solver).await,
            () = trigger.notified() => {
                debug!("Scan triggered by submission");
                scan(&solver).await;
            }
            _ = scan_tick.tick() => scan(&solver).await,
        }
    }
}

async fn scan(solver: &Arc<Solver>) {
    let solver = Arc::clone(solver);
    match tokio::task::spawn_blocking(move || solver.run_scan()).await {
        Ok(Ok(_)) => {}
        Ok(Err(err)) => error!(error = %err, "Scan failed"),
        Err(err) => error!(error = %err, "Scan task did not complete"),
    }
}

async fn sweep(solver: &Arc<Solver>) {
    let solver = Arc::clone(solver);
    match tokio::task::spawn_blocking(move || solver.enforce_timeouts()).await {
        Ok(Ok(_)) => {}
        Ok(Err(err)) => error!(error = %err, "Timeout sweep failed"),
        Err(err) => error!(error = %err, "Timeout sweep task did not complete"),
    }
}
