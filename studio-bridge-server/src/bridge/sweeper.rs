//! Periodic expiry sweep
//!
//! Second expiry path alongside the per-invocation timers. Each pass runs in
//! its own task so a panic inside one pass is logged and the loop keeps going.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info};

use super::RequestBridge;

/// Spawn the sweep loop
///
/// Runs until `shutdown_rx` fires or its sender is dropped.
pub fn spawn_sweeper(
    bridge: RequestBridge,
    interval: Duration,
    shutdown_rx: broadcast::Receiver<()>,
) -> JoinHandle<()> {
    spawn_sweep_loop(interval, shutdown_rx, move || bridge.sweep())
}

/// Drive `pass` on every tick until shutdown
pub(super) fn spawn_sweep_loop<F>(
    interval: Duration,
    mut shutdown_rx: broadcast::Receiver<()>,
    pass: F,
) -> JoinHandle<()>
where
    F: Fn() -> usize + Send + Sync + 'static,
{
    let pass = Arc::new(pass);
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately; nothing can be due yet
        ticker.tick().await;

        debug!(interval_ms = interval.as_millis() as u64, "Sweeper started");

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    guarded_pass(Arc::clone(&pass)).await;
                }
                _ = shutdown_rx.recv() => {
                    debug!("Sweeper stopping");
                    break;
                }
            }
        }
    })
}

/// Run one guarded sweep; returns the number expired, zero if the pass panicked
#[cfg(test)]
pub(super) async fn sweep_pass(bridge: &RequestBridge) -> usize {
    let bridge = bridge.clone();
    guarded_pass(Arc::new(move || bridge.sweep())).await
}

/// Run `pass` in its own task so a panic is logged instead of ending the loop
async fn guarded_pass<F>(pass: Arc<F>) -> usize
where
    F: Fn() -> usize + Send + Sync + 'static,
{
    match tokio::spawn(async move { (*pass)() }).await {
        Ok(0) => 0,
        Ok(expired) => {
            info!(expired, "Sweep expired stale invocations");
            expired
        }
        Err(e) => {
            error!(error = %e, "Sweep pass failed");
            0
        }
    }
}
