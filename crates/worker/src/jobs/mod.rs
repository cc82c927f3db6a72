pub mod live_sync;
pub mod sweep;

use std::future::Future;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{error, info};

/// Runs `job` immediately and then every `period` until `shutdown` flips to true.
/// A failed run is logged and retried on the next tick.
pub async fn run_every<F, Fut, T>(
    name: &'static str,
    period: Duration,
    mut shutdown: watch::Receiver<bool>,
    mut job: F,
) where
    F: FnMut() -> Fut,
    Fut: Future<Output = anyhow::Result<T>>,
{
    // interval() panics on a zero period.
    let mut ticker = tokio::time::interval(period.max(Duration::from_millis(1)));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    info!(job = name, period_secs = period.as_secs(), "job scheduled");

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if let Err(err) = job().await {
                    error!(job = name, error = %err, "job run failed");
                }
            }
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    info!(job = name, "job stopped");
                    return;
                }
            }
        }
    }
}
