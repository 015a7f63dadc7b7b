use crate::api::client::{ApiClient, ApiError};
use crate::api::events::RefreshEvent;
use crate::api::models::Snapshot;
use log::{debug, warn};
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::{Notify, mpsc};
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};

pub const DEFAULT_PERIOD: Duration = Duration::from_secs(5);

/// Fetch notices and official groups together; either failing fails the cycle.
pub async fn fetch_snapshot(client: &ApiClient) -> Result<Snapshot, ApiError> {
    let (notices, official_groups) =
        tokio::try_join!(client.list_notices(), client.official_groups())?;
    Ok(Snapshot { notices, official_groups })
}

/// Owns a running refresh loop. Dropping it cancels the timer and discards
/// any fetch that resolves afterwards.
pub struct RefreshHandle {
    timer: JoinHandle<()>,
    active: Arc<AtomicBool>,
    trigger: Arc<Notify>,
}

impl RefreshHandle {
    /// Run an extra cycle now, without waiting for the next tick.
    pub fn trigger(&self) {
        self.trigger.notify_one();
    }

    pub fn stop(self) {}
}

impl Drop for RefreshHandle {
    fn drop(&mut self) {
        self.active.store(false, Ordering::SeqCst);
        self.timer.abort();
    }
}

/// Fetch immediately, then every `period`, sending one event per cycle.
///
/// Every cycle runs in its own task so a slow response never holds back the
/// next tick. Events carry the cycle number so receivers can drop stale ones.
pub fn spawn<F, Fut>(
    period: Duration,
    fetch: F,
    tx: mpsc::UnboundedSender<RefreshEvent>,
) -> RefreshHandle
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Snapshot, ApiError>> + Send + 'static,
{
    let active = Arc::new(AtomicBool::new(true));
    let trigger = Arc::new(Notify::new());

    let timer = {
        let active = active.clone();
        let trigger = trigger.clone();
        tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let mut seq = 0u64;
            loop {
                tokio::select! {
                    _ = ticker.tick() => {}
                    _ = trigger.notified() => {}
                }
                if tx.is_closed() {
                    debug!("refresh receiver gone, stopping loop");
                    break;
                }
                seq += 1;
                let cycle = fetch();
                let tx = tx.clone();
                let active = active.clone();
                tokio::spawn(async move {
                    let event = match cycle.await {
                        Ok(snapshot) => RefreshEvent::Refreshed { seq, snapshot },
                        Err(e) => {
                            warn!("refresh cycle {seq} skipped: {e}");
                            RefreshEvent::Failed { seq, reason: e.to_string() }
                        }
                    };
                    if active.load(Ordering::SeqCst) {
                        let _ = tx.send(event);
                    } else {
                        debug!("dropping refresh cycle {seq} resolved after teardown");
                    }
                });
            }
        })
    };

    RefreshHandle { timer, active, trigger }
}

/// Refresh loop bound to a backend client.
pub fn spawn_for_client(
    client: Arc<ApiClient>,
    period: Duration,
    tx: mpsc::UnboundedSender<RefreshEvent>,
) -> RefreshHandle {
    spawn(
        period,
        move || {
            let client = client.clone();
            async move { fetch_snapshot(&client).await }
        },
        tx,
    )
}
