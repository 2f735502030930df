use std::future::Future;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use fleetauth_core::AppResult;

/// Owns the lifecycle of at most one background polling task.
///
/// `start` fully cancels and joins any previous task before spawning a new
/// one, so restarting can never leave two pollers live. Cancellation is
/// observed between ticks only: an in-flight tick finishes its current work
/// instead of being torn down halfway through.
pub struct PollingSupervisor {
    poller: Mutex<Option<Poller>>,
}

struct Poller {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl PollingSupervisor {
    /// Creates a supervisor in the stopped state.
    #[must_use]
    pub fn new() -> Self {
        Self {
            poller: Mutex::new(None),
        }
    }

    /// (Re)starts the polling loop.
    ///
    /// The loop runs `tick` immediately, then sleeps `interval` between
    /// runs. A failing tick is logged and retried on the next turn; it never
    /// terminates the loop.
    pub async fn start<F, Fut>(&self, interval: Duration, tick: F)
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = AppResult<()>> + Send,
    {
        let mut poller = self.poller.lock().await;
        stop_poller(poller.take()).await;

        let cancel = CancellationToken::new();
        let loop_cancel = cancel.clone();
        let task = tokio::spawn(async move {
            loop {
                if loop_cancel.is_cancelled() {
                    break;
                }
                if let Err(error) = tick().await {
                    warn!(error = %error, "polling tick failed; retrying on the next turn");
                }
                tokio::select! {
                    () = loop_cancel.cancelled() => break,
                    () = tokio::time::sleep(interval) => {}
                }
            }
        });

        *poller = Some(Poller { cancel, task });
    }

    /// Stops the polling loop; safe to call when not running.
    pub async fn stop(&self) {
        let mut poller = self.poller.lock().await;
        stop_poller(poller.take()).await;
    }

    /// Returns true while a polling task is live.
    pub async fn is_running(&self) -> bool {
        self.poller
            .lock()
            .await
            .as_ref()
            .is_some_and(|poller| !poller.task.is_finished())
    }
}

impl Default for PollingSupervisor {
    fn default() -> Self {
        Self::new()
    }
}

async fn stop_poller(poller: Option<Poller>) {
    let Some(active) = poller else {
        return;
    };

    active.cancel.cancel();
    if let Err(error) = active.task.await {
        warn!(error = %error, "polling task did not shut down cleanly");
    }
}
