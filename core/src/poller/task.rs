use std::time::Duration;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use super::Poller;

/// Runs `Poller::tick` on a fixed interval until stopped.
pub struct PollTask {
    shutdown_tx: oneshot::Sender<()>,
    handle: JoinHandle<Poller>,
}

impl PollTask {
    /// The first tick fires one full `period` after spawning.
    pub fn spawn(mut poller: Poller, period: Duration) -> Self {
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel::<()>();

        let handle = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            tracing::info!(interval_ms = period.as_millis() as u64, "poller started");

            loop {
                tokio::select! {
                    _ = &mut shutdown_rx => break,
                    _ = ticker.tick() => {
                        let outcome = poller.tick().await;
                        tracing::trace!(?outcome, "tick finished");
                    }
                }
            }

            poller.close();
            tracing::info!("poller stopped");
            poller
        });

        Self {
            shutdown_tx,
            handle,
        }
    }

    /// Waits for an in-flight tick to finish, closes the store and returns the
    /// poller.
    pub async fn stop(self) -> Option<Poller> {
        let _ = self.shutdown_tx.send(());
        match self.handle.await {
            Ok(poller) => Some(poller),
            Err(e) => {
                tracing::error!("poll task ended abnormally: {e}");
                None
            }
        }
    }
}
