use std::{sync::Arc, time::Duration};

use tokio::{
    sync::watch,
    task::{JoinError, JoinHandle},
    time::{MissedTickBehavior, interval},
};

use crate::desk::ExchangeDesk;

/// Background task that expires overdue pending requests on a fixed period.
pub struct ExpirySweeper {
    shutdown: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl ExpirySweeper {
    pub fn spawn(desk: Arc<ExchangeDesk>, period: Duration) -> Self {
        let (shutdown, mut shutdown_rx) = watch::channel(false);
        let handle = tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            tracing::info!(
                target: "exchange_desk",
                period_ms = period.as_millis() as u64,
                "expiry_sweeper_started"
            );

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        desk.sweep_expired().await;
                    }
                    changed = shutdown_rx.changed() => {
                        if changed.is_err() || *shutdown_rx.borrow() {
                            break;
                        }
                    }
                }
            }

            tracing::info!(target: "exchange_desk", "expiry_sweeper_stopped");
        });

        Self { shutdown, handle }
    }

    pub async fn stop(self) -> Result<(), JoinError> {
        let _ = self.shutdown.send(true);
        self.handle.await
    }
}
