//! Periodic job ending scorebooks nobody touched for a while.

use std::{sync::Arc, time::Duration};

use engine::{BookEvent, Engine};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::realtime::Hub;

pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(60 * 60);
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);
pub const DEFAULT_INACTIVE_DAYS: i64 = 7;

#[derive(Debug, Clone)]
pub struct IdleSweep {
    engine: Arc<Engine>,
    hub: Arc<Hub>,
    interval: Duration,
    timeout: Duration,
    inactive_for: chrono::Duration,
}

impl IdleSweep {
    pub fn new(engine: Arc<Engine>, hub: Arc<Hub>) -> Self {
        Self {
            engine,
            hub,
            interval: DEFAULT_INTERVAL,
            timeout: DEFAULT_TIMEOUT,
            inactive_for: chrono::Duration::days(DEFAULT_INACTIVE_DAYS),
        }
    }

    #[must_use]
    pub fn interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn inactive_for(mut self, inactive_for: chrono::Duration) -> Self {
        self.inactive_for = inactive_for;
        self
    }

    /// Sweep now, then on every interval tick until `shutdown` is cancelled.
    pub async fn run(self, shutdown: CancellationToken) {
        let mut ticker = tokio::time::interval(self.interval.max(Duration::from_secs(1)));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tracing::info!(
            interval_secs = self.interval.as_secs(),
            inactive_days = self.inactive_for.num_days(),
            "idle sweep started"
        );
        loop {
            tokio::select! {
                () = shutdown.cancelled() => {
                    tracing::info!("idle sweep stopped");
                    break;
                }
                _ = ticker.tick() => {
                    self.run_once().await;
                }
            }
        }
    }

    /// One bounded sweep. Returns the number of books it ended.
    pub async fn run_once(&self) -> usize {
        let sweep = self.engine.end_inactive_books(self.inactive_for);
        match tokio::time::timeout(self.timeout, sweep).await {
            Ok(Ok(ended)) => {
                for book in &ended {
                    self.hub.broadcast(book.book.id, &BookEvent::book_ended(book));
                }
                tracing::info!(ended = ended.len(), "idle sweep finished");
                ended.len()
            }
            Ok(Err(err)) => {
                tracing::error!("idle sweep failed: {err}");
                0
            }
            Err(_) => {
                tracing::warn!(timeout_secs = self.timeout.as_secs(), "idle sweep timed out");
                0
            }
        }
    }
}
