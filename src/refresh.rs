use futures::future::BoxFuture;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::debug;

/// Background polling timer. The first run happens one interval after
/// spawning; the task stops on `cancel()` or when this handle is dropped.
#[derive(Debug)]
pub struct AutoRefresh {
    every: Duration,
    handle: JoinHandle<()>,
}

impl AutoRefresh {
    pub fn spawn<F>(every: Duration, mut tick: F) -> Self
    where
        F: FnMut() -> BoxFuture<'static, ()> + Send + 'static,
    {
        let handle = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + every, every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                debug!(every_ms = every.as_millis() as u64, "Auto-refresh tick");
                tick().await;
            }
        });
        Self { every, handle }
    }

    pub fn every(&self) -> Duration {
        self.every
    }

    pub fn cancel(&self) {
        self.handle.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for AutoRefresh {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
