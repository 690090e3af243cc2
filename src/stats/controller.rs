use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use crate::api::{ApiError, PlayerMetrics, PlayerStats, ScoringApi};
use crate::shared::{ClientError, Liveness};
use crate::validation::ValidationError;

/// Shown instead of a raw error when stats are still missing after the retry.
pub const STATS_PROCESSING_MESSAGE: &str =
    "Stats are still being processed. Please refresh in a moment.";

/// Where a `load_stats` call is in its lifecycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RetryPhase {
    #[default]
    Idle,
    FirstAttempt,
    Retrying,
    Settled,
}

/// Per-call retry budget. Travels with the call rather than living on the
/// controller, so a new load can never inherit an older load's count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    attempt: u8,
}

impl RetryPolicy {
    pub const MAX_RETRIES: u8 = 1;

    pub fn first() -> Self {
        Self { attempt: 0 }
    }

    pub fn attempt(&self) -> u8 {
        self.attempt
    }

    /// Only a not-found on an attempt that still has budget is retried.
    pub fn should_retry(&self, error: &ApiError) -> bool {
        self.attempt < Self::MAX_RETRIES && error.is_not_found()
    }

    pub fn next(self) -> Self {
        Self {
            attempt: self.attempt.saturating_add(1),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatsState {
    pub stats: Option<PlayerStats>,
    pub metrics: Option<PlayerMetrics>,
    pub is_loading: bool,
    pub error: Option<String>,
    pub phase: RetryPhase,
}

impl StatsState {
    fn stats_pending(&self) -> bool {
        matches!(self.phase, RetryPhase::FirstAttempt | RetryPhase::Retrying)
    }
}

/// Outcome of a `load_stats` call that did not fail outright.
#[derive(Debug, Clone, PartialEq)]
pub enum StatsLoad {
    Loaded(PlayerStats),
    /// The first attempt hit a not-found; the result will land in state
    /// once the delayed retry completes.
    RetryScheduled,
}

struct Inner {
    api: Arc<dyn ScoringApi>,
    player_name: String,
    retry_delay: Duration,
    state: RwLock<StatsState>,
    generation: AtomicU64,
    liveness: Liveness,
}

impl Inner {
    fn is_current(&self, generation: u64) -> bool {
        self.liveness.is_alive() && self.generation.load(Ordering::Acquire) == generation
    }

    /// Applies a state change only if the call that produced it is still the
    /// latest one and the controller is alive.
    async fn commit<F>(&self, generation: u64, apply: F) -> bool
    where
        F: FnOnce(&mut StatsState),
    {
        if !self.is_current(generation) {
            debug!(generation, "Dropping superseded stats update");
            return false;
        }
        apply(&mut *self.state.write().await);
        true
    }

    /// Applies a state change that is not tied to a `load_stats` generation.
    async fn update<F>(&self, apply: F)
    where
        F: FnOnce(&mut StatsState),
    {
        if self.liveness.is_alive() {
            apply(&mut *self.state.write().await);
        }
    }

    async fn settle(&self, generation: u64, outcome: Result<PlayerStats, String>) {
        self.commit(generation, |state| {
            match outcome {
                Ok(stats) => {
                    state.stats = Some(stats);
                    state.error = None;
                }
                Err(message) => state.error = Some(message),
            }
            state.is_loading = false;
            state.phase = RetryPhase::Settled;
        })
        .await;
    }

    async fn retry_after_delay(self: Arc<Self>, generation: u64, policy: RetryPolicy) {
        tokio::time::sleep(self.retry_delay).await;
        if !self.is_current(generation) {
            return;
        }

        debug!(player_name = %self.player_name, attempt = policy.attempt(), "Retrying stats fetch");
        let outcome = match self.api.player_stats(&self.player_name).await {
            Ok(stats) => {
                info!(player_name = %self.player_name, "Stats available after retry");
                Ok(stats)
            }
            Err(e) if e.is_not_found() => {
                warn!(player_name = %self.player_name, "Stats still missing after retry");
                Err(STATS_PROCESSING_MESSAGE.to_string())
            }
            Err(e) => {
                warn!(player_name = %self.player_name, code = %e.code, "Stats retry failed");
                Err(e.message)
            }
        };
        self.settle(generation, outcome).await;
    }
}

/// Loads one player's aggregate stats, absorbing the short window after a
/// session ends during which the server may not have them yet.
pub struct StatsController {
    inner: Arc<Inner>,
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl StatsController {
    pub fn new(api: Arc<dyn ScoringApi>, player_name: impl Into<String>, retry_delay: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                api,
                player_name: player_name.into(),
                retry_delay,
                state: RwLock::new(StatsState::default()),
                generation: AtomicU64::new(0),
                liveness: Liveness::new(),
            }),
            pending: Mutex::new(None),
        }
    }

    pub fn player_name(&self) -> &str {
        &self.inner.player_name
    }

    pub async fn snapshot(&self) -> StatsState {
        self.inner.state.read().await.clone()
    }

    pub async fn stats(&self) -> Option<PlayerStats> {
        self.inner.state.read().await.stats.clone()
    }

    pub async fn error(&self) -> Option<String> {
        self.inner.state.read().await.error.clone()
    }

    pub async fn is_loading(&self) -> bool {
        self.inner.state.read().await.is_loading
    }

    pub async fn clear_error(&self) {
        self.inner.state.write().await.error = None;
    }

    /// Fetches the player's stats.
    ///
    /// A not-found on the first attempt schedules one retry after the
    /// configured delay and returns `StatsLoad::RetryScheduled`; the retry's
    /// outcome is written to state. Calling again supersedes a pending retry.
    #[instrument(skip(self), fields(player_name = %self.inner.player_name))]
    pub async fn load_stats(&self) -> Result<StatsLoad, ClientError> {
        let generation = self.inner.generation.fetch_add(1, Ordering::AcqRel) + 1;
        self.cancel_pending();

        if self.inner.player_name.trim().is_empty() {
            let error = ClientError::Validation(ValidationError::PlayerNameRequired);
            let message = error.to_string();
            self.inner
                .commit(generation, |state| state.error = Some(message))
                .await;
            return Err(error);
        }

        self.inner
            .commit(generation, |state| {
                state.is_loading = true;
                state.error = None;
                state.phase = RetryPhase::FirstAttempt;
            })
            .await;

        let policy = RetryPolicy::first();
        match self.inner.api.player_stats(&self.inner.player_name).await {
            Ok(stats) => {
                self.inner.settle(generation, Ok(stats.clone())).await;
                Ok(StatsLoad::Loaded(stats))
            }
            Err(e) if policy.should_retry(&e) => {
                let scheduled = self
                    .inner
                    .commit(generation, |state| state.phase = RetryPhase::Retrying)
                    .await;
                if scheduled {
                    info!(delay_ms = self.inner.retry_delay.as_millis() as u64, "Stats not ready; retry scheduled");
                    let task = Arc::clone(&self.inner).retry_after_delay(generation, policy.next());
                    self.set_pending(tokio::spawn(task));
                }
                Ok(StatsLoad::RetryScheduled)
            }
            Err(e) => {
                warn!(code = %e.code, "Stats fetch failed");
                self.inner.settle(generation, Err(e.message.clone())).await;
                Err(ClientError::Api(e))
            }
        }
    }

    /// Same as `load_stats`; the retry budget starts fresh.
    pub async fn refresh(&self) -> Result<StatsLoad, ClientError> {
        self.load_stats().await
    }

    /// Waits for a scheduled retry, if any, to finish.
    pub async fn settle(&self) {
        let handle = self.take_pending();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                if !e.is_cancelled() {
                    warn!(error = %e, "Stats retry task failed");
                }
            }
        }
    }

    /// Fetches the richer per-player metrics view. Not retried.
    ///
    /// Shares the loading flag and error with `load_stats`, but leaves the
    /// flag set while a stats retry is still pending.
    #[instrument(skip(self), fields(player_name = %self.inner.player_name))]
    pub async fn load_metrics(&self) -> Result<PlayerMetrics, ClientError> {
        if self.inner.player_name.trim().is_empty() {
            let error = ClientError::Validation(ValidationError::PlayerNameRequired);
            let message = error.to_string();
            self.inner.update(|state| state.error = Some(message)).await;
            return Err(error);
        }

        self.inner
            .update(|state| {
                state.is_loading = true;
                state.error = None;
            })
            .await;

        let result = self.inner.api.player_metrics(&self.inner.player_name).await;
        match result {
            Ok(metrics) => {
                let loaded = metrics.clone();
                self.inner
                    .update(|state| {
                        state.metrics = Some(loaded);
                        state.is_loading = state.stats_pending();
                    })
                    .await;
                Ok(metrics)
            }
            Err(e) => {
                warn!(code = %e.code, "Player metrics fetch failed");
                let message = e.message.clone();
                self.inner
                    .update(|state| {
                        state.error = Some(message);
                        state.is_loading = state.stats_pending();
                    })
                    .await;
                Err(ClientError::Api(e))
            }
        }
    }

    pub fn close(&self) {
        self.inner.liveness.close();
        self.cancel_pending();
    }

    fn cancel_pending(&self) {
        if let Some(handle) = self.take_pending() {
            debug!("Superseding pending stats retry");
            handle.abort();
        }
    }

    fn take_pending(&self) -> Option<JoinHandle<()>> {
        self.pending
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take()
    }

    fn set_pending(&self, handle: JoinHandle<()>) {
        *self
            .pending
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(handle);
    }
}

impl Drop for StatsController {
    fn drop(&mut self) {
        self.close();
    }
}
