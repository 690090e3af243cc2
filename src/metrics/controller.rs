use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, instrument, warn};

use crate::api::{ApiError, MetricsSnapshot, ScoringApi};
use crate::shared::{ClientError, Liveness};

pub const ADMIN_API_KEY_REQUIRED: &str = "Admin API key is required";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetricsState {
    pub metrics: Option<MetricsSnapshot>,
    pub is_loading: bool,
    pub error: Option<String>,
    /// Server message from the most recent successful reset.
    pub last_reset: Option<String>,
}

/// Admin view over the service-wide performance counters.
pub struct MetricsController {
    api: Arc<dyn ScoringApi>,
    state: RwLock<MetricsState>,
    liveness: Liveness,
}

impl MetricsController {
    pub fn new(api: Arc<dyn ScoringApi>) -> Self {
        Self {
            api,
            state: RwLock::new(MetricsState::default()),
            liveness: Liveness::new(),
        }
    }

    pub async fn snapshot(&self) -> MetricsState {
        self.state.read().await.clone()
    }

    pub async fn metrics(&self) -> Option<MetricsSnapshot> {
        self.state.read().await.metrics.clone()
    }

    pub async fn error(&self) -> Option<String> {
        self.state.read().await.error.clone()
    }

    pub async fn clear_error(&self) {
        self.state.write().await.error = None;
    }

    pub fn close(&self) {
        self.liveness.close();
    }

    #[instrument(skip(self, admin_api_key))]
    pub async fn load_metrics(&self, admin_api_key: &str) -> Result<MetricsSnapshot, ClientError> {
        self.require_key(admin_api_key).await?;
        self.start().await;

        let result = self.api.metrics(admin_api_key).await;
        match result {
            Ok(metrics) => {
                self.finish(|state| state.metrics = Some(metrics.clone())).await;
                Ok(metrics)
            }
            Err(e) => Err(self.fail(e).await),
        }
    }

    /// Clears the server's counters, then reloads the (now empty) snapshot.
    #[instrument(skip(self, admin_api_key))]
    pub async fn reset_metrics(&self, admin_api_key: &str) -> Result<MetricsSnapshot, ClientError> {
        self.require_key(admin_api_key).await?;
        self.start().await;

        match self.api.reset_metrics(admin_api_key).await {
            Ok(reset) => {
                info!(message = %reset.message, "Metrics reset");
                self.finish(|state| state.last_reset = Some(reset.message)).await;
            }
            Err(e) => return Err(self.fail(e).await),
        }

        self.load_metrics(admin_api_key).await
    }

    async fn require_key(&self, admin_api_key: &str) -> Result<(), ClientError> {
        if !admin_api_key.trim().is_empty() {
            return Ok(());
        }
        if self.liveness.is_alive() {
            self.state.write().await.error = Some(ADMIN_API_KEY_REQUIRED.to_string());
        }
        Err(ClientError::precondition(ADMIN_API_KEY_REQUIRED))
    }

    async fn start(&self) {
        let mut state = self.state.write().await;
        state.is_loading = true;
        state.error = None;
    }

    async fn finish<F>(&self, apply: F)
    where
        F: FnOnce(&mut MetricsState),
    {
        if !self.liveness.is_alive() {
            return;
        }
        let mut state = self.state.write().await;
        state.is_loading = false;
        apply(&mut *state);
    }

    async fn fail(&self, error: ApiError) -> ClientError {
        warn!(code = %error.code, "Metrics request failed");
        let message = error.message.clone();
        self.finish(|state| state.error = Some(message)).await;
        ClientError::Api(error)
    }
}

impl Drop for MetricsController {
    fn drop(&mut self) {
        self.liveness.close();
    }
}
