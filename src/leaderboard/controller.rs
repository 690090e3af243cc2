use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, instrument, warn};

use crate::api::{LeaderboardEntry, LeaderboardQuery, LeaderboardResponse, LeaderboardScope, ScoringApi};
use crate::shared::{ClientError, Liveness};

pub const DEFAULT_LEADERBOARD_LIMIT: u32 = 20;

#[derive(Debug, Clone, PartialEq)]
pub struct LeaderboardState {
    pub scope: LeaderboardScope,
    /// 1-based.
    pub page: u32,
    pub limit: u32,
    pub response: Option<LeaderboardResponse>,
    pub is_loading: bool,
    pub error: Option<String>,
}

impl LeaderboardState {
    fn new(limit: u32) -> Self {
        Self {
            scope: LeaderboardScope::default(),
            page: 1,
            limit,
            response: None,
            is_loading: false,
            error: None,
        }
    }

    pub fn has_more(&self) -> bool {
        self.response
            .as_ref()
            .is_some_and(|response| response.pagination.has_more)
    }
}

/// Pages through the ranking. Every navigation goes through `load`; a failed
/// load keeps the previous page visible.
pub struct LeaderboardController {
    api: Arc<dyn ScoringApi>,
    state: RwLock<LeaderboardState>,
    liveness: Liveness,
}

impl LeaderboardController {
    pub fn new(api: Arc<dyn ScoringApi>) -> Self {
        Self::with_limit(api, DEFAULT_LEADERBOARD_LIMIT)
    }

    pub fn with_limit(api: Arc<dyn ScoringApi>, limit: u32) -> Self {
        Self {
            api,
            state: RwLock::new(LeaderboardState::new(limit.max(1))),
            liveness: Liveness::new(),
        }
    }

    pub async fn snapshot(&self) -> LeaderboardState {
        self.state.read().await.clone()
    }

    pub async fn entries(&self) -> Vec<LeaderboardEntry> {
        self.state
            .read()
            .await
            .response
            .as_ref()
            .map(|response| response.entries.clone())
            .unwrap_or_default()
    }

    pub async fn scope(&self) -> LeaderboardScope {
        self.state.read().await.scope
    }

    pub async fn current_page(&self) -> u32 {
        self.state.read().await.page
    }

    pub async fn has_more(&self) -> bool {
        self.state.read().await.has_more()
    }

    pub async fn total(&self) -> Option<u64> {
        self.state
            .read()
            .await
            .response
            .as_ref()
            .map(|response| response.pagination.total)
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

    #[instrument(skip(self))]
    pub async fn load(
        &self,
        scope: LeaderboardScope,
        page: u32,
    ) -> Result<LeaderboardResponse, ClientError> {
        let page = page.max(1);
        let query = {
            let mut state = self.state.write().await;
            state.is_loading = true;
            state.error = None;
            LeaderboardQuery {
                scope: Some(scope),
                limit: Some(state.limit),
                page: Some(page),
                offset: None,
            }
        };

        let result = self.api.leaderboard(&query).await;
        if !self.liveness.is_alive() {
            return result.map_err(ClientError::Api);
        }

        let mut state = self.state.write().await;
        state.is_loading = false;
        match result {
            Ok(response) => {
                debug!(
                    scope = %scope,
                    page,
                    entries = response.entries.len(),
                    has_more = response.pagination.has_more,
                    "Leaderboard page loaded"
                );
                state.scope = scope;
                state.page = page;
                state.response = Some(response.clone());
                Ok(response)
            }
            Err(e) => {
                warn!(scope = %scope, page, code = %e.code, "Leaderboard load failed; keeping previous page");
                state.error = Some(e.message.clone());
                Err(ClientError::Api(e))
            }
        }
    }

    /// Switches scope and goes back to the first page.
    pub async fn set_scope(&self, scope: LeaderboardScope) -> Result<LeaderboardResponse, ClientError> {
        self.load(scope, 1).await
    }

    /// Loads the next page, or does nothing when the last response said
    /// there is no more.
    pub async fn next_page(&self) -> Result<Option<LeaderboardResponse>, ClientError> {
        let (scope, page, has_more) = {
            let state = self.state.read().await;
            (state.scope, state.page, state.has_more())
        };
        if !has_more {
            debug!(page, "Already on the last leaderboard page");
            return Ok(None);
        }
        self.load(scope, page + 1).await.map(Some)
    }

    pub async fn previous_page(&self) -> Result<Option<LeaderboardResponse>, ClientError> {
        let (scope, page) = {
            let state = self.state.read().await;
            (state.scope, state.page)
        };
        if page <= 1 {
            debug!("Already on the first leaderboard page");
            return Ok(None);
        }
        self.load(scope, page - 1).await.map(Some)
    }

    pub async fn refresh(&self) -> Result<LeaderboardResponse, ClientError> {
        let (scope, page) = {
            let state = self.state.read().await;
            (state.scope, state.page)
        };
        self.load(scope, page).await
    }
}

impl Drop for LeaderboardController {
    fn drop(&mut self) {
        self.liveness.close();
    }
}
