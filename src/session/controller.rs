use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, instrument, warn};

use super::store::{SessionStore, SESSION_ID_KEY};
use crate::api::{
    AnswerResult, AnswerStats, ApiError, Difficulty, GameMode, Question, ScoringApi, Session,
    SessionEnded, SessionId, SubmitAnswerRequest,
};
use crate::shared::{ClientError, Liveness};
use crate::validation::{sanitize_player_name, validate_numeric_answer, validate_player_name};

pub const NO_ACTIVE_SESSION: &str = "No active session";
pub const NO_ACTIVE_QUESTION: &str = "No active session or question";

/// Observable state of one play-through.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionState {
    pub session_id: Option<SessionId>,
    /// Details from "start session"; `None` when the id was restored from the store.
    pub session: Option<Session>,
    pub current_question: Option<Question>,
    pub stats: Option<AnswerStats>,
    pub score: i64,
    pub previous_score: i64,
    pub is_loading: bool,
    pub last_error: Option<String>,
}

/// Drives a play-through: start, generate, submit, end.
///
/// Every operation returns a `Result` and also mirrors its failure into
/// `last_error`, which the UI observes. Overlapping operations are rejected
/// with `ClientError::Busy`.
pub struct GameSessionController {
    api: Arc<dyn ScoringApi>,
    store: Arc<dyn SessionStore>,
    state: Arc<RwLock<SessionState>>,
    liveness: Liveness,
}

impl GameSessionController {
    /// Creates a controller and restores any session id left in the store.
    ///
    /// The restored id is not checked against the server; a stale id fails
    /// on the next remote call like any other server error.
    #[instrument(skip(api, store))]
    pub async fn mount(api: Arc<dyn ScoringApi>, store: Arc<dyn SessionStore>) -> Self {
        let controller = Self {
            api,
            store,
            state: Arc::new(RwLock::new(SessionState::default())),
            liveness: Liveness::new(),
        };
        controller.restore().await;
        controller
    }

    async fn restore(&self) {
        let stored = match self.store.get(SESSION_ID_KEY).await {
            Ok(stored) => stored,
            Err(e) => {
                warn!(error = %e, "Could not read persisted session id");
                return;
            }
        };

        let Some(raw) = stored else {
            debug!("No persisted session to restore");
            return;
        };

        match raw.trim().parse::<SessionId>() {
            Ok(session_id) if session_id > 0 => {
                info!(session_id, "Restored session from store");
                self.state.write().await.session_id = Some(session_id);
            }
            _ => {
                warn!(value = %raw, "Discarding unusable persisted session id");
                self.forget_persisted().await;
            }
        }
    }

    pub async fn snapshot(&self) -> SessionState {
        self.state.read().await.clone()
    }

    pub async fn session_id(&self) -> Option<SessionId> {
        self.state.read().await.session_id
    }

    pub async fn current_question(&self) -> Option<Question> {
        self.state.read().await.current_question.clone()
    }

    pub async fn stats(&self) -> Option<AnswerStats> {
        self.state.read().await.stats.clone()
    }

    pub async fn is_loading(&self) -> bool {
        self.state.read().await.is_loading
    }

    pub async fn last_error(&self) -> Option<String> {
        self.state.read().await.last_error.clone()
    }

    pub async fn clear_error(&self) {
        self.state.write().await.last_error = None;
    }

    /// Stops any further state writes from work still in flight.
    pub fn close(&self) {
        self.liveness.close();
    }

    #[instrument(skip(self))]
    pub async fn start_session(
        &self,
        player_name: &str,
        mode: Option<GameMode>,
        difficulty: Option<Difficulty>,
    ) -> Result<SessionId, ClientError> {
        if let Err(e) = validate_player_name(player_name) {
            return Err(self.fail_fast(e.into()).await);
        }
        let player_name = sanitize_player_name(player_name);

        self.begin().await?;
        let result = self.api.create_session(&player_name, mode, difficulty).await;

        match result {
            Ok(created) => {
                let session = Session::from_created(created, mode, difficulty);
                let session_id = session.session_id;
                self.commit(|state| {
                    state.session_id = Some(session_id);
                    state.session = Some(session);
                    state.current_question = None;
                    state.stats = None;
                    state.score = 0;
                    state.previous_score = 0;
                    state.is_loading = false;
                })
                .await;

                if self.liveness.is_alive() {
                    if let Err(e) = self.store.set(SESSION_ID_KEY, &session_id.to_string()).await {
                        warn!(session_id, error = %e, "Could not persist session id");
                    }
                }
                info!(session_id, player_name = %player_name, "Session started");
                Ok(session_id)
            }
            Err(e) => Err(self.fail(e).await),
        }
    }

    #[instrument(skip(self))]
    pub async fn generate_question(
        &self,
        mode: GameMode,
        difficulty: Difficulty,
    ) -> Result<Question, ClientError> {
        let Some(session_id) = self.session_id().await else {
            return Err(self
                .fail_fast(ClientError::precondition(NO_ACTIVE_SESSION))
                .await);
        };

        self.begin().await?;
        match self.api.generate_question(session_id, mode, difficulty).await {
            Ok(question) => {
                debug!(session_id, question_id = %question.question_id, "Question received");
                let current = question.clone();
                self.commit_for(session_id, |state| {
                    state.current_question = Some(current);
                    state.is_loading = false;
                })
                .await;
                Ok(question)
            }
            Err(e) => Err(self.fail_for(session_id, e).await),
        }
    }

    /// Submits an answer for the current question.
    ///
    /// The question stays current afterwards; advancing is up to the caller
    /// so feedback can be shown first.
    #[instrument(skip(self))]
    pub async fn submit_answer(
        &self,
        user_answer: &str,
        elapsed_ms: u64,
    ) -> Result<AnswerResult, ClientError> {
        let (session_id, question) = {
            let state = self.state.read().await;
            (state.session_id, state.current_question.clone())
        };
        let (Some(session_id), Some(question)) = (session_id, question) else {
            return Err(self
                .fail_fast(ClientError::precondition(NO_ACTIVE_QUESTION))
                .await);
        };

        if let Err(e) = validate_numeric_answer(user_answer) {
            return Err(self.fail_fast(e.into()).await);
        }

        self.begin().await?;
        let request = SubmitAnswerRequest::for_question(session_id, &question, user_answer, elapsed_ms);

        match self.api.submit_answer(&request).await {
            Ok(result) => {
                let stats = result.stats.clone();
                let total_score = result.total_score;
                self.commit_for(session_id, |state| {
                    state.previous_score = state.score;
                    state.score = total_score;
                    state.stats = Some(stats);
                    state.is_loading = false;
                })
                .await;
                info!(
                    session_id,
                    question_id = %question.question_id,
                    is_correct = result.is_correct,
                    score_delta = result.score_delta,
                    total_score,
                    "Answer scored"
                );
                Ok(result)
            }
            Err(e) => Err(self.fail_for(session_id, e).await),
        }
    }

    /// Ends the session on the server and always clears local state.
    ///
    /// Returns `Ok(None)` when there is no session to end. Local state and
    /// the persisted id are cleared before the server call, so this is never
    /// rejected as `Busy`; results of other calls still in flight for the
    /// ended session are dropped. If the server call fails the error is
    /// returned, but the session is gone locally.
    #[instrument(skip(self))]
    pub async fn end_session(&self) -> Result<Option<SessionEnded>, ClientError> {
        let session_id = {
            let mut state = self.state.write().await;
            let Some(session_id) = state.session_id.take() else {
                return Ok(None);
            };
            state.session = None;
            state.current_question = None;
            state.stats = None;
            state.is_loading = true;
            state.last_error = None;
            session_id
        };
        self.forget_persisted().await;

        let result = self.api.end_session(session_id).await;

        let error_message = result.as_ref().err().map(|e| e.message.clone());
        self.commit(|state| {
            state.is_loading = false;
            state.last_error = error_message;
        })
        .await;

        match result {
            Ok(ended) => {
                info!(session_id, "Session ended");
                Ok(Some(ended))
            }
            Err(e) => {
                warn!(session_id, code = %e.code, "Session end failed remotely; cleared locally");
                Err(ClientError::Api(e))
            }
        }
    }

    /// Abandons the session without telling the server.
    #[instrument(skip(self))]
    pub async fn reset(&self) {
        self.commit(|state| *state = SessionState::default()).await;
        self.forget_persisted().await;
        info!("Session state reset");
    }

    /// Fetches the server-side summary of the active session.
    #[instrument(skip(self))]
    pub async fn summary(&self) -> Result<serde_json::Value, ClientError> {
        let Some(session_id) = self.session_id().await else {
            return Err(self
                .fail_fast(ClientError::precondition(NO_ACTIVE_SESSION))
                .await);
        };

        self.begin().await?;
        match self.api.session_summary(session_id).await {
            Ok(summary) => {
                self.commit_for(session_id, |state| state.is_loading = false)
                    .await;
                Ok(summary)
            }
            Err(e) => Err(self.fail_for(session_id, e).await),
        }
    }

    /// Marks an operation as in flight, clearing the previous error.
    async fn begin(&self) -> Result<(), ClientError> {
        let mut state = self.state.write().await;
        if state.is_loading {
            let error = ClientError::Busy;
            state.last_error = Some(error.to_string());
            return Err(error);
        }
        state.is_loading = true;
        state.last_error = None;
        Ok(())
    }

    /// Applies a state change unless the controller has been closed.
    async fn commit<F>(&self, apply: F)
    where
        F: FnOnce(&mut SessionState),
    {
        if !self.liveness.is_alive() {
            debug!("Controller closed; dropping state update");
            return;
        }
        apply(&mut *self.state.write().await);
    }

    /// Like `commit`, but drops the update when the session it was made for
    /// has since been ended or replaced. The loading flag then belongs to
    /// whichever operation cleared the session.
    async fn commit_for<F>(&self, session_id: SessionId, apply: F) -> bool
    where
        F: FnOnce(&mut SessionState),
    {
        if !self.liveness.is_alive() {
            debug!("Controller closed; dropping state update");
            return false;
        }
        let mut state = self.state.write().await;
        if state.session_id != Some(session_id) {
            debug!(session_id, "Session no longer active; dropping state update");
            return false;
        }
        apply(&mut *state);
        true
    }

    async fn fail_for(&self, session_id: SessionId, error: ApiError) -> ClientError {
        let message = error.message.clone();
        self.commit_for(session_id, |state| {
            state.is_loading = false;
            state.last_error = Some(message);
        })
        .await;
        ClientError::Api(error)
    }

    async fn fail(&self, error: ApiError) -> ClientError {
        let message = error.message.clone();
        self.commit(|state| {
            state.is_loading = false;
            state.last_error = Some(message);
        })
        .await;
        ClientError::Api(error)
    }

    /// Records a locally detected error without touching the loading flag.
    async fn fail_fast(&self, error: ClientError) -> ClientError {
        let message = error.to_string();
        self.commit(|state| state.last_error = Some(message)).await;
        error
    }

    async fn forget_persisted(&self) {
        if let Err(e) = self.store.remove(SESSION_ID_KEY).await {
            warn!(error = %e, "Could not remove persisted session id");
        }
    }
}

impl Drop for GameSessionController {
    fn drop(&mut self) {
        self.liveness.close();
    }
}
