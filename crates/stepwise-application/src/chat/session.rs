use crate::navigation::{ActiveStep, NavigationEngine};
use futures::StreamExt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use stepwise_core::assistant::{
    AssistantBackend, ChatEvent, ChatRequest, SubtaskContext, ValidationOutcome,
    ValidationRequest,
};
use stepwise_core::auth::AuthProvider;
use stepwise_core::error::StepwiseError;
use stepwise_core::location::StepLocation;
use stepwise_core::progress::ProgressRepository;
use stepwise_core::transcript::{ChatMessage, TranscriptKey, TranscriptRepository, welcome_text};
use tokio::sync::{Mutex, RwLock};
use tokio_util::sync::CancellationToken;

pub const APOLOGY_MESSAGE: &str =
    "Sorry, I couldn't respond just now. Please try sending your message again.";

#[derive(Debug, Default)]
struct SessionState {
    /// Step the messages below belong to.
    location: Option<StepLocation>,
    input: String,
    messages: Vec<ChatMessage>,
    is_streaming: bool,
    validation: Option<ValidationOutcome>,
    is_validating: bool,
    /// Team member that answered last; sent with the next turn.
    agent_role: Option<String>,
}

impl SessionState {
    /// Drops per-step state when the selection moved to another step.
    fn switch_to(&mut self, location: &StepLocation) {
        if self.location.as_ref() != Some(location) {
            self.location = Some(location.clone());
            self.messages.clear();
            self.validation = None;
            self.agent_role = None;
        }
    }
}

enum TurnEnd {
    Finished,
    Superseded,
    Failed(StepwiseError),
}

/// Chat and submission state for the selected step.
///
/// At most one reply streams at a time: a new [`ChatSession::send`] closes the
/// previous stream. Stream and validation failures never propagate; they turn
/// into an apology message or a failed validation result.
pub struct ChatSession {
    engine: Arc<NavigationEngine>,
    transcripts: Arc<dyn TranscriptRepository>,
    progress: Arc<dyn ProgressRepository>,
    backend: Arc<dyn AssistantBackend>,
    auth: Arc<dyn AuthProvider>,
    session_id: String,
    state: RwLock<SessionState>,
    /// Turn number and cancel token of the reply currently streaming.
    active_stream: Mutex<Option<(u64, CancellationToken)>>,
    turns: AtomicU64,
}

impl ChatSession {
    pub fn new(
        engine: Arc<NavigationEngine>,
        transcripts: Arc<dyn TranscriptRepository>,
        progress: Arc<dyn ProgressRepository>,
        backend: Arc<dyn AssistantBackend>,
        auth: Arc<dyn AuthProvider>,
        session_id: impl Into<String>,
    ) -> Self {
        Self {
            engine,
            transcripts,
            progress,
            backend,
            auth,
            session_id: session_id.into(),
            state: RwLock::new(SessionState::default()),
            active_stream: Mutex::new(None),
            turns: AtomicU64::new(0),
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub async fn set_input(&self, input: impl Into<String>) {
        self.state.write().await.input = input.into();
    }

    pub async fn input(&self) -> String {
        self.state.read().await.input.clone()
    }

    pub async fn messages(&self) -> Vec<ChatMessage> {
        self.state.read().await.messages.clone()
    }

    pub async fn is_streaming(&self) -> bool {
        self.state.read().await.is_streaming
    }

    pub async fn validation(&self) -> Option<ValidationOutcome> {
        self.state.read().await.validation.clone()
    }

    pub async fn is_validating(&self) -> bool {
        self.state.read().await.is_validating
    }

    pub async fn agent_role(&self) -> Option<String> {
        self.state.read().await.agent_role.clone()
    }

    /// Token closing the reply currently streaming, if any.
    pub async fn cancel_handle(&self) -> Option<CancellationToken> {
        self.active_stream
            .lock()
            .await
            .as_ref()
            .map(|(_, token)| token.clone())
    }

    /// Loads the transcript of the selected step.
    ///
    /// A step without history gets the welcome message, stored once.
    pub async fn load_history(&self) -> Vec<ChatMessage> {
        let Some(active) = self.engine.current_step().await else {
            let mut state = self.state.write().await;
            let input = std::mem::take(&mut state.input);
            *state = SessionState {
                input,
                ..SessionState::default()
            };
            return Vec::new();
        };
        let location = active.location();

        let messages = match self.auth.user_id() {
            Some(user_id) => self.load_stored_history(&user_id, &active).await,
            None => vec![ChatMessage::assistant(
                welcome_text(&active.task_name, &active.step.objective),
                None,
            )],
        };

        let mut state = self.state.write().await;
        state.switch_to(&location);
        state.agent_role = messages.iter().rev().find_map(|m| m.agent_role.clone());
        state.messages = messages.clone();
        messages
    }

    async fn load_stored_history(&self, user_id: &str, active: &ActiveStep) -> Vec<ChatMessage> {
        let key = TranscriptKey::new(user_id, active.location());
        match self.transcripts.get_messages(&key).await {
            Ok(messages) if !messages.is_empty() => messages,
            Ok(_) => match self
                .transcripts
                .create_welcome_message(&key, &active.task_name, &active.step.objective)
                .await
            {
                Ok(welcome) => vec![welcome],
                Err(err) => {
                    tracing::warn!("[ChatSession] Failed to store welcome message: {}", err);
                    Vec::new()
                }
            },
            Err(err) => {
                tracing::warn!("[ChatSession] Failed to load transcript for {}: {}", key.location, err);
                Vec::new()
            }
        }
    }

    /// Sends the input as a chat turn and streams the reply.
    ///
    /// Returns `false` without doing anything when the input is blank, no step
    /// is selected or the step is already completed.
    pub async fn send(&self) -> bool {
        let text = self.state.read().await.input.trim().to_string();
        if text.is_empty() {
            return false;
        }
        let Some(active) = self.engine.current_step().await else {
            return false;
        };
        if active.step.is_completed {
            return false;
        }
        let location = active.location();

        let turn = self.turns.fetch_add(1, Ordering::Relaxed) + 1;
        let cancel = CancellationToken::new();
        if let Some((_, previous)) = self.active_stream.lock().await.replace((turn, cancel.clone())) {
            previous.cancel();
        }

        let user_message = ChatMessage::user(text.clone());
        let agent_role = {
            let mut state = self.state.write().await;
            state.switch_to(&location);
            state.input.clear();
            state.messages.push(user_message.clone());
            state.is_streaming = true;
            state
                .agent_role
                .clone()
                .or_else(|| non_empty(&active.step.primary_agent))
        };

        let user_id = self.auth.user_id();
        if let Some(user_id) = &user_id {
            self.persist_message(user_id, &location, &user_message).await;
            if let Err(err) = self.progress.record_chat_activity(user_id, &location).await {
                tracing::warn!("[ChatSession] Failed to record chat activity: {}", err);
            }
        }

        let request = ChatRequest {
            message: text,
            task_id: active.task_id.clone(),
            subtask: SubtaskContext::from(&active.subtask),
            step: active.step.clone(),
            session_id: self.session_id.clone(),
            agent_role,
        };

        let mut reply = ChatMessage::assistant(String::new(), request.agent_role.clone());
        match self.stream_reply(&request, &mut reply, &cancel).await {
            TurnEnd::Finished => {
                if !reply.content.is_empty() {
                    if let Some(user_id) = &user_id {
                        self.persist_message(user_id, &location, &reply).await;
                    }
                }
                self.finish_turn(turn).await;
            }
            TurnEnd::Superseded => {
                tracing::debug!("[ChatSession] Reply stream closed before completion");
                self.finish_turn(turn).await;
            }
            TurnEnd::Failed(err) => {
                tracing::warn!("[ChatSession] Chat stream failed: {}", err);
                let notice = if err.is_unauthorized() {
                    self.auth.force_sign_out(&err.to_string()).await;
                    err.user_message()
                } else {
                    APOLOGY_MESSAGE.to_string()
                };
                {
                    let mut state = self.state.write().await;
                    state.messages.retain(|m| m.id != reply.id);
                    state.messages.push(ChatMessage::assistant(notice, None));
                }
                self.finish_turn(turn).await;
            }
        }
        true
    }

    async fn stream_reply(
        &self,
        request: &ChatRequest,
        reply: &mut ChatMessage,
        cancel: &CancellationToken,
    ) -> TurnEnd {
        let token = match self.auth.bearer_token().await {
            Ok(token) => token,
            Err(err) => return TurnEnd::Failed(err),
        };
        let mut stream = tokio::select! {
            _ = cancel.cancelled() => return TurnEnd::Superseded,
            opened = self.backend.stream_chat(request, &token) => match opened {
                Ok(stream) => stream,
                Err(err) => return TurnEnd::Failed(err),
            },
        };

        self.state.write().await.messages.push(reply.clone());
        loop {
            let event = tokio::select! {
                _ = cancel.cancelled() => return TurnEnd::Superseded,
                event = stream.next() => event,
            };
            match event {
                Some(Ok(ChatEvent::Start { agent })) => {
                    if let Some(agent) = agent {
                        reply.agent_role = Some(agent.clone());
                        self.state.write().await.agent_role = Some(agent);
                        self.update_reply(reply).await;
                    }
                }
                Some(Ok(ChatEvent::Content(chunk))) => {
                    reply.content.push_str(&chunk);
                    self.update_reply(reply).await;
                }
                Some(Ok(ChatEvent::End)) | None => return TurnEnd::Finished,
                Some(Err(err)) => return TurnEnd::Failed(err),
            }
        }
    }

    async fn update_reply(&self, reply: &ChatMessage) {
        let mut state = self.state.write().await;
        if let Some(message) = state.messages.iter_mut().find(|m| m.id == reply.id) {
            message.content.clone_from(&reply.content);
            message.agent_role.clone_from(&reply.agent_role);
        }
    }

    /// Clears the streaming flag unless a newer turn has taken over.
    async fn finish_turn(&self, turn: u64) {
        let mut active = self.active_stream.lock().await;
        if active.as_ref().is_some_and(|(current, _)| *current == turn) {
            *active = None;
            self.state.write().await.is_streaming = false;
        }
    }

    async fn persist_message(&self, user_id: &str, location: &StepLocation, message: &ChatMessage) {
        let key = TranscriptKey::new(user_id, location.clone());
        if let Err(err) = self.transcripts.append_message(&key, message).await {
            tracing::warn!("[ChatSession] Failed to store message in {}: {}", location, err);
        }
    }

    /// Submits the input for validation against the selected step.
    ///
    /// A passing result completes the step through the navigation engine.
    /// Every failure becomes a `passed = false` result with the error text as
    /// feedback. Returns `None` when the input is blank or no step is selected.
    pub async fn validate(&self) -> Option<ValidationOutcome> {
        let submission = self.state.read().await.input.trim().to_string();
        if submission.is_empty() {
            return None;
        }
        let active = self.engine.current_step().await?;
        let location = active.location();
        {
            let mut state = self.state.write().await;
            state.switch_to(&location);
            state.is_validating = true;
            state.validation = None;
        }

        let request = ValidationRequest {
            submission: submission.clone(),
            task_id: active.task_id.clone(),
            subtask: SubtaskContext::from(&active.subtask),
            step: active.step.clone(),
            session_id: self.session_id.clone(),
        };

        let result = match self.auth.bearer_token().await {
            Ok(token) => self.backend.validate(&request, &token).await,
            Err(err) => Err(err),
        };

        let outcome = match result {
            Ok(outcome) => {
                if outcome.passed {
                    self.engine
                        .complete_step_in(&active.task_id, &active.step.id, &submission)
                        .await;
                }
                outcome
            }
            Err(err) => {
                tracing::warn!("[ChatSession] Validation failed for {}: {}", location, err);
                if err.is_unauthorized() {
                    self.auth.force_sign_out(&err.to_string()).await;
                }
                ValidationOutcome::failure(err.user_message())
            }
        };

        let mut state = self.state.write().await;
        state.is_validating = false;
        if outcome.passed {
            state.input.clear();
        }
        state.validation = Some(outcome.clone());
        Some(outcome)
    }
}

fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}
