//! Shared fixtures and hand-written collaborators for the application tests.

#![allow(dead_code)]

use async_trait::async_trait;
use futures::StreamExt;
use futures::stream;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use stepwise_application::{ChatSession, NavigationEngine};
use stepwise_core::StepLocation;
use stepwise_core::assistant::{
    AssistantBackend, ChatEvent, ChatRequest, ChatStream, ValidationOutcome, ValidationRequest,
};
use stepwise_core::auth::AuthProvider;
use stepwise_core::catalog::{CatalogSource, Step, Subtask, Task, TeamMember};
use stepwise_core::error::{Result, StepwiseError};
use stepwise_core::progress::{ProgressDocument, ProgressRepository};
use stepwise_core::transcript::TranscriptRepository;
use stepwise_infrastructure::{
    DocumentProgressRepository, DocumentTranscriptRepository, InMemoryDocumentStore,
    StaticAuthProvider,
};

pub const USER: &str = "learner-1";

// ----------------------------------------------------------------------------
// Catalog fixtures
// ----------------------------------------------------------------------------

pub fn step(id: &str, number: u32) -> Step {
    Step {
        id: id.to_string(),
        number,
        step: format!("Do {}", id),
        objective: format!("Objective {}", id),
        is_completed: false,
        student_response: String::new(),
        validation_criteria: vec!["Be specific".to_string()],
        deliverables: Vec::new(),
        primary_agent: "mentor".to_string(),
    }
}

pub fn subtask(id: &str, number: u32, steps: Vec<Step>) -> Subtask {
    Subtask {
        id: id.to_string(),
        number,
        name: format!("Subtask {}", id),
        description: String::new(),
        steps,
    }
}

pub fn task(id: &str, number: u32, subtasks: Vec<Subtask>) -> Task {
    Task {
        id: id.to_string(),
        name: id.to_string(),
        number,
        description: String::new(),
        phase: String::new(),
        objective: String::new(),
        subtasks,
    }
}

/// "Intro" with subtask "S1" holding steps A and B.
pub fn intro() -> Task {
    task("Intro", 1, vec![subtask("S1", 1, vec![step("A", 1), step("B", 2)])])
}

/// Intro followed by a two-subtask "Research" task.
pub fn course() -> Vec<Task> {
    vec![
        intro(),
        task(
            "Research",
            2,
            vec![
                subtask("R1", 1, vec![step("C", 1)]),
                subtask("R2", 2, vec![step("D", 1), step("E", 2)]),
            ],
        ),
    ]
}

// ----------------------------------------------------------------------------
// Catalog source
// ----------------------------------------------------------------------------

pub struct StaticCatalog {
    tasks: Result<Vec<Task>>,
    team_members: Vec<TeamMember>,
}

impl StaticCatalog {
    pub fn new(tasks: Vec<Task>) -> Self {
        Self {
            tasks: Ok(tasks),
            team_members: vec![TeamMember {
                id: "1".into(),
                name: "Mia".into(),
                role: "mentor".into(),
                personality: "Patient".into(),
                expertise: vec!["onboarding".into()],
                avatar: None,
            }],
        }
    }

    pub fn failing(err: StepwiseError) -> Self {
        Self {
            tasks: Err(err),
            team_members: Vec::new(),
        }
    }
}

#[async_trait]
impl CatalogSource for StaticCatalog {
    async fn fetch_tasks(&self) -> Result<Vec<Task>> {
        self.tasks.clone()
    }

    async fn fetch_team_members(&self) -> Result<Vec<TeamMember>> {
        Ok(self.team_members.clone())
    }
}

// ----------------------------------------------------------------------------
// Progress gateway recording every call
// ----------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum GatewayCall {
    Fetch(String),
    Initialize(String),
    UpdatePosition(StepLocation),
    UpdateStepCompletion(StepLocation, bool, Option<String>),
    RecordChatActivity(StepLocation),
}

pub struct RecordingProgress {
    inner: DocumentProgressRepository,
    calls: Mutex<Vec<GatewayCall>>,
    pub fail_fetch: AtomicBool,
}

impl RecordingProgress {
    pub fn new() -> Self {
        Self {
            inner: DocumentProgressRepository::new(Arc::new(InMemoryDocumentStore::new())),
            calls: Mutex::new(Vec::new()),
            fail_fetch: AtomicBool::new(false),
        }
    }

    pub fn calls(&self) -> Vec<GatewayCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    /// Stored document, read without recording a call.
    pub async fn stored(&self, task_id: &str) -> Option<ProgressDocument> {
        self.inner.fetch(USER, task_id).await.unwrap()
    }

    fn record(&self, call: GatewayCall) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl ProgressRepository for RecordingProgress {
    async fn fetch(&self, user_id: &str, task_id: &str) -> Result<Option<ProgressDocument>> {
        self.record(GatewayCall::Fetch(task_id.to_string()));
        if self.fail_fetch.load(Ordering::SeqCst) {
            return Err(StepwiseError::network("document store unavailable"));
        }
        self.inner.fetch(user_id, task_id).await
    }

    async fn initialize(&self, user_id: &str, task: &Task) -> Result<ProgressDocument> {
        self.record(GatewayCall::Initialize(task.id.clone()));
        self.inner.initialize(user_id, task).await
    }

    async fn update_position(&self, user_id: &str, location: &StepLocation) -> Result<()> {
        self.record(GatewayCall::UpdatePosition(location.clone()));
        self.inner.update_position(user_id, location).await
    }

    async fn update_step_completion(
        &self,
        user_id: &str,
        location: &StepLocation,
        is_completed: bool,
        response: Option<&str>,
    ) -> Result<()> {
        self.record(GatewayCall::UpdateStepCompletion(
            location.clone(),
            is_completed,
            response.map(str::to_string),
        ));
        self.inner
            .update_step_completion(user_id, location, is_completed, response)
            .await
    }

    async fn record_chat_activity(&self, user_id: &str, location: &StepLocation) -> Result<()> {
        self.record(GatewayCall::RecordChatActivity(location.clone()));
        self.inner.record_chat_activity(user_id, location).await
    }
}

// ----------------------------------------------------------------------------
// Assistant backend with scripted replies
// ----------------------------------------------------------------------------

pub enum ScriptedReply {
    Events(Vec<Result<ChatEvent>>),
    /// Emits the events, then never finishes.
    Hang(Vec<Result<ChatEvent>>),
    Fail(StepwiseError),
}

#[derive(Default)]
pub struct ScriptedBackend {
    replies: Mutex<VecDeque<ScriptedReply>>,
    validations: Mutex<VecDeque<Result<ValidationOutcome>>>,
    pub chat_requests: Mutex<Vec<ChatRequest>>,
    pub validation_requests: Mutex<Vec<ValidationRequest>>,
    hold_validation: AtomicBool,
    release_validation: tokio::sync::Notify,
}

impl ScriptedBackend {
    pub fn reply(&self, reply: ScriptedReply) {
        self.replies.lock().unwrap().push_back(reply);
    }

    pub fn validation(&self, result: Result<ValidationOutcome>) {
        self.validations.lock().unwrap().push_back(result);
    }

    /// Makes `validate` wait for `release_validation` before answering.
    pub fn hold_validation(&self) {
        self.hold_validation.store(true, Ordering::SeqCst);
    }

    pub fn release_validation(&self) {
        self.release_validation.notify_one();
    }

    pub fn chat_requests(&self) -> Vec<ChatRequest> {
        self.chat_requests.lock().unwrap().clone()
    }
}

pub fn answer(agent: &str, chunks: &[&str]) -> ScriptedReply {
    let mut events = vec![Ok(ChatEvent::Start {
        agent: Some(agent.to_string()),
    })];
    events.extend(chunks.iter().map(|c| Ok(ChatEvent::Content(c.to_string()))));
    events.push(Ok(ChatEvent::End));
    ScriptedReply::Events(events)
}

pub fn outcome(passed: bool, feedback: &str) -> ValidationOutcome {
    ValidationOutcome {
        score: if passed { 90.0 } else { 40.0 },
        feedback: feedback.to_string(),
        recommendations: Vec::new(),
        passed,
    }
}

#[async_trait]
impl AssistantBackend for ScriptedBackend {
    async fn stream_chat(&self, request: &ChatRequest, _token: &str) -> Result<ChatStream> {
        self.chat_requests.lock().unwrap().push(request.clone());
        let reply = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| ScriptedReply::Fail(StepwiseError::internal("no scripted reply")));
        match reply {
            ScriptedReply::Events(events) => Ok(stream::iter(events).boxed()),
            ScriptedReply::Hang(events) => Ok(stream::iter(events).chain(stream::pending()).boxed()),
            ScriptedReply::Fail(err) => Err(err),
        }
    }

    async fn validate(&self, request: &ValidationRequest, _token: &str) -> Result<ValidationOutcome> {
        self.validation_requests.lock().unwrap().push(request.clone());
        if self.hold_validation.load(Ordering::SeqCst) {
            self.release_validation.notified().await;
        }
        self.validations
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(StepwiseError::internal("no scripted validation")))
    }

    async fn health_check(&self) -> Result<()> {
        Ok(())
    }
}

// ----------------------------------------------------------------------------
// Harness
// ----------------------------------------------------------------------------

pub struct Harness {
    pub engine: Arc<NavigationEngine>,
    pub chat: Arc<ChatSession>,
    pub progress: Arc<RecordingProgress>,
    pub transcripts: Arc<DocumentTranscriptRepository>,
    pub backend: Arc<ScriptedBackend>,
    pub auth: Arc<StaticAuthProvider>,
}

impl Harness {
    pub fn new(tasks: Vec<Task>) -> Self {
        Self::build(StaticCatalog::new(tasks), StaticAuthProvider::new(USER, "token"), None)
    }

    pub fn with_home(tasks: Vec<Task>, home_task_id: &str) -> Self {
        Self::build(
            StaticCatalog::new(tasks),
            StaticAuthProvider::new(USER, "token"),
            Some(home_task_id.to_string()),
        )
    }

    pub fn signed_out(tasks: Vec<Task>) -> Self {
        Self::build(StaticCatalog::new(tasks), StaticAuthProvider::signed_out(), None)
    }

    pub fn build(
        catalog: StaticCatalog,
        auth: StaticAuthProvider,
        home_task_id: Option<String>,
    ) -> Self {
        let progress = Arc::new(RecordingProgress::new());
        let transcripts = Arc::new(DocumentTranscriptRepository::new(Arc::new(
            InMemoryDocumentStore::new(),
        )));
        let backend = Arc::new(ScriptedBackend::default());
        let auth = Arc::new(auth);

        let engine = Arc::new(NavigationEngine::new(
            Arc::new(catalog),
            progress.clone(),
            auth.clone(),
            home_task_id,
        ));
        let chat = Arc::new(ChatSession::new(
            engine.clone(),
            transcripts.clone(),
            progress.clone(),
            backend.clone(),
            auth.clone(),
            "session-1",
        ));

        Self {
            engine,
            chat,
            progress,
            transcripts,
            backend,
            auth,
        }
    }

    pub fn transcript_key(&self, task_id: &str, subtask_id: &str, step_id: &str) -> stepwise_core::transcript::TranscriptKey {
        stepwise_core::transcript::TranscriptKey::new(
            USER,
            StepLocation::new(task_id, subtask_id, step_id),
        )
    }

    pub async fn stored_messages(&self, task_id: &str, subtask_id: &str, step_id: &str) -> Vec<String> {
        self.transcripts
            .get_messages(&self.transcript_key(task_id, subtask_id, step_id))
            .await
            .unwrap()
            .into_iter()
            .map(|m| m.content)
            .collect()
    }

    pub async fn position(&self) -> (Option<String>, Option<String>, Option<String>) {
        let selection = self.engine.selection().await;
        (selection.task_id, selection.subtask_id, selection.step_id)
    }
}

pub fn at(task_id: &str, subtask_id: &str, step_id: &str) -> (Option<String>, Option<String>, Option<String>) {
    (
        Some(task_id.to_string()),
        Some(subtask_id.to_string()),
        Some(step_id.to_string()),
    )
}

pub fn location(task_id: &str, subtask_id: &str, step_id: &str) -> StepLocation {
    StepLocation::new(task_id, subtask_id, step_id)
}

pub fn signed_in(auth: &dyn AuthProvider) -> bool {
    auth.is_signed_in()
}
