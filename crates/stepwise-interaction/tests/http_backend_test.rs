//! Exercises the HTTP clients against a one-shot local server.

use futures::StreamExt;
use stepwise_core::assistant::{
    AssistantBackend, ChatEvent, ChatRequest, SubtaskContext, ValidationRequest,
};
use stepwise_core::catalog::{CatalogSource, Step};
use stepwise_core::error::StepwiseError;
use stepwise_interaction::{ApiClient, HttpAssistantBackend, HttpCatalogSource};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// Serves a single canned response and returns the raw request it received.
async fn serve_once(status: &str, content_type: &str, body: &str) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base_url = format!("http://{}", listener.local_addr().unwrap());
    let response = format!(
        "HTTP/1.1 {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        content_type,
        body.len(),
        body
    );

    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let request = read_request(&mut socket).await;
        socket.write_all(response.as_bytes()).await.unwrap();
        socket.shutdown().await.unwrap();
        request
    });
    (base_url, handle)
}

async fn read_request(socket: &mut tokio::net::TcpStream) -> String {
    let mut raw = Vec::new();
    let mut buf = [0u8; 4096];
    loop {
        let n = socket.read(&mut buf).await.unwrap();
        if n == 0 {
            break;
        }
        raw.extend_from_slice(&buf[..n]);
        let text = String::from_utf8_lossy(&raw);
        if let Some(header_end) = text.find("\r\n\r\n") {
            let content_length = text[..header_end]
                .lines()
                .find_map(|line| {
                    let (name, value) = line.split_once(':')?;
                    name.eq_ignore_ascii_case("content-length")
                        .then(|| value.trim().parse::<usize>().ok())
                        .flatten()
                })
                .unwrap_or(0);
            if raw.len() >= header_end + 4 + content_length {
                break;
            }
        }
    }
    String::from_utf8_lossy(&raw).into_owned()
}

fn step() -> Step {
    Step {
        id: "A".into(),
        number: 1,
        step: "Introduce yourself".into(),
        objective: "Meet the team".into(),
        is_completed: false,
        student_response: String::new(),
        validation_criteria: vec!["Mentions a goal".into()],
        deliverables: Vec::new(),
        primary_agent: "mentor".into(),
    }
}

fn subtask() -> SubtaskContext {
    SubtaskContext {
        id: "S1".into(),
        number: 1,
        name: "Getting started".into(),
        description: String::new(),
    }
}

#[tokio::test]
async fn test_fetch_tasks_normalizes_payload() {
    let (base_url, server) = serve_once(
        "200 OK",
        "application/json",
        r#"{"tasks":[{"id":"Intro","name":"Intro","number":1,"subtasks":[{"id":"S1","number":1,"steps":null}]}]}"#,
    )
    .await;

    let source = HttpCatalogSource::new(ApiClient::new(base_url));
    let tasks = source.fetch_tasks().await.unwrap();

    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].subtasks[0].steps.len(), 0);
    let request = server.await.unwrap();
    assert!(request.starts_with("GET /api/tasks HTTP/1.1"));
}

#[tokio::test]
async fn test_chat_stream_sends_bearer_and_decodes_frames() {
    let body = "data: {\"type\":\"start\",\"agent\":\"mentor\"}\n\n\
                data: {\"type\":\"content\",\"content\":\"Hi \"}\n\n\
                data: {\"type\":\"content\",\"content\":\"there\"}\n\n\
                data: {\"type\":\"end\"}\n\n";
    let (base_url, server) = serve_once("200 OK", "text/event-stream", body).await;

    let backend = HttpAssistantBackend::new(ApiClient::new(base_url));
    let request = ChatRequest {
        message: "hello".into(),
        task_id: "Intro".into(),
        subtask: subtask(),
        step: step(),
        session_id: "session-1".into(),
        agent_role: Some("mentor".into()),
    };
    let events: Vec<ChatEvent> = backend
        .stream_chat(&request, "tok")
        .await
        .unwrap()
        .map(|event| event.unwrap())
        .collect()
        .await;

    assert_eq!(events.len(), 4);
    assert_eq!(events[1], ChatEvent::Content("Hi ".into()));
    assert_eq!(events[3], ChatEvent::End);

    let raw = server.await.unwrap();
    assert!(raw.starts_with("POST /api/chat/stream HTTP/1.1"));
    assert!(raw.to_ascii_lowercase().contains("authorization: bearer tok"));
    assert!(raw.contains("\"agentRole\":\"mentor\""));
    assert!(raw.contains("\"sessionId\":\"session-1\""));
}

#[tokio::test]
async fn test_expired_token_is_unauthorized() {
    let (base_url, server) = serve_once(
        "401 Unauthorized",
        "application/json",
        r#"{"detail":"Token expired"}"#,
    )
    .await;

    let backend = HttpAssistantBackend::new(ApiClient::new(base_url));
    let request = ValidationRequest {
        submission: "my answer".into(),
        task_id: "Intro".into(),
        subtask: subtask(),
        step: step(),
        session_id: "session-1".into(),
    };
    let err = backend.validate(&request, "stale").await.unwrap_err();

    assert_eq!(err, StepwiseError::Unauthorized("Token expired".into()));
    server.await.unwrap();
}

#[tokio::test]
async fn test_health_check_reports_server_errors() {
    let (base_url, server) = serve_once("503 Service Unavailable", "text/plain", "").await;
    let backend = HttpAssistantBackend::new(ApiClient::new(base_url));

    let err = backend.health_check().await.unwrap_err();
    assert!(matches!(err, StepwiseError::Backend { status: Some(503), .. }));
    server.await.unwrap();
}

#[tokio::test]
async fn test_unreachable_server_is_network_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let backend = HttpAssistantBackend::new(ApiClient::new(format!("http://{}", addr)));
    let err = backend.health_check().await.unwrap_err();
    assert!(matches!(err, StepwiseError::Network(_)));
}
