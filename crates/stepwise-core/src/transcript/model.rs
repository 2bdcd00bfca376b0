//! Chat transcript model.

use crate::error::{Result, StepwiseError};
use crate::location::StepLocation;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Who wrote a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}

/// One chat message inside a step transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: String,
    pub role: MessageRole,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    /// Team member role that produced an assistant message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_role: Option<String>,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(MessageRole::User, content, None)
    }

    pub fn assistant(content: impl Into<String>, agent_role: Option<String>) -> Self {
        Self::new(MessageRole::Assistant, content, agent_role)
    }

    fn new(role: MessageRole, content: impl Into<String>, agent_role: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role,
            content: content.into(),
            timestamp: Utc::now(),
            agent_role,
        }
    }

    /// Rejects messages without an id or content.
    pub fn validate(&self) -> Result<()> {
        if self.id.trim().is_empty() {
            return Err(StepwiseError::InvalidMessage(
                "message id is required".to_string(),
            ));
        }
        if self.content.trim().is_empty() {
            return Err(StepwiseError::InvalidMessage(format!(
                "message '{}' has no content",
                self.id
            )));
        }
        Ok(())
    }
}

/// Addresses one transcript: a learner's chat on one step.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TranscriptKey {
    pub user_id: String,
    pub location: StepLocation,
}

impl TranscriptKey {
    pub fn new(user_id: impl Into<String>, location: StepLocation) -> Self {
        Self {
            user_id: user_id.into(),
            location,
        }
    }

    /// Document id combining the three catalog ids.
    pub fn chat_id(&self) -> String {
        format!(
            "{}_{}_{}",
            self.location.task_id, self.location.subtask_id, self.location.step_id
        )
    }
}

/// Count and freshness of a transcript, without its messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranscriptSummary {
    pub count: u32,
    pub last_updated: DateTime<Utc>,
}

/// The persisted transcript document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transcript {
    pub task_id: String,
    pub subtask_id: String,
    pub step_id: String,
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
    #[serde(default)]
    pub message_count: u32,
    pub created_at: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
}

impl Transcript {
    pub fn summary(&self) -> TranscriptSummary {
        TranscriptSummary {
            count: self.message_count,
            last_updated: self.last_updated,
        }
    }
}

/// The deterministic greeting shown the first time a step is opened.
pub fn welcome_text(task_name: &str, step_objective: &str) -> String {
    format!(
        "Welcome to {task_name}! In this step your objective is: {step_objective}\n\n\
         Ask me anything about it, and submit your work when you are ready."
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_rejects_blank_fields() {
        let mut msg = ChatMessage::user("hello");
        assert!(msg.validate().is_ok());

        msg.content = "   ".into();
        assert!(matches!(msg.validate(), Err(StepwiseError::InvalidMessage(_))));

        let mut msg = ChatMessage::user("hello");
        msg.id.clear();
        assert!(matches!(msg.validate(), Err(StepwiseError::InvalidMessage(_))));
    }

    #[test]
    fn test_chat_id_joins_location() {
        let key = TranscriptKey::new("u1", StepLocation::new("t", "s", "p"));
        assert_eq!(key.chat_id(), "t_s_p");
    }

    #[test]
    fn test_role_serializes_lowercase() {
        let json = serde_json::to_value(ChatMessage::assistant("hi", Some("mentor".into()))).unwrap();
        assert_eq!(json["role"], "assistant");
        assert_eq!(json["agentRole"], "mentor");
    }

    #[test]
    fn test_welcome_text_is_deterministic() {
        assert_eq!(welcome_text("Intro", "Say hi"), welcome_text("Intro", "Say hi"));
        assert!(welcome_text("Intro", "Say hi").contains("Say hi"));
    }
}
