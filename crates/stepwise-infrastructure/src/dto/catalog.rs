//! Catalog payload DTOs.
//!
//! `GET /api/tasks` → `{ "tasks": [...] }` and
//! `GET /api/tasks/team-members` → `{ "teamMembers": [...] }`.

use serde::de::{self, DeserializeOwned, Deserializer};
use serde::Deserialize;
use serde_json::Value;
use stepwise_core::catalog::{Step, Subtask, Task, TeamMember};
use stepwise_core::error::{Result, StepwiseError};

/// Coerces anything that is not an array to an empty list.
fn lenient_vec<'de, D, T>(deserializer: D) -> std::result::Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    match Value::deserialize(deserializer)? {
        Value::Array(items) => items
            .into_iter()
            .map(|item| serde_json::from_value(item).map_err(de::Error::custom))
            .collect(),
        _ => Ok(Vec::new()),
    }
}

/// Accepts string or integer identifiers.
fn id_string<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) if !s.trim().is_empty() => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(de::Error::custom(format!("invalid id: {}", other))),
    }
}

/// Accepts an integer or a numeric string; anything else is treated as absent.
fn lenient_ordinal<'de, D>(deserializer: D) -> std::result::Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_u64().and_then(|v| u32::try_from(v).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    })
}

/// Null-tolerant string.
fn lenient_string<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    })
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepDTO {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient_ordinal")]
    pub number: Option<u32>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub step: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub objective: String,
    #[serde(default)]
    pub is_completed: bool,
    #[serde(default, deserialize_with = "lenient_string")]
    pub student_response: String,
    #[serde(default, deserialize_with = "lenient_vec")]
    pub validation_criteria: Vec<String>,
    #[serde(default, deserialize_with = "lenient_vec")]
    pub deliverables: Vec<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub primary_agent: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubtaskDTO {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient_ordinal")]
    pub number: Option<u32>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub description: String,
    #[serde(default, deserialize_with = "lenient_vec")]
    pub steps: Vec<StepDTO>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskDTO {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: String,
    #[serde(default, alias = "taskNumber", deserialize_with = "lenient_ordinal")]
    pub number: Option<u32>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub description: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub phase: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub objective: String,
    #[serde(default, deserialize_with = "lenient_vec")]
    pub subtasks: Vec<SubtaskDTO>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamMemberDTO {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub role: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub personality: String,
    #[serde(default, deserialize_with = "lenient_vec")]
    pub expertise: Vec<String>,
    #[serde(default)]
    pub avatar: Option<String>,
}

// Missing ordinals fall back to the 1-based position in the payload.

impl StepDTO {
    fn into_domain(self, position: usize) -> Step {
        Step {
            number: self.number.unwrap_or(position as u32 + 1),
            id: self.id,
            step: self.step,
            objective: self.objective,
            is_completed: self.is_completed,
            student_response: self.student_response,
            validation_criteria: self.validation_criteria,
            deliverables: self.deliverables,
            primary_agent: self.primary_agent,
        }
    }
}

impl SubtaskDTO {
    fn into_domain(self, position: usize) -> Subtask {
        let mut steps: Vec<Step> = self
            .steps
            .into_iter()
            .enumerate()
            .map(|(i, step)| step.into_domain(i))
            .collect();
        steps.sort_by_key(|step| step.number);

        Subtask {
            number: self.number.unwrap_or(position as u32 + 1),
            name: if self.name.is_empty() {
                self.id.clone()
            } else {
                self.name
            },
            id: self.id,
            description: self.description,
            steps,
        }
    }
}

impl TaskDTO {
    fn into_domain(self, position: usize) -> Task {
        let mut subtasks: Vec<Subtask> = self
            .subtasks
            .into_iter()
            .enumerate()
            .map(|(i, subtask)| subtask.into_domain(i))
            .collect();
        subtasks.sort_by_key(|subtask| subtask.number);

        Task {
            number: self.number.unwrap_or(position as u32 + 1),
            name: if self.name.is_empty() {
                self.id.clone()
            } else {
                self.name
            },
            id: self.id,
            description: self.description,
            phase: self.phase,
            objective: self.objective,
            subtasks,
        }
    }
}

impl From<TeamMemberDTO> for TeamMember {
    fn from(dto: TeamMemberDTO) -> Self {
        TeamMember {
            id: dto.id,
            name: dto.name,
            role: dto.role,
            personality: dto.personality,
            expertise: dto.expertise,
            avatar: dto.avatar,
        }
    }
}

fn list_field<T: DeserializeOwned>(payload: Value, field: &str) -> Result<Vec<T>> {
    let Value::Object(mut envelope) = payload else {
        return Err(StepwiseError::invalid_payload(format!(
            "expected an object with '{}'",
            field
        )));
    };
    let items = match envelope.remove(field) {
        Some(Value::Array(items)) => items,
        Some(Value::Null) | None => {
            return Err(StepwiseError::invalid_payload(format!(
                "missing '{}' list",
                field
            )));
        }
        Some(_) => Vec::new(),
    };
    items
        .into_iter()
        .enumerate()
        .map(|(i, item)| {
            serde_json::from_value(item).map_err(|e| {
                StepwiseError::invalid_payload(format!("{}[{}]: {}", field, i, e))
            })
        })
        .collect()
}

/// Normalizes the `GET /api/tasks` payload.
///
/// Subtasks and steps that are absent or not arrays become empty lists;
/// items are ordered by their ordinal. An item without an id is an error.
pub fn tasks_from_payload(payload: Value) -> Result<Vec<Task>> {
    let tasks: Vec<TaskDTO> = list_field(payload, "tasks")?;
    Ok(tasks
        .into_iter()
        .enumerate()
        .map(|(i, task)| task.into_domain(i))
        .collect())
}

/// Normalizes the `GET /api/tasks/team-members` payload.
pub fn team_members_from_payload(payload: Value) -> Result<Vec<TeamMember>> {
    let members: Vec<TeamMemberDTO> = list_field(payload, "teamMembers")?;
    Ok(members.into_iter().map(TeamMember::from).collect())
}
