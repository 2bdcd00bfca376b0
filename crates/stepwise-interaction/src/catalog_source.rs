use crate::http::ApiClient;
use async_trait::async_trait;
use stepwise_core::catalog::{CatalogSource, Task, TeamMember};
use stepwise_core::error::Result;
use stepwise_infrastructure::dto::{tasks_from_payload, team_members_from_payload};

const TASKS_PATH: &str = "/api/tasks";
const TEAM_MEMBERS_PATH: &str = "/api/tasks/team-members";

/// Catalog read over HTTP, normalized through the DTO boundary.
pub struct HttpCatalogSource {
    api: ApiClient,
}

impl HttpCatalogSource {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }
}

#[async_trait]
impl CatalogSource for HttpCatalogSource {
    async fn fetch_tasks(&self) -> Result<Vec<Task>> {
        let payload = self.api.get_json(TASKS_PATH).await?;
        let tasks = tasks_from_payload(payload)?;
        tracing::debug!("[CatalogSource] Loaded {} tasks", tasks.len());
        Ok(tasks)
    }

    async fn fetch_team_members(&self) -> Result<Vec<TeamMember>> {
        let payload = self.api.get_json(TEAM_MEMBERS_PATH).await?;
        team_members_from_payload(payload)
    }
}
