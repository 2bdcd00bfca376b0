pub mod chat;
pub mod navigation;

use anyhow::{Context, Result, bail};
use stepwise_application::StepwiseClient;
use stepwise_core::config::ClientConfig;

/// A bootstrapped client with the catalog loaded.
pub struct App {
    pub client: StepwiseClient,
}

impl App {
    pub async fn open(config: ClientConfig, task: Option<&str>) -> Result<Self> {
        let client = StepwiseClient::bootstrap(config)
            .await
            .context("Failed to start the client")?;
        let engine = client.engine();

        if let Err(err) = engine.load_catalog().await {
            client.shutdown().await;
            bail!("Could not load tasks: {}", err.user_message());
        }
        tracing::debug!(
            "[CLI] Catalog loaded, selection: {:?}",
            engine.selection_state().await
        );
        if let Some(task_id) = task {
            if !engine.select_task(task_id).await {
                client.shutdown().await;
                bail!("Unknown task '{}'", task_id);
            }
        }
        Ok(Self { client })
    }

    pub async fn close(&self) {
        self.client.shutdown().await;
    }
}
