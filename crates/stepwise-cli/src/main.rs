use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use stepwise_core::config::{ClientConfig, StorageConfig};
use stepwise_infrastructure::ConfigService;
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "stepwise")]
#[command(about = "Stepwise CLI - work through tasks, chat with your AI team and submit steps", long_about = None)]
struct Cli {
    /// Config file (defaults to ~/.config/stepwise/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Keep progress in this directory instead of the configured storage
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Task to open before running the command
    #[arg(long, global = true)]
    task: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List tasks with completion counts
    Tasks,
    /// Show the current position and which steps are unlocked
    Status,
    /// Open a task, optionally jumping to an unlocked step
    Select {
        task: String,
        #[arg(long)]
        step: Option<String>,
    },
    /// Advance to the next step
    Next,
    /// Mark a step of the current task completed
    Complete { step: String, response: String },
    /// Send a chat message for the current step
    Chat { message: String },
    /// Submit work for the current step for validation
    Submit { text: String },
}

fn load_config(cli: &Cli) -> Result<ClientConfig> {
    let service = match &cli.config {
        Some(path) => ConfigService::with_path(path),
        None => ConfigService::new_default().context("Failed to locate config directory")?,
    };
    let mut config = service
        .load()
        .with_context(|| format!("Failed to load {}", service.path().display()))?;
    if let Some(dir) = &cli.data_dir {
        config.storage = StorageConfig::File {
            data_dir: Some(dir.clone()),
        };
    }
    // One-shot process: nothing to probe.
    config.probe_interval_secs = 0;
    Ok(config)
}

fn init_tracing(log_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;
    init_tracing(&config.log_level);

    let app = commands::App::open(config, cli.task.as_deref()).await?;
    let result = match &cli.command {
        Commands::Tasks => commands::navigation::tasks(&app).await,
        Commands::Status => commands::navigation::status(&app).await,
        Commands::Select { task, step } => {
            commands::navigation::select(&app, task, step.as_deref()).await
        }
        Commands::Next => commands::navigation::next(&app).await,
        Commands::Complete { step, response } => {
            commands::navigation::complete(&app, step, response).await
        }
        Commands::Chat { message } => commands::chat::send(&app, message).await,
        Commands::Submit { text } => commands::chat::submit(&app, text).await,
    };
    app.close().await;
    result
}
