use super::App;
use anyhow::{Result, bail};
use stepwise_core::catalog::Task;
use stepwise_core::navigation::Selection;

pub async fn tasks(app: &App) -> Result<()> {
    let engine = app.client.engine();
    let current = engine.selection().await.task_id;

    for task in engine.tasks().await {
        let progress = task.progress();
        let marker = if current.as_deref() == Some(task.id.as_str()) {
            ">"
        } else {
            " "
        };
        let done = if progress.is_complete() { " ✅" } else { "" };
        println!(
            "{} {:>2}. {} [{}/{}]{}  ({})",
            marker, task.number, task.name, progress.completed, progress.total, done, task.id
        );
    }
    Ok(())
}

pub async fn status(app: &App) -> Result<()> {
    let engine = app.client.engine();
    let selection = engine.selection().await;
    let Some(task) = selection.task_id.as_deref() else {
        println!("No task selected.");
        return Ok(());
    };
    let Some(task) = engine.task(task).await else {
        println!("No task selected.");
        return Ok(());
    };

    println!("📚 {} ({})", task.name, task.id);
    print_steps(app, &task, &selection).await;

    if let Some(active) = engine.current_step().await {
        println!();
        println!("Current step: {}", active.step.step);
        if !active.step.objective.is_empty() {
            println!("Objective:    {}", active.step.objective);
        }
        for criterion in &active.step.validation_criteria {
            println!("  • {}", criterion);
        }
    }
    Ok(())
}

async fn print_steps(app: &App, task: &Task, selection: &Selection) {
    let engine = app.client.engine();
    for subtask in &task.subtasks {
        println!("  {}. {}", subtask.number, subtask.name);
        for step in &subtask.steps {
            let marker = if selection.step_id.as_deref() == Some(step.id.as_str()) {
                "▶"
            } else if step.is_completed {
                "✔"
            } else if engine.is_step_accessible(&step.id).await {
                "○"
            } else {
                "🔒"
            };
            println!("     {} {}.{} {}", marker, subtask.number, step.number, step.step);
        }
    }
}

pub async fn select(app: &App, task: &str, step: Option<&str>) -> Result<()> {
    let engine = app.client.engine();
    if !engine.select_task(task).await {
        bail!("Unknown task '{}'", task);
    }
    if let Some(step) = step {
        if !engine.select_step(step).await {
            bail!("Step '{}' is locked or does not exist", step);
        }
    }
    status(app).await
}

pub async fn next(app: &App) -> Result<()> {
    let engine = app.client.engine();
    if !engine.navigate_to_next().await {
        println!("🎉 You are at the last step.");
        return Ok(());
    }
    status(app).await
}

pub async fn complete(app: &App, step: &str, response: &str) -> Result<()> {
    if !app.client.engine().complete_step(step, response).await {
        bail!("Step '{}' is not part of the current task", step);
    }
    println!("✅ Step {} completed", step);
    Ok(())
}
