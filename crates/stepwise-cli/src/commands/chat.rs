use super::App;
use anyhow::{Result, bail};
use stepwise_core::catalog::team_member_for_role;
use stepwise_core::transcript::MessageRole;

pub async fn send(app: &App, message: &str) -> Result<()> {
    let engine = app.client.engine();
    let chat = app.client.chat();
    if engine.current_step().await.is_none() {
        bail!("Select a step first");
    }

    chat.load_history().await;
    chat.set_input(message).await;
    if !chat.send().await {
        bail!("Nothing to send (blank message or step already completed)");
    }

    let team = engine.team_members().await;
    if let Some(reply) = chat
        .messages()
        .await
        .into_iter()
        .rev()
        .find(|m| m.role == MessageRole::Assistant)
    {
        let speaker = reply
            .agent_role
            .as_deref()
            .map(|role| {
                team_member_for_role(&team, role)
                    .map(|member| member.name.clone())
                    .unwrap_or_else(|| role.to_string())
            })
            .unwrap_or_else(|| "Assistant".to_string());
        println!("{}: {}", speaker, reply.content);
    }
    Ok(())
}

pub async fn submit(app: &App, text: &str) -> Result<()> {
    let chat = app.client.chat();
    chat.set_input(text).await;
    let Some(outcome) = chat.validate().await else {
        bail!("Nothing to submit (blank submission or no step selected)");
    };

    if outcome.passed {
        println!("✅ Passed ({:.0})", outcome.score);
    } else {
        println!("❌ Not yet ({:.0})", outcome.score);
    }
    if !outcome.feedback.is_empty() {
        println!("{}", outcome.feedback);
    }
    for recommendation in &outcome.recommendations {
        println!("  • {}", recommendation);
    }
    Ok(())
}
