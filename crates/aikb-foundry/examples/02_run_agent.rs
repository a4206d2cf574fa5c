use aikb_foundry::{provider_from_settings, FoundryClient, NewMessage, NewRun, UpstreamSettings};
use anyhow::{bail, Context, Result};
use std::time::Duration;

// cargo run --example 02_run_agent -- <assistant_id> "question"
#[tokio::main]
async fn main() -> Result<()> {
    let mut args = std::env::args().skip(1);
    let assistant_id = args.next().context("usage: 02_run_agent <assistant_id> <question>")?;
    let question = args.next().context("usage: 02_run_agent <assistant_id> <question>")?;

    let settings = UpstreamSettings::from_env();
    let client = FoundryClient::builder()
        .settings(settings.foundry.clone())
        .credentials(provider_from_settings(&settings.auth)?)
        .build()?;

    let thread = client.create_thread().await?;
    let thread_id = thread.id().context("thread without id")?.to_string();

    client.create_message(&thread_id, &NewMessage::user(question)).await?;

    let run = client.create_run(&thread_id, &NewRun::new(assistant_id)).await?;
    let run_id = run.id().context("run without id")?.to_string();

    loop {
        tokio::time::sleep(Duration::from_secs(1)).await;
        let run = client.get_run(&thread_id, &run_id).await?;
        match run.body["status"].as_str() {
            Some("completed") => break,
            Some("failed" | "cancelled" | "expired") => bail!("run ended: {}", run.body["status"]),
            _ => continue,
        }
    }

    let messages = client.list_messages(&thread_id).await?;
    println!("{}", serde_json::to_string_pretty(&messages.body)?);

    client.delete_thread(&thread_id).await?;
    Ok(())
}
