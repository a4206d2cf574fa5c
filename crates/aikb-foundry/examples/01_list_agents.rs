use aikb_foundry::{provider_from_settings, FoundryClient, UpstreamSettings};
use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    let settings = UpstreamSettings::from_env();

    let client = FoundryClient::builder()
        .settings(settings.foundry.clone())
        .credentials(provider_from_settings(&settings.auth)?)
        .build()?;

    let response = client.list_agents().await?;

    for agent in response.body["data"].as_array().into_iter().flatten() {
        println!(
            "{}  {}  ({})",
            agent["id"].as_str().unwrap_or("?"),
            agent["name"].as_str().unwrap_or("<unnamed>"),
            agent["model"].as_str().unwrap_or("?"),
        );
    }

    Ok(())
}
