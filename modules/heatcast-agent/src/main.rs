use std::sync::Arc;

use anyhow::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;

use heatcast_agent::agent::HeatAgent;
use heatcast_agent::judge::LlmJudge;
use heatcast_agent::sink::JsonDirSink;
use heatcast_agent::sources;
use heatcast_common::AgentConfig;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("heatcast=info".parse()?))
        .init();

    info!("Heatcast agent starting...");

    // Load config
    let config = AgentConfig::from_env()?;
    config.log_redacted();

    // Wire the pipeline
    let sources = sources::enabled_sources(&config);
    let judge = Box::new(LlmJudge::from_config(&config));
    let sink = Arc::new(JsonDirSink::from_config(&config));
    let agent = HeatAgent::new(&config, sources, judge, sink);

    let report = agent.run().await?;
    info!("Heatcast run complete. {report}");

    Ok(())
}
