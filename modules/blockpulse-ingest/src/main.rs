use anyhow::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;

use blockpulse_common::AppConfig;
use blockpulse_ingest::pipeline;
use blockpulse_ingest::sink::DualSink;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Blockpulse ingest starting...");

    let config = AppConfig::from_env()?;
    config.log_redacted();

    // Fatal configuration errors (no usable sink) abort before any fetch.
    let sink = DualSink::from_config(&config)?;

    let stats = pipeline::run(&config, &sink).await?;
    info!("{stats}");

    Ok(())
}
