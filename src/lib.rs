pub mod cache;
pub mod cli;
pub mod config;
pub mod correlation;
pub mod engine;
pub mod host;
pub mod metrics;
pub mod models;
pub mod patterns;
pub mod predictive;
pub mod stats;
mod utils;

use std::fs;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use clap::Parser;

pub use cache::AnalysisCache;
pub use cli::{Cli, Strategy};
pub use config::{AnalyticsConfiguration, ConfigStore};
pub use engine::{AnalysisStages, Orchestrator, StandardStages};
pub use host::{AnalysisHost, AnalysisRequest, CacheWarmer, ExecutionHost, HostError, HostMessage};
pub use models::{AnalysisResult, DataBundle};

/// Resolve the configuration the command line asks for.
fn load_config(cli: &Cli) -> Result<AnalyticsConfiguration> {
    let mut config = match &cli.config {
        Some(path) => ConfigStore::new(path.clone())?.current()?,
        None => AnalyticsConfiguration::default(),
    };
    if let Some(timeout_ms) = cli.timeout_ms {
        config.host.timeout_ms = timeout_ms;
    }
    if let Some(days) = cli.lookback_days {
        config.lookback_days = Some(days);
    }
    Ok(config)
}

async fn analyze_from_cli(cli: &Cli) -> Result<AnalysisResult> {
    let contents = fs::read_to_string(&cli.bundle)
        .with_context(|| format!("Failed to read data bundle from {}", cli.bundle.display()))?;
    let bundle = DataBundle::from_json(&contents)?;
    let config = load_config(cli)?;

    let cache = Arc::new(AnalysisCache::from_settings(&config.cache));
    let orchestrator = Orchestrator::new();
    let host = match cli.strategy {
        Strategy::Background => ExecutionHost::new(orchestrator, cache, &config.host),
        Strategy::Inline => ExecutionHost::inline(orchestrator, cache, &config.host),
    };
    log::info!(
        "Analyzing {} sessions, {} emotions, {} sensory inputs ({} strategy)",
        bundle.entries.len(),
        bundle.emotions.len(),
        bundle.sensory_inputs.len(),
        host.strategy()
    );

    let mut request = AnalysisRequest::new(bundle).with_config(config);
    if let Some(key) = &cli.cache_key {
        request = request.with_cache_key(key.clone());
    }

    match host.run_with_inline_retry(request).await {
        Ok(result) => {
            if !result.has_findings() {
                log::info!("No patterns, correlations, trends or anomalies found");
            }
            Ok(result)
        }
        Err(err) => Ok(AnalysisResult::failed(err.to_string())),
    }
}

pub fn run() -> Result<()> {
    // Initialize logging (reads RUST_LOG env var)
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let cli = Cli::parse();
    let runtime = tokio::runtime::Runtime::new().context("Failed to start async runtime")?;
    let result = runtime.block_on(analyze_from_cli(&cli))?;

    let output = if cli.pretty {
        serde_json::to_string_pretty(&result)
    } else {
        serde_json::to_string(&result)
    }
    .context("Failed to encode analysis result")?;
    println!("{output}");

    match result.error {
        Some(message) => Err(anyhow!(message)),
        None => Ok(()),
    }
}
