use std::path::PathBuf;

use clap::{Parser, ValueEnum};

#[derive(Parser, Debug)]
#[command(name = "sensory-pulse")]
#[command(version)]
#[command(about = "Pattern, correlation and anomaly analysis for emotion and sensory tracking data", long_about = None)]
pub struct Cli {
    /// Data bundle JSON with `entries`, `emotions` and `sensoryInputs`
    #[arg(value_name = "BUNDLE")]
    pub bundle: PathBuf,

    /// Analytics configuration JSON; defaults apply when omitted or missing
    #[arg(short = 'c', long = "config", value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Where the analysis runs
    #[arg(long = "strategy", value_enum, default_value = "background")]
    pub strategy: Strategy,

    /// Override the configured host timeout
    #[arg(long = "timeout-ms", value_name = "MS")]
    pub timeout_ms: Option<u64>,

    /// Override the pattern lookback window
    #[arg(long = "lookback-days", value_name = "DAYS")]
    pub lookback_days: Option<u32>,

    /// Explicit cache key instead of the content fingerprint
    #[arg(long = "cache-key", value_name = "KEY")]
    pub cache_key: Option<String>,

    /// Pretty-print the result
    #[arg(long)]
    pub pretty: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Strategy {
    /// Dedicated worker thread, retried inline on failure
    Background,
    /// On the calling task
    Inline,
}
