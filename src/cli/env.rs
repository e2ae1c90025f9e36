use std::path::PathBuf;

use clap::Parser;

use super::commands::Commands;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct CliArgs {
    /// Path to an AgentOptions YAML file. Falls back to
    /// `config/config.yaml`, then the user config directory, then defaults.
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Log level (overridden by `RUST_LOG` if set).
    #[arg(short, long, default_value = "info")]
    pub log_level: String,

    /// LLM backend to wire in. Only "mock" ships with this binary; any
    /// other value is accepted but falls back to the mock with a warning,
    /// since real provider adapters are a separate integration concern.
    #[arg(long, default_value = "mock")]
    pub llm_provider: String,

    #[command(subcommand)]
    pub command: Commands,
}
