use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use agentcore_agent_core::AgentOptions;

pub fn init_logging(level: &str) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level.to_string()));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .context("failed to install tracing subscriber")
}

pub struct LoadedConfig {
    pub options: AgentOptions,
    pub path: Option<PathBuf>,
}

/// Resolves the config file to use: an explicit `--config`, else
/// `./config/config.yaml`, else `$XDG_CONFIG_HOME/agentcore/config.yaml`.
/// Returns `None` if none of those exist, in which case callers fall back
/// to `AgentOptions::default()`.
fn resolve_config_path(explicit: Option<&PathBuf>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.clone());
    }

    let local = PathBuf::from("config/config.yaml");
    if local.exists() {
        return Some(local);
    }

    dirs::config_dir()
        .map(|mut dir| {
            dir.push("agentcore");
            dir.push("config.yaml");
            dir
        })
        .filter(|path| path.exists())
}

pub fn load_config(explicit: Option<&PathBuf>) -> Result<LoadedConfig> {
    let path = resolve_config_path(explicit);

    let options = match &path {
        Some(path) => {
            let loaded = config::Config::builder()
                .add_source(config::File::from(path.as_path()))
                .build()
                .with_context(|| format!("failed to read config file {}", path.display()))?;
            loaded
                .try_deserialize()
                .with_context(|| format!("failed to parse config file {}", path.display()))?
        }
        None => AgentOptions::default(),
    };

    Ok(LoadedConfig { options, path })
}
