use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::{error, info, warn};

use agentcore_action_registry::default_registry;
use agentcore_agent_core::{AgentOptions, Executor, ExecutorOutcome, ExecutorStatus, MockChatLlm, ReplayOptions};
use agentcore_browser_context::fake::FakeBrowserContext;
use agentcore_browser_context::snapshot::BrowserState;

use super::commands::Commands;
use super::env::CliArgs;
use super::runtime::{init_logging, load_config, LoadedConfig};

pub async fn run() -> Result<()> {
    let cli = CliArgs::parse();
    init_logging(&cli.log_level)?;
    info!(version = env!("CARGO_PKG_VERSION"), "starting agentcore");

    if cli.llm_provider != "mock" {
        warn!(provider = %cli.llm_provider, "no adapter for this provider is bundled; falling back to the mock LLM");
    }

    let LoadedConfig { options, path } = load_config(cli.config.as_ref())?;
    match &path {
        Some(path) => info!(path = %path.display(), "loaded configuration"),
        None => info!("no configuration file found; using defaults"),
    }

    match cli.command {
        Commands::Run { task } => run_task(task, options).await,
        Commands::Replay { task } => replay_task(task, options).await,
    }
}

fn demo_browser() -> Arc<FakeBrowserContext> {
    FakeBrowserContext::new(vec![BrowserState::empty("https://example.com", "Example Domain", "t1")])
}

async fn run_task(task: String, options: AgentOptions) -> Result<()> {
    let executor = Executor::new(task, options, demo_browser(), Arc::new(default_registry()), Arc::new(MockChatLlm));
    let outcome = executor.execute().await;
    report(&outcome);
    executor.cleanup().await;
    if outcome.status == ExecutorStatus::Failed {
        anyhow::bail!(outcome.message);
    }
    Ok(())
}

async fn replay_task(task: String, options: AgentOptions) -> Result<()> {
    let options = options.replay_historical_tasks(true);
    let executor = Executor::new(task, options, demo_browser(), Arc::new(default_registry()), Arc::new(MockChatLlm));
    let task_id = executor.get_current_task_id().await;

    let outcome = executor.execute().await;
    report(&outcome);

    match executor.replay(&task_id.to_string(), ReplayOptions::default()).await {
        Some(steps) => {
            info!(steps = steps.len(), "replay completed");
            for step in &steps {
                info!(action = %step.action_name, failed = step.result.is_error(), "replayed step");
            }
        }
        None => info!("nothing was persisted for this task; replay skipped"),
    }

    executor.cleanup().await;
    Ok(())
}

fn report(outcome: &ExecutorOutcome) {
    if outcome.status == ExecutorStatus::Done {
        info!(steps = outcome.steps_taken, message = %outcome.message, "task finished");
    } else {
        error!(status = ?outcome.status, steps = outcome.steps_taken, message = %outcome.message, "task did not complete");
    }
}
