//! Process start-up: resolve config, wire services, drive the scheduler

use crate::cli::Cli;
use release_train::config::{PartialConfig, TrainConfig, default_config_path, load_config_file};
use release_train::error::Result;
use release_train::platform::GitLabService;
use release_train::scheduler::Scheduler;
use release_train::tracker::JiraService;
use release_train::train::MergeTrain;
use std::sync::Arc;
use tracing::{debug, info};

/// Run the train until shutdown, or for one pass with `--once`
pub async fn run(cli: Cli) -> Result<()> {
    let config = resolve_config(&cli)?;
    info!(
        target_branch = %config.gitlab.target_branch,
        project = %config.jira.project_key,
        release = ?config.jira.release,
        dry_run = config.policy.dry_run,
        "starting release train"
    );

    let platform = Arc::new(GitLabService::new(&config.gitlab)?);
    let tracker = Arc::new(JiraService::new(&config.jira)?);
    let train = Arc::new(MergeTrain::new(&config, platform, tracker)?);
    let scheduler = Scheduler::new(train, config.poll_interval);

    if cli.once {
        let report = scheduler.run_once().await?;
        for outcome in &report.outcomes {
            println!("!{}: {}", outcome.iid, outcome.action);
        }
        return Ok(());
    }

    scheduler.run(shutdown_signal()).await;
    Ok(())
}

fn resolve_config(cli: &Cli) -> Result<TrainConfig> {
    let file = match &cli.config {
        Some(path) => load_config_file(path)?,
        None => match default_config_path().filter(|p| p.exists()) {
            Some(path) => {
                debug!(path = %path.display(), "loading default config file");
                load_config_file(&path)?
            }
            None => PartialConfig::default(),
        },
    };

    cli.to_partial().or(file).resolve()
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => info!("received SIGINT"),
                    _ = sigterm.recv() => info!("received SIGTERM"),
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to register SIGTERM handler");
                let _ = tokio::signal::ctrl_c().await;
                info!("received SIGINT");
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
        info!("received SIGINT");
    }
}
