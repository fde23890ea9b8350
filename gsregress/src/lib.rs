use anyhow::Context;
use cli::Cli;
use dotenv::dotenv;
use models::config::RegressionConfig;
use services::planner::Planner;
use std::process::ExitCode;
use tracing::{error, warn};
use tracing_subscriber::EnvFilter;

pub mod cli;
pub mod models;
pub mod services;

/// Run the whole regression pass for `config`. `Ok(false)` means a strict run saw a failing
/// batch; without `strict` only output directory setup can fail the run.
pub async fn execute(config: RegressionConfig) -> anyhow::Result<bool> {
    let strict = config.strict;
    let dumpdir = config.dumpdir.clone();
    let report = Planner::new(config)
        .run()
        .await
        .with_context(|| format!("Regression run into {dumpdir:?} aborted"))?;

    if strict && !report.all_succeeded() {
        warn!("{} of {} batch(es) failed", report.failures(), report.len());
        return Ok(false);
    }
    Ok(true)
}

pub async fn run() -> ExitCode {
    dotenv().ok();
    // stdout is reserved for --dry-run output
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();

    let cli = Cli::parse_normalized();
    let result = match RegressionConfig::from_cli(cli) {
        Ok(config) => execute(config).await,
        Err(e) => Err(e.into()),
    };

    match result {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}
