/*
    Developer notes:
    - Every batch is its own runner process. The runner strides over the sorted dump directory
      using -nbatches / -batch-id, so the harness never hands out individual dumps.
    - All batches currently log to the same emulog.txt in the output directory. With more than
      one batch the runners overwrite or interleave each other's log. Known issue, left as is
      until the runner grows a per-batch log name.
    - Exit codes are collected but only matter for --strict runs.
*/
use crate::models::{
    config::RegressionConfig,
    error::HarnessError,
    report::{BatchResult, RunReport},
};
use gsrunner::{
    dump::{batch_dumps, is_gs_dump, list_dumps},
    models::{args::Args, batch::Batch, launch::LaunchOptions},
    runner::Runner,
};
use serde::Serialize;
use std::{
    fs,
    io::{self, Write},
    path::Path,
};
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

/// Batches for a requested parallelism. Anything up to 1 is a single batch.
pub fn plan_batches(parallel: i64) -> Result<Vec<Batch>, HarnessError> {
    if parallel <= 1 {
        return Ok(vec![Batch::single()]);
    }
    let count = u32::try_from(parallel).map_err(|_| HarnessError::TooManyBatches(parallel))?;
    (0..count)
        .map(|id| Batch::new(count, id).map_err(HarnessError::from))
        .collect()
}

/// Create the output directory and its parents. An existing directory is fine.
pub fn ensure_output_dir(path: &Path) -> Result<(), HarnessError> {
    match fs::create_dir_all(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists && path.is_dir() => Ok(()),
        Err(source) => Err(HarnessError::OutputDir {
            path: path.to_path_buf(),
            source,
        }),
    }
}

// one line of --dry-run output
#[derive(Debug, Serialize)]
struct PlannedInvocation<'a> {
    batch: Batch,
    argv: Vec<String>,
    #[serde(flatten)]
    launch: &'a LaunchOptions,
}

pub struct Planner {
    config: RegressionConfig,
    runner: Runner,
}

impl Planner {
    pub fn new(config: RegressionConfig) -> Self {
        let runner = Runner::new(config.launch_options());
        Self { config, runner }
    }

    pub fn invocations(&self) -> Result<Vec<Args>, HarnessError> {
        Ok(plan_batches(self.config.parallel)?
            .into_iter()
            .map(|batch| self.config.invocation(batch))
            .collect())
    }

    /// Set up the output directory, then launch every batch and wait for all of them.
    ///
    /// Only a failure to create the output directory is an error here. What the runners do is
    /// recorded in the report and otherwise left for the caller to judge.
    pub async fn run(&self) -> Result<RunReport, HarnessError> {
        ensure_output_dir(&self.config.dumpdir)?;

        let invocations = self.invocations()?;
        self.preview_dumps(&invocations);

        if self.config.dry_run {
            self.write_plan(&mut io::stdout().lock(), &invocations)?;
            return Ok(RunReport::default());
        }

        let report = if invocations.len() == 1 && !invocations[0].batch().is_parallel() {
            self.run_single(&invocations[0]).await
        } else {
            self.run_parallel(invocations).await
        };

        info!(
            "Regression run finished: {} batch(es), {} failure(s)",
            report.len(),
            report.failures()
        );
        Ok(report)
    }

    async fn run_single(&self, args: &Args) -> RunReport {
        debug!("Running {:?}", args.command_line());
        let result = BatchResult::from(self.runner.launch(args).await);
        log_result(&result);

        let mut report = RunReport::default();
        report.push(result);
        report
    }

    async fn run_parallel(&self, invocations: Vec<Args>) -> RunReport {
        info!("Processing on {} processors", invocations.len());

        let mut set = JoinSet::new();
        for args in invocations {
            debug!("Running {:?}", args.command_line());
            let runner = self.runner.clone();
            set.spawn(async move { runner.launch(&args).await });
        }

        // join barrier, results arrive in completion order
        let mut report = RunReport::default();
        let mut finished = 0;
        while let Some(joined) = set.join_next().await {
            let result = match joined {
                Ok(result) => BatchResult::from(result),
                Err(e) => BatchResult::Panicked {
                    reason: e.to_string(),
                },
            };
            info!("Process {finished} finished");
            log_result(&result);
            report.push(result);
            finished += 1;
        }
        report
    }

    // Tell the user up front how the dump directory will be split. The runner does its own
    // listing, so nothing here is fatal.
    fn preview_dumps(&self, invocations: &[Args]) {
        let gsdir = &self.config.gsdir;
        let files = match list_dumps(gsdir) {
            Ok(files) => files,
            Err(e) => {
                warn!("Unable to list dumps in {gsdir:?}: {e}");
                return;
            }
        };

        let total = files.iter().filter(|f| is_gs_dump(f)).count();
        if total == 0 {
            warn!("No GS dumps found in {gsdir:?}");
            return;
        }
        info!("Found {total} GS dump(s) in {gsdir:?}");

        for args in invocations {
            let batch = args.batch();
            debug!(
                "Batch {batch} will replay {} dump(s)",
                batch_dumps(&files, batch).len()
            );
        }
    }

    /// One JSON object per line: batch, full argument vector, env overrides and priority.
    pub fn write_plan(&self, out: &mut impl Write, invocations: &[Args]) -> Result<(), HarnessError> {
        let launch = self.runner.options();
        for args in invocations {
            let planned = PlannedInvocation {
                batch: args.batch(),
                argv: args
                    .command_line()
                    .iter()
                    .map(|s| s.to_string_lossy().into_owned())
                    .collect(),
                launch,
            };
            serde_json::to_writer(&mut *out, &planned)?;
            writeln!(out)?;
        }
        out.flush()?;
        Ok(())
    }
}

fn log_result(result: &BatchResult) {
    match result {
        BatchResult::Exited(outcome) if outcome.success() => {
            debug!("Batch {} exited cleanly", outcome.batch)
        }
        BatchResult::Exited(outcome) => match outcome.code {
            Some(code) => debug!("Batch {} exited with code {code}", outcome.batch),
            None => debug!("Batch {} was terminated by a signal", outcome.batch),
        },
        BatchResult::LaunchFailed { batch, reason } => error!("Batch {batch} failed: {reason}"),
        BatchResult::Panicked { reason } => error!("Worker task died: {reason}"),
    }
}
