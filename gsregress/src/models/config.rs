use crate::{cli::Cli, models::error::HarnessError};
use gsrunner::models::{
    args::Args,
    batch::Batch,
    launch::{LaunchOptions, Priority},
};
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Resolved settings for one regression run. Shared read-only by every batch.
#[derive(Debug, Clone, PartialEq)]
pub struct RegressionConfig {
    /// GS runner executable, used as given.
    pub runner: PathBuf,
    /// Absolute dump directory.
    pub gsdir: PathBuf,
    /// Absolute output directory, created before anything launches.
    pub dumpdir: PathBuf,
    pub renderer: Option<String>,
    pub upscale: f64,
    pub renderhacks: Option<String>,
    /// Requested parallelism. Values up to 1, negatives included, are stored as 1 and mean a
    /// single synchronous batch.
    pub parallel: i64,
    pub strict: bool,
    pub dry_run: bool,
    pub priority: Priority,
}

impl RegressionConfig {
    pub fn new(runner: impl AsRef<Path>, gsdir: impl AsRef<Path>, dumpdir: impl AsRef<Path>) -> Self {
        Self {
            runner: runner.as_ref().to_path_buf(),
            gsdir: gsdir.as_ref().to_path_buf(),
            dumpdir: dumpdir.as_ref().to_path_buf(),
            renderer: None,
            upscale: 1.0,
            renderhacks: None,
            parallel: 1,
            strict: false,
            dry_run: false,
            priority: Priority::default(),
        }
    }

    pub fn from_cli(cli: Cli) -> Result<Self, HarnessError> {
        if !(cli.upscale.is_finite() && cli.upscale > 0.0) {
            return Err(HarnessError::InvalidUpscale(cli.upscale));
        }
        if cli.parallel > 1 && u32::try_from(cli.parallel).is_err() {
            return Err(HarnessError::TooManyBatches(cli.parallel));
        }

        let priority = if cli.normal_priority {
            Priority::Normal
        } else {
            Priority::BelowNormal
        };

        Ok(Self {
            runner: cli.runner,
            gsdir: resolve_path(&cli.gsdir)?,
            dumpdir: resolve_path(&cli.dumpdir)?,
            renderer: cli.renderer,
            upscale: cli.upscale,
            renderhacks: cli.renderhacks,
            parallel: cli.parallel.max(1),
            strict: cli.strict,
            dry_run: cli.dry_run,
            priority,
        })
    }

    pub fn launch_options(&self) -> LaunchOptions {
        LaunchOptions::default().with_priority(self.priority)
    }

    /// Invocation for one batch of this run.
    pub fn invocation(&self, batch: Batch) -> Args {
        Args::new(&self.runner, &self.gsdir, &self.dumpdir, batch)
            .with_renderer(self.renderer.clone())
            .with_upscale(self.upscale)
            .with_render_hacks(self.renderhacks.clone())
    }
}

/// Canonical path when it exists, otherwise made absolute against the working directory.
pub fn resolve_path(path: &Path) -> Result<PathBuf, HarnessError> {
    match fs::canonicalize(path) {
        Ok(resolved) => Ok(resolved),
        Err(_) => std::path::absolute(path).map_err(|source| HarnessError::ResolvePath {
            path: path.to_path_buf(),
            source,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn cli(extra: &[&str]) -> Cli {
        let mut args = vec!["gsregress", "--runner", "gsrunner", "--gsdir", ".", "--dumpdir", "out"];
        args.extend_from_slice(extra);
        Cli::try_parse_from(args).unwrap()
    }

    #[test]
    fn paths_are_absolute() {
        let config = RegressionConfig::from_cli(cli(&[])).unwrap();
        assert!(config.gsdir.is_absolute());
        assert!(config.dumpdir.is_absolute());
        assert!(config.dumpdir.ends_with("out"));
        // runner is passed through untouched
        assert_eq!(config.runner, PathBuf::from("gsrunner"));
    }

    #[test]
    fn existing_paths_are_canonical() {
        let dir = tempfile::tempdir().unwrap();
        let dotted = dir.path().join(".").join("");
        assert_eq!(resolve_path(&dotted).unwrap(), fs::canonicalize(dir.path()).unwrap());
    }

    #[test]
    fn rejects_non_positive_upscale() {
        for bad in ["0", "-2", "NaN"] {
            let err = RegressionConfig::from_cli(cli(&["--upscale", bad])).unwrap_err();
            assert!(matches!(err, HarnessError::InvalidUpscale(_)));
        }
    }

    #[test]
    fn priority_follows_flag() {
        let config = RegressionConfig::from_cli(cli(&[])).unwrap();
        assert_eq!(config.launch_options().priority, Priority::BelowNormal);

        let config = RegressionConfig::from_cli(cli(&["--normal-priority"])).unwrap();
        assert_eq!(config.launch_options().priority, Priority::Normal);
    }

    #[test]
    fn invocation_carries_shared_settings() {
        let mut config = RegressionConfig::new("/opt/gsrunner", "/dumps", "/out");
        config.renderer = Some("ogl".to_owned());
        config.upscale = 3.0;
        let args = config.invocation(Batch::new(2, 1).unwrap());
        assert_eq!(args.executable(), Path::new("/opt/gsrunner"));
        assert_eq!(args.renderer.as_deref(), Some("ogl"));
        assert_eq!(args.upscale, 3.0);
        assert_eq!(args.batch(), Batch::new(2, 1).unwrap());
        assert_eq!(args.log_file(), Path::new("/out").join("emulog.txt"));
    }
}
