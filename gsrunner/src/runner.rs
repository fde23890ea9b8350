use crate::models::{
    args::Args,
    batch::Batch,
    launch::{LaunchOptions, Priority},
    outcome::Outcome,
};
use std::{io, path::PathBuf, process::Stdio};
use thiserror::Error;
use tokio::process::Command;
use tracing::debug;

#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("Unable to launch {executable:?} for batch {batch}: {source}")]
    Spawn {
        executable: PathBuf,
        batch: Batch,
        #[source]
        source: io::Error,
    },
    #[error("Lost track of runner for batch {batch}: {source}")]
    Wait {
        batch: Batch,
        #[source]
        source: io::Error,
    },
}

/// Launches GS runner processes with a fixed set of launch options.
///
/// The child gets no stdin and its stdout/stderr are discarded. Everything the runner has to say
/// goes to the `-logfile` named in its arguments.
#[derive(Debug, Clone, Default)]
pub struct Runner {
    options: LaunchOptions,
}

impl Runner {
    pub fn new(options: LaunchOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &LaunchOptions {
        &self.options
    }

    /// Build the process for one invocation without starting it.
    pub fn command(&self, args: &Args) -> Command {
        let mut cmd = Command::new(args.executable());
        cmd.args(args.create_arg_list())
            .envs(&self.options.env)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(false);

        if self.options.priority == Priority::BelowNormal {
            lower_priority(&mut cmd);
        }

        cmd
    }

    /// Run one invocation and wait for it to exit. The exit status is reported back but nothing
    /// here judges it.
    pub async fn launch(&self, args: &Args) -> Result<Outcome, RunnerError> {
        let batch = args.batch();

        let mut child = self
            .command(args)
            .spawn()
            .map_err(|source| RunnerError::Spawn {
                executable: args.executable().to_path_buf(),
                batch,
                source,
            })?;

        let status = child
            .wait()
            .await
            .map_err(|source| RunnerError::Wait { batch, source })?;

        debug!("Runner for batch {batch} exited with {status}");
        Ok(Outcome {
            batch,
            code: status.code(),
        })
    }
}

#[cfg(windows)]
fn lower_priority(cmd: &mut Command) {
    use crate::models::launch::BELOW_NORMAL_PRIORITY_CLASS;
    cmd.creation_flags(BELOW_NORMAL_PRIORITY_CLASS);
}

#[cfg(unix)]
fn lower_priority(cmd: &mut Command) {
    use crate::models::launch::NICE_INCREMENT;
    // SAFETY: nice(2) is async-signal-safe and the closure touches no parent state.
    unsafe {
        cmd.pre_exec(|| {
            // best effort, the runner keeps the inherited priority if this fails
            let _ = nix::libc::nice(NICE_INCREMENT);
            Ok(())
        });
    }
}

#[cfg(not(any(unix, windows)))]
fn lower_priority(_cmd: &mut Command) {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::launch::{NICE_INCREMENT, NO_CONSOLE_VAR};
    use std::ffi::OsStr;

    fn args(executable: &str) -> Args {
        Args::new(executable, "/dumps", "/out", Batch::single())
    }

    #[test]
    fn command_carries_arguments_and_env() {
        let runner = Runner::default();
        let args = args("/opt/gsrunner");
        let cmd = runner.command(&args);
        let std = cmd.as_std();

        assert_eq!(std.get_program(), OsStr::new("/opt/gsrunner"));
        let passed: Vec<_> = std.get_args().map(|a| a.to_os_string()).collect();
        assert_eq!(passed, args.create_arg_list());

        let env: Vec<_> = std.get_envs().collect();
        assert_eq!(
            env,
            vec![(OsStr::new(NO_CONSOLE_VAR), Some(OsStr::new("1")))]
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn launch_reports_exit_code() {
        let runner = Runner::new(LaunchOptions::default().with_priority(Priority::Normal));
        let outcome = runner.launch(&args("/bin/true")).await.unwrap();
        assert_eq!(outcome.batch, Batch::single());
        assert!(outcome.success());

        let outcome = runner.launch(&args("/bin/false")).await.unwrap();
        assert_eq!(outcome.code, Some(1));
        assert!(!outcome.success());
    }

    // Runs a script that writes `nice` output to $GS_NICE_OUT and returns what it saw.
    #[cfg(unix)]
    async fn child_niceness(priority: Priority) -> i32 {
        use std::{fs, os::unix::fs::PermissionsExt};

        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("runner.sh");
        fs::write(&script, "#!/bin/sh\nnice > \"$GS_NICE_OUT\"\n").unwrap();
        fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();
        let out = dir.path().join("nice.txt");

        let runner = Runner::new(
            LaunchOptions::default()
                .with_priority(priority)
                .with_env("GS_NICE_OUT", out.to_string_lossy()),
        );
        let args = args(script.to_str().unwrap());

        // a fork from a parallel test can briefly hold the fresh script open for writing
        let mut attempts = 0;
        let outcome = loop {
            match runner.launch(&args).await {
                Err(RunnerError::Spawn { source, .. })
                    if source.raw_os_error() == Some(nix::libc::ETXTBSY) && attempts < 20 =>
                {
                    attempts += 1;
                    tokio::time::sleep(std::time::Duration::from_millis(25)).await;
                }
                result => break result.unwrap(),
            }
        };
        assert!(outcome.success());

        fs::read_to_string(&out).unwrap().trim().parse().unwrap()
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn below_normal_priority_renices_only_the_child() {
        // nice(0) leaves our niceness alone and reports it
        let parent = unsafe { nix::libc::nice(0) };

        let lowered = child_niceness(Priority::BelowNormal).await;
        assert_eq!(lowered, (parent + NICE_INCREMENT).min(19));
        assert_eq!(child_niceness(Priority::Normal).await, parent);
        assert_eq!(unsafe { nix::libc::nice(0) }, parent);
    }

    #[tokio::test]
    async fn missing_executable_is_a_spawn_error() {
        let err = Runner::default()
            .launch(&args("/definitely/not/a/gsrunner"))
            .await
            .unwrap_err();
        assert!(matches!(err, RunnerError::Spawn { .. }));
    }
}
