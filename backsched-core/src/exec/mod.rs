use crate::{cancellation, config::job, secrets::Secrets};
use std::{collections::BTreeMap, path::PathBuf, process::Stdio, time::Duration};

pub use process::*;

mod process;

/// A fully resolved command line, ready to run.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Invocation {
    pub executable: PathBuf,
    pub args: Vec<String>,
    pub env: BTreeMap<String, String>,
    pub workdir: Option<PathBuf>,
}

impl Invocation {
    /// Combines the static environment with the secrets; secret values win on conflicts.
    ///
    /// Secret variables whose value wasn't collected are left out.
    pub fn new(command: &job::Command, secrets: &Secrets) -> Self {
        let mut env = command.env.clone();
        for (var, id) in &command.secret_env {
            if let Some(value) = secrets.get(id) {
                env.insert(var.clone(), value.0.clone());
            }
        }
        Invocation {
            executable: command.cmd.clone(),
            args: command.args.clone(),
            env,
            workdir: command.workdir.clone(),
        }
    }
}

impl std::fmt::Display for Invocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.executable.display())?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to start '{}'", .0.display())]
    FailedToStart(PathBuf, #[source] std::io::Error),
    #[error("error waiting for '{}'", .0.display())]
    Wait(PathBuf, #[source] std::io::Error),
    #[error("'{}' {}", .0.display(), .1.message())]
    Exited(PathBuf, ExitStatus),
    #[error("'{}' was {1}", .0.display())]
    Cancelled(PathBuf, cancellation::Reason),
}

/// Runs a single command to completion.
#[async_trait::async_trait]
pub trait Runner: Send + Sync {
    async fn run(
        &self,
        invocation: &Invocation,
        cancel: &mut cancellation::Recv,
    ) -> Result<(), Error>;
}

/// Runs commands as child processes sharing this process's terminal.
#[derive(Debug, Copy, Clone)]
pub struct ProcessRunner {
    grace_period: Duration,
}

impl ProcessRunner {
    pub const DEFAULT_GRACE_PERIOD: Duration = Duration::from_secs(10);

    pub fn new(grace_period: Duration) -> Self {
        ProcessRunner { grace_period }
    }
}

impl Default for ProcessRunner {
    fn default() -> Self {
        ProcessRunner::new(Self::DEFAULT_GRACE_PERIOD)
    }
}

enum Outcome {
    Exited(std::io::Result<ExitStatus>),
    Cancelled(cancellation::Reason),
}

#[async_trait::async_trait]
impl Runner for ProcessRunner {
    async fn run(
        &self,
        invocation: &Invocation,
        cancel: &mut cancellation::Recv,
    ) -> Result<(), Error> {
        let mut cmd = tokio::process::Command::new(&invocation.executable);
        cmd.args(&invocation.args)
            .env_clear()
            .envs(&invocation.env)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            // kill-on-drop is a final fallback, normally the process gets terminated gracefully
            .kill_on_drop(true);
        if let Some(workdir) = &invocation.workdir {
            cmd.current_dir(workdir);
        }

        tracing::info!("running {}", invocation);
        let mut process = Process(
            cmd.spawn()
                .map_err(|e| Error::FailedToStart(invocation.executable.clone(), e))?,
        );

        let outcome = tokio::select! {
            status = process.wait() => Outcome::Exited(status),
            reason = cancel.recv() => Outcome::Cancelled(reason),
        };
        match outcome {
            Outcome::Exited(Ok(status)) if status.success() => Ok(()),
            Outcome::Exited(Ok(status)) => {
                Err(Error::Exited(invocation.executable.clone(), status))
            }
            Outcome::Exited(Err(e)) => Err(Error::Wait(invocation.executable.clone(), e)),
            Outcome::Cancelled(reason) => {
                tracing::info!(%reason, "stopping {}", invocation);
                if let Err(error) = process.terminate(self.grace_period).await {
                    tracing::warn!(%error, "failed to terminate process");
                }
                Err(Error::Cancelled(invocation.executable.clone(), reason))
            }
        }
    }
}

/// Logs what would have run without running anything.
#[derive(Debug, Default, Copy, Clone)]
pub struct DryRunner;

#[async_trait::async_trait]
impl Runner for DryRunner {
    async fn run(&self, invocation: &Invocation, _: &mut cancellation::Recv) -> Result<(), Error> {
        tracing::info!(
            workdir = ?invocation.workdir,
            env = ?invocation.env.keys().collect::<Vec<_>>(),
            "would have run {}",
            invocation
        );
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("command #{} failed", .index + 1)]
pub struct CommandFailed {
    /// zero-based position of the command in the backup
    pub index: usize,
    #[source]
    pub error: Error,
}

/// Runs all commands of a backup in order, stopping at the first failure.
pub async fn run_commands(
    backup: &job::Definition,
    secrets: &Secrets,
    runner: &dyn Runner,
    cancel: &mut cancellation::Recv,
) -> Result<(), CommandFailed> {
    for (index, command) in backup.commands.iter().enumerate() {
        let invocation = Invocation::new(command, secrets);
        runner
            .run(&invocation, cancel)
            .await
            .map_err(|error| CommandFailed { index, error })?;
    }
    Ok(())
}
