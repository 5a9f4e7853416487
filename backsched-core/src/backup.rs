use crate::{
    cancellation,
    clock::Clock,
    config::job,
    exec::{self, CommandFailed, DryRunner, Runner},
    outdated::{self, OutdatedInfo},
    requirement::{self, Filesystem, Unmet},
    secrets::{self, SecretCollector, SecretProvider, Secrets},
    state::{self, State, Store},
};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Options {
    /// Log the commands instead of running them and never save the state.
    pub dry_run: bool,
    pub ask_secrets: bool,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            dry_run: false,
            ask_secrets: true,
        }
    }
}

/// The collaborators a backup run talks to.
#[derive(Clone, Copy)]
pub struct Context<'a> {
    pub store: &'a dyn Store,
    pub fs: &'a dyn Filesystem,
    pub runner: &'a dyn Runner,
    pub secrets: &'a dyn SecretProvider,
    pub clock: &'a dyn Clock,
}

impl std::fmt::Debug for Context<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context").finish_non_exhaustive()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("backup '{backup}' failed")]
    Command {
        backup: job::Name,
        #[source]
        source: CommandFailed,
    },
    #[error("failed to collect secrets for backup '{backup}'")]
    Secret {
        backup: job::Name,
        #[source]
        source: secrets::Error,
    },
    #[error("{0} before backup '{1}'")]
    Cancelled(cancellation::Reason, job::Name),
}

impl Error {
    pub fn backup(&self) -> &job::Name {
        match self {
            Error::Command { backup, .. } => backup,
            Error::Secret { backup, .. } => backup,
            Error::Cancelled(_, backup) => backup,
        }
    }
}

/// What happened to the due backups of a run that didn't fail.
#[derive(Debug, Default, PartialEq, Eq, Clone)]
pub struct Report {
    pub succeeded: Vec<job::Name>,
    pub skipped: Vec<(job::Name, Unmet)>,
}

enum Outcome {
    Succeeded,
    Skipped(Unmet),
}

/// Returns the backups that are due now without running anything.
pub async fn check<'a>(
    backups: &'a [job::Definition],
    store: &dyn Store,
    clock: &dyn Clock,
) -> Vec<OutdatedInfo<'a>> {
    let state = state::load(store).await;
    outdated::evaluate(backups, &state, clock.now())
}

/// Runs every due backup once, in configuration order.
///
/// The first failing backup stops the run. Successful backups are recorded as they finish
/// and the state is saved at the end either way, except in a dry run.
pub async fn run(
    backups: &[job::Definition],
    ctx: Context<'_>,
    options: Options,
    cancel: &mut cancellation::Recv,
) -> Result<Report, Error> {
    let mut state = state::load(ctx.store).await;
    let due = outdated::evaluate(backups, &state, ctx.clock.now());
    if due.is_empty() {
        tracing::info!("no backups are due");
    }

    let result = run_due(&due, ctx, options, &mut state, cancel).await;

    if options.dry_run {
        tracing::debug!("dry run, not saving state");
    } else {
        state::save(ctx.store, &state).await;
    }
    result
}

async fn run_due(
    due: &[OutdatedInfo<'_>],
    ctx: Context<'_>,
    options: Options,
    state: &mut State,
    cancel: &mut cancellation::Recv,
) -> Result<Report, Error> {
    let runner: &dyn Runner = if options.dry_run {
        &DryRunner
    } else {
        ctx.runner
    };
    let mut collector = SecretCollector::new(ctx.secrets);
    let mut report = Report::default();

    for info in due {
        let backup = info.backup;
        if let Some(reason) = cancel.reason() {
            return Err(Error::Cancelled(reason, backup.name.clone()));
        }
        tracing::info!(backup = %backup.name, since = %info.since, "running backup");
        match run_backup(backup, ctx.fs, runner, &mut collector, options, cancel).await? {
            Outcome::Succeeded => {
                state.record(backup.name.clone(), ctx.clock.now());
                report.succeeded.push(backup.name.clone());
            }
            Outcome::Skipped(unmet) => report.skipped.push((backup.name.clone(), unmet)),
        }
    }
    Ok(report)
}

#[tracing::instrument(skip_all, fields(backup = %backup.name))]
async fn run_backup(
    backup: &job::Definition,
    fs: &dyn Filesystem,
    runner: &dyn Runner,
    collector: &mut SecretCollector<'_>,
    options: Options,
    cancel: &mut cancellation::Recv,
) -> Result<Outcome, Error> {
    if let Err(unmet) = requirement::check_all(&backup.requires, fs) {
        tracing::info!("skipping backup: {}", unmet);
        return Ok(Outcome::Skipped(unmet));
    }

    let secrets = if options.dry_run || !options.ask_secrets {
        Secrets::new()
    } else {
        collector
            .collect(backup, cancel)
            .await
            .map_err(|source| Error::Secret {
                backup: backup.name.clone(),
                source,
            })?
    };

    exec::run_commands(backup, &secrets, runner, cancel)
        .await
        .map_err(|source| Error::Command {
            backup: backup.name.clone(),
            source,
        })?;
    tracing::info!("backup finished");
    Ok(Outcome::Succeeded)
}
