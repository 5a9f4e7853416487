use crate::new_workdir;
use backsched_core::{
    backup::{self, Context, Options},
    cancellation,
    clock::SystemClock,
    config::{
        job::{self, SecretId},
        Config,
    },
    exec::ProcessRunner,
    requirement::OsFilesystem,
    secrets::{SecretProvider, SecretValue},
    state::{self, StateFile},
};
use std::sync::Mutex;

#[derive(Default)]
struct RecordingPrompt(Mutex<Vec<String>>);

#[async_trait::async_trait]
impl SecretProvider for RecordingPrompt {
    async fn resolve(&self, _: &job::Name, id: &SecretId) -> eyre::Result<SecretValue> {
        self.0.lock().unwrap().push(id.0.clone());
        Ok(SecretValue::new(format!("secret-{}", id)))
    }
}

fn config(toml: String) -> Config {
    Config::parse(&toml).unwrap()
}

#[tokio::test]
async fn should_run_due_backups_and_persist_state() {
    let first = new_workdir();
    let second = new_workdir();
    let state_dir = tempfile::tempdir().unwrap();
    let state_file = StateFile::new(state_dir.path().join("state.json"));
    let prompt = RecordingPrompt::default();
    let config = config(format!(
        r#"
        version = "v1alpha1"

        [[backups]]
        name = "first"
        interval = "1h"
        requires = [{{ path = "{dir}" }}]

        [[backups.commands]]
        cmd = "{first}"
        args = ["backup"]
        secret-env = {{ RESTIC_PASSWORD = "repo" }}

        [[backups]]
        name = "second"
        interval = "1h"

        [[backups.commands]]
        cmd = "{second}"
        env = {{ RESTIC_REPOSITORY = "/srv/repo" }}
        secret-env = {{ RESTIC_PASSWORD = "repo" }}
        "#,
        dir = state_dir.path().display(),
        first = first.bin().display(),
        second = second.bin().display(),
    ));
    let runner = ProcessRunner::default();
    let ctx = Context {
        store: &state_file,
        fs: &OsFilesystem,
        runner: &runner,
        secrets: &prompt,
        clock: &SystemClock,
    };

    let report = backup::run(
        &config.backups,
        ctx,
        Options::default(),
        &mut cancellation::never(),
    )
    .await
    .unwrap();

    assert_eq!(report.succeeded.len(), 2);
    assert_eq!(*prompt.0.lock().unwrap(), vec!["repo"]);
    assert_eq!(first.args().unwrap(), vec!["backup"]);
    assert_eq!(
        second.env().unwrap(),
        vec![
            ("RESTIC_PASSWORD".to_owned(), "secret-repo".to_owned()),
            ("RESTIC_REPOSITORY".to_owned(), "/srv/repo".to_owned()),
        ]
    );
    let saved = state::load(&state_file).await;
    assert!(saved.last_run(&job::Name("first".to_owned())).is_some());
    assert!(saved.last_run(&job::Name("second".to_owned())).is_some());
    assert!(backup::check(&config.backups, &state_file, &SystemClock)
        .await
        .is_empty());
}

#[tokio::test]
async fn should_stop_at_failing_backup_and_keep_earlier_results() {
    let ok = new_workdir();
    let failing = new_workdir().with_exit_status(1).unwrap();
    let never = new_workdir();
    let state_dir = tempfile::tempdir().unwrap();
    let state_file = StateFile::new(state_dir.path().join("state.json"));
    let config = config(format!(
        r#"
        version = "v1alpha1"

        [[backups]]
        name = "ok"
        interval = "1h"
        [[backups.commands]]
        cmd = "{ok}"

        [[backups]]
        name = "failing"
        interval = "1h"
        [[backups.commands]]
        cmd = "{failing}"

        [[backups]]
        name = "never"
        interval = "1h"
        [[backups.commands]]
        cmd = "{never}"
        "#,
        ok = ok.bin().display(),
        failing = failing.bin().display(),
        never = never.bin().display(),
    ));
    let runner = ProcessRunner::default();
    let ctx = Context {
        store: &state_file,
        fs: &OsFilesystem,
        runner: &runner,
        secrets: &RecordingPrompt::default(),
        clock: &SystemClock,
    };

    let error = backup::run(
        &config.backups,
        ctx,
        Options::default(),
        &mut cancellation::never(),
    )
    .await
    .unwrap_err();

    assert_eq!(error.backup(), &job::Name("failing".to_owned()));
    assert!(!never.was_run());
    let saved = state::load(&state_file).await;
    assert!(saved.last_run(&job::Name("ok".to_owned())).is_some());
    assert!(saved.last_run(&job::Name("failing".to_owned())).is_none());
}

#[tokio::test]
async fn should_not_run_anything_or_write_state_in_dry_run() {
    let workdir = new_workdir();
    let state_dir = tempfile::tempdir().unwrap();
    let state_file = StateFile::new(state_dir.path().join("state.json"));
    let prompt = RecordingPrompt::default();
    let config = config(format!(
        r#"
        version = "v1alpha1"

        [[backups]]
        name = "home"
        interval = "1day"
        [[backups.commands]]
        cmd = "{bin}"
        secret-env = {{ RESTIC_PASSWORD = "repo" }}
        "#,
        bin = workdir.bin().display(),
    ));
    let runner = ProcessRunner::default();
    let ctx = Context {
        store: &state_file,
        fs: &OsFilesystem,
        runner: &runner,
        secrets: &prompt,
        clock: &SystemClock,
    };

    backup::run(
        &config.backups,
        ctx,
        Options {
            dry_run: true,
            ask_secrets: true,
        },
        &mut cancellation::never(),
    )
    .await
    .unwrap();

    assert!(!workdir.was_run());
    assert!(prompt.0.lock().unwrap().is_empty());
    assert!(!state_file.path().exists());
}
