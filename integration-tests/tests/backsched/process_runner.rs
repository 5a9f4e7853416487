use crate::new_workdir;
use backsched_core::{
    cancellation,
    exec::{Error, ExitStatus, Invocation, ProcessRunner, Runner},
};
use maplit::btreemap;
use std::time::{Duration, Instant};

fn invocation(bin: std::path::PathBuf) -> Invocation {
    Invocation {
        executable: bin,
        args: vec![],
        env: Default::default(),
        workdir: None,
    }
}

#[tokio::test]
async fn should_pass_arguments_in_order() {
    let workdir = new_workdir();
    let invocation = Invocation {
        args: vec!["backup".to_owned(), "--one-file-system".to_owned(), "/home".to_owned()],
        ..invocation(workdir.bin())
    };

    ProcessRunner::default()
        .run(&invocation, &mut cancellation::never())
        .await
        .unwrap();

    assert_eq!(
        workdir.args().unwrap(),
        vec!["backup", "--one-file-system", "/home"]
    );
}

#[tokio::test]
async fn should_only_pass_configured_environment() {
    let workdir = new_workdir();
    let invocation = Invocation {
        env: btreemap! {
            "RESTIC_REPOSITORY".to_owned() => "/srv/repo".to_owned(),
            "RESTIC_PASSWORD".to_owned() => "hunter2".to_owned(),
        },
        ..invocation(workdir.bin())
    };

    ProcessRunner::default()
        .run(&invocation, &mut cancellation::never())
        .await
        .unwrap();

    assert_eq!(
        workdir.env().unwrap(),
        vec![
            ("RESTIC_PASSWORD".to_owned(), "hunter2".to_owned()),
            ("RESTIC_REPOSITORY".to_owned(), "/srv/repo".to_owned()),
        ]
    );
}

#[tokio::test]
async fn should_run_in_configured_working_directory() {
    let workdir = new_workdir();
    let cwd = tempfile::tempdir().unwrap();
    let invocation = Invocation {
        workdir: Some(cwd.path().to_owned()),
        ..invocation(workdir.bin())
    };

    ProcessRunner::default()
        .run(&invocation, &mut cancellation::never())
        .await
        .unwrap();

    assert_eq!(
        workdir.cwd().unwrap().canonicalize().unwrap(),
        cwd.path().canonicalize().unwrap()
    );
}

#[tokio::test]
async fn should_fail_with_exit_status() {
    let workdir = new_workdir().with_exit_status(3).unwrap();

    let result = ProcessRunner::default()
        .run(&invocation(workdir.bin()), &mut cancellation::never())
        .await;

    assert!(matches!(
        result,
        Err(Error::Exited(_, ExitStatus::Failed(3)))
    ));
}

#[tokio::test]
async fn should_fail_if_working_directory_is_missing() {
    let workdir = new_workdir();
    let invocation = Invocation {
        workdir: Some(workdir.path().join("missing")),
        ..invocation(workdir.bin())
    };

    let result = ProcessRunner::default()
        .run(&invocation, &mut cancellation::never())
        .await;

    assert!(matches!(result, Err(Error::FailedToStart(..))));
    assert!(!workdir.was_run());
}

#[tokio::test]
async fn should_terminate_process_when_cancelled() {
    let workdir = new_workdir().with_sleep(Duration::from_secs(30)).unwrap();
    let (send, mut recv) = cancellation::new();
    let started = Instant::now();

    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(200)).await;
        send.cancel(cancellation::Reason::Interrupt);
    });
    let result = ProcessRunner::new(Duration::from_secs(5))
        .run(&invocation(workdir.bin()), &mut recv)
        .await;

    assert!(matches!(
        result,
        Err(Error::Cancelled(_, cancellation::Reason::Interrupt))
    ));
    assert!(started.elapsed() < Duration::from_secs(10));
}
