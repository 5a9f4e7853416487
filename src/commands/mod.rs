use crate::{cli, notifications, secrets::TerminalPrompt};
use backsched_core::{
    backup::{self, Context, Options},
    cancellation,
    clock::SystemClock,
    config::Config,
    exec::ProcessRunner,
    outdated::OutdatedInfo,
    requirement::OsFilesystem,
    state::StateFile,
};
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

fn write_color(text: &str, fg_color: Color) -> std::io::Result<()> {
    use std::io::Write as _;

    let mut stdout = StandardStream::stdout(ColorChoice::Auto);
    stdout.set_color(ColorSpec::new().set_fg(Some(fg_color)))?;
    let result = stdout.write_all(text.as_bytes());
    stdout.reset().ok();
    result
}

fn print_outdated(outdated: &[OutdatedInfo<'_>]) -> eyre::Result<()> {
    if outdated.is_empty() {
        write_color("all backups are up to date", Color::Green)?;
        println!();
    }
    for info in outdated {
        write_color(&info.backup.name.0, Color::Yellow)?;
        println!(" needs backup, last backup was {}", info.since);
    }
    Ok(())
}

pub async fn backup(
    config: &Config,
    state_file: StateFile,
    args: cli::backup::Cli,
    mut cancel: cancellation::Recv,
) -> eyre::Result<()> {
    let runner = ProcessRunner::default();
    let ctx = Context {
        store: &state_file,
        fs: &OsFilesystem,
        runner: &runner,
        secrets: &TerminalPrompt,
        clock: &SystemClock,
    };
    let options = Options {
        dry_run: args.dry_run,
        ask_secrets: args.ask_secrets,
    };

    let report = backup::run(&config.backups, ctx, options, &mut cancel).await?;
    for (name, unmet) in &report.skipped {
        tracing::info!(backup = %name, "skipped: {}", unmet);
    }
    tracing::info!(
        succeeded = report.succeeded.len(),
        skipped = report.skipped.len(),
        "all due backups finished"
    );
    Ok(())
}

pub async fn check(config: &Config, state_file: StateFile, args: cli::check::Cli) -> eyre::Result<()> {
    let outdated = backup::check(&config.backups, &state_file, &SystemClock).await;
    print_outdated(&outdated)?;
    if args.notify {
        notifications::notify_outdated(&outdated)?;
    }
    Ok(())
}

pub fn config(config: &Config) -> eyre::Result<()> {
    print!("{}", toml::to_string_pretty(config)?);
    Ok(())
}
