use backsched_core::{cancellation, config::Config, state::StateFile};
use clap::Parser;
use cli::{Cli, Cmd};

mod cli;
mod commands;
mod logging;
mod notifications;
mod secrets;

/// Cancels the run on the first interrupt or termination signal.
async fn cancel_on_signal(send: cancellation::Send) -> eyre::Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut terminate = signal(SignalKind::terminate())?;
        tokio::select! {
            result = tokio::signal::ctrl_c() => {
                result?;
                send.cancel(cancellation::Reason::Interrupt);
            }
            _ = terminate.recv() => send.cancel(cancellation::Reason::Terminate),
        }
    }
    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await?;
        send.cancel(cancellation::Reason::Interrupt);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    color_eyre::install()?;
    let args = Cli::parse();
    logging::setup(args.verbose)?;

    let config_file = args.config_dir.config_file()?;
    let state_file = StateFile::new(args.config_dir.state_file()?);
    let config = Config::parse_file(&config_file).await?;
    if let Some(version) = backsched_core::VERSION {
        tracing::debug!("backsched: {}", version);
    }
    tracing::debug!(config = %config_file.display(), state = %state_file.path().display(), "loaded configuration");

    let (send, recv) = cancellation::new();
    tokio::spawn(async move {
        if let Err(error) = cancel_on_signal(send).await {
            tracing::warn!("failed to listen for signals: {}", error);
        }
    });

    match args.subcommand {
        Cmd::Backup(backup_args) => commands::backup(&config, state_file, backup_args, recv).await,
        Cmd::Check(check_args) => commands::check(&config, state_file, check_args).await,
        Cmd::Config => commands::config(&config),
    }
}
