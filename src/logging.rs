use std::io::IsTerminal;
use tracing::Level;
use tracing_subscriber::{
    filter::LevelFilter, fmt::layer, layer::SubscriberExt, util::SubscriberInitExt, Registry,
};

pub fn level(verbose: bool) -> Level {
    if verbose {
        Level::DEBUG
    } else {
        Level::INFO
    }
}

/// Colors only for a terminal, and never if `NO_COLOR` is set.
fn ansi(stderr_is_terminal: bool, no_color: bool) -> bool {
    stderr_is_terminal && !no_color
}

/// Logs to stderr so command output on stdout stays clean.
pub fn setup(verbose: bool) -> eyre::Result<()> {
    Registry::default()
        .with(LevelFilter::from(level(verbose)))
        .with(
            layer()
                .with_ansi(ansi(
                    std::io::stderr().is_terminal(),
                    std::env::var_os("NO_COLOR").is_some(),
                ))
                .with_target(false)
                .without_time()
                .with_writer(std::io::stderr),
        )
        .try_init()?;
    Ok(())
}
