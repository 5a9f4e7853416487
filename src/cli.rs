use dirs_next as dirs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct ConfigDir(Option<PathBuf>);

impl ConfigDir {
    pub fn path(&self) -> eyre::Result<&Path> {
        self.0
            .as_ref()
            .map(|p| p.as_path())
            .ok_or_else(|| eyre::eyre!("failed to get default config directory"))
    }

    pub fn config_file(&self) -> eyre::Result<PathBuf> {
        Ok(self.path()?.join("config.toml"))
    }

    pub fn state_file(&self) -> eyre::Result<PathBuf> {
        Ok(self.path()?.join("state.json"))
    }
}

impl Default for ConfigDir {
    fn default() -> Self {
        ConfigDir(dirs::config_dir().map(|dir| dir.join("backsched")))
    }
}

impl From<&str> for ConfigDir {
    fn from(s: &str) -> Self {
        ConfigDir(Some(PathBuf::from(s)))
    }
}

impl std::fmt::Display for ConfigDir {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.0 {
            Some(path) => write!(f, "{}", path.display()),
            None => write!(f, "<none>"),
        }
    }
}

/// Runs configured backup commands when they are due.
#[derive(clap::Parser)]
#[command(version)]
pub struct Cli {
    /// Sets a custom configuration directory
    #[arg(short, long, env = "BACKSCHED_CONFIG_DIR", default_value_t)]
    pub config_dir: ConfigDir,

    /// Enables debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub subcommand: Cmd,
}

#[derive(clap::Subcommand)]
pub enum Cmd {
    /// Runs all backups that are due
    Backup(backup::Cli),

    /// Lists the backups that are due without running them
    Check(check::Cli),

    /// Prints the active configuration
    Config,
}

pub mod backup {
    #[derive(clap::Args)]
    pub struct Cli {
        /// Logs the commands that would run instead of running them
        #[arg(short = 'n', long)]
        pub dry_run: bool,

        /// Asks for secrets on the terminal; without it, secret variables are left unset
        #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
        pub ask_secrets: bool,
    }
}

pub mod check {
    #[derive(clap::Args)]
    pub struct Cli {
        /// Shows a desktop notification if any backup is due
        #[arg(long)]
        pub notify: bool,
    }
}
