use serde::{Deserialize, Serialize};
use std::{
    collections::HashSet,
    path::{Path, PathBuf},
};

pub mod job;

/// The latest version of the configuration format.
pub const VERSION: &str = "v1alpha1";

#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct Config {
    pub version: String,
    #[serde(default)]
    pub backups: Vec<job::Definition>,

    /// path of the configuration file, if the configuration was loaded from a file
    #[serde(skip)]
    pub source: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            version: VERSION.to_owned(),
            backups: Vec::new(),
            source: None,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigLoadError {
    #[error("invalid configuration string")]
    InvalidConfigString(String, #[source] eyre::Report),
    #[error("invalid configuration file {}", .0.display())]
    InvalidConfigFile(PathBuf, #[source] eyre::Report),
    #[error("i/o error reading configuration file {}", .0.display())]
    IoError(PathBuf, #[source] std::io::Error),
}

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("unknown version '{0}', expected 'v1alpha1'")]
    UnknownVersion(String),
    #[error("backup names must not be empty")]
    EmptyName,
    #[error("backup names have to be unique, '{0}' is duplicate")]
    DuplicateName(job::Name),
    #[error("backup '{0}' has no commands")]
    NoCommands(job::Name),
}

impl Config {
    pub fn parse(s: &str) -> Result<Config, ConfigLoadError> {
        let config: Config = toml::from_str(s)
            .map_err(|e| ConfigLoadError::InvalidConfigString(s.to_owned(), e.into()))?;
        config
            .validate()
            .map_err(|e| ConfigLoadError::InvalidConfigString(s.to_owned(), e.into()))?;
        Ok(config)
    }

    pub async fn parse_file(p: &Path) -> Result<Config, ConfigLoadError> {
        let config_string = tokio::fs::read_to_string(p)
            .await
            .map_err(|e| ConfigLoadError::IoError(p.to_owned(), e))?;
        let mut config: Config = toml::from_str(&config_string)
            .map_err(|e| ConfigLoadError::InvalidConfigFile(p.to_owned(), e.into()))?;
        config
            .validate()
            .map_err(|e| ConfigLoadError::InvalidConfigFile(p.to_owned(), e.into()))?;
        config.source = Some(p.to_owned());
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.version != VERSION {
            return Err(ValidationError::UnknownVersion(self.version.clone()));
        }
        let mut names = HashSet::new();
        for backup in &self.backups {
            if backup.name.0.is_empty() {
                return Err(ValidationError::EmptyName);
            }
            if !names.insert(&backup.name) {
                return Err(ValidationError::DuplicateName(backup.name.clone()));
            }
            if backup.commands.is_empty() {
                return Err(ValidationError::NoCommands(backup.name.clone()));
            }
        }
        Ok(())
    }
}
