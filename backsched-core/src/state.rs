use crate::config::job;
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, path::PathBuf};
use time::OffsetDateTime;

#[derive(Debug, PartialEq, Eq, Copy, Clone, Serialize, Deserialize)]
#[serde(transparent)]
struct Timestamp(#[serde(with = "time::serde::rfc3339")] OffsetDateTime);

/// Time of the last successful run of every backup that ever succeeded.
#[derive(Debug, PartialEq, Eq, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct State(BTreeMap<job::Name, Timestamp>);

impl State {
    pub fn new() -> Self {
        Default::default()
    }

    /// Returns `None` if the backup never ran successfully.
    pub fn last_run(&self, name: &job::Name) -> Option<OffsetDateTime> {
        self.0.get(name).map(|t| t.0)
    }

    pub fn record(&mut self, name: job::Name, at: OffsetDateTime) {
        self.0
            .insert(name, Timestamp(at.to_offset(time::UtcOffset::UTC)));
    }

    pub fn iter(&self) -> impl Iterator<Item = (&job::Name, OffsetDateTime)> {
        self.0.iter().map(|(name, t)| (name, t.0))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(job::Name, OffsetDateTime)> for State {
    fn from_iter<T: IntoIterator<Item = (job::Name, OffsetDateTime)>>(iter: T) -> Self {
        let mut state = State::new();
        for (name, at) in iter {
            state.record(name, at);
        }
        state
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to read state file {}", .0.display())]
    Read(PathBuf, #[source] std::io::Error),
    #[error("failed to write state file {}", .0.display())]
    Write(PathBuf, #[source] std::io::Error),
    #[error("corrupt state file {}", .0.display())]
    Corrupt(PathBuf, #[source] serde_json::Error),
    #[error("failed to serialize state")]
    Serialize(#[source] serde_json::Error),
}

/// Durable storage for the backup state.
#[async_trait::async_trait]
pub trait Store: Send + Sync {
    async fn read(&self) -> Result<State, Error>;

    async fn write(&self, state: &State) -> Result<(), Error>;
}

/// Loads the state, falling back to an empty state if it can't be read.
pub async fn load(store: &dyn Store) -> State {
    match store.read().await {
        Ok(state) => state,
        Err(error) => {
            let error = eyre::Report::new(error);
            tracing::warn!("loading state, assuming no previous backups: {:#}", error);
            State::new()
        }
    }
}

/// Saves the state; failures are logged, losing the update only means repeating work.
pub async fn save(store: &dyn Store, state: &State) {
    match store.write(state).await {
        Ok(()) => tracing::debug!(entries = state.len(), "saved state"),
        Err(error) => tracing::error!("writing state: {:#}", eyre::Report::new(error)),
    }
}

/// State stored as a JSON file.
#[derive(Debug, Clone)]
pub struct StateFile(PathBuf);

impl StateFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        StateFile(path.into())
    }

    pub fn path(&self) -> &std::path::Path {
        &self.0
    }
}

#[async_trait::async_trait]
impl Store for StateFile {
    async fn read(&self) -> Result<State, Error> {
        let buf = tokio::fs::read(&self.0)
            .await
            .map_err(|e| Error::Read(self.0.clone(), e))?;
        serde_json::from_slice(&buf).map_err(|e| Error::Corrupt(self.0.clone(), e))
    }

    async fn write(&self, state: &State) -> Result<(), Error> {
        let buf = serde_json::to_vec_pretty(state).map_err(Error::Serialize)?;
        if let Some(parent) = self.0.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| Error::Write(self.0.clone(), e))?;
        }
        // write-then-rename, readers never see a partially written file
        let tmp = self.0.with_extension("json.tmp");
        tokio::fs::write(&tmp, &buf)
            .await
            .map_err(|e| Error::Write(tmp.clone(), e))?;
        tokio::fs::rename(&tmp, &self.0)
            .await
            .map_err(|e| Error::Write(self.0.clone(), e))
    }
}
