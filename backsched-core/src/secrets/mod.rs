use crate::{
    cancellation,
    config::job::{self, SecretId},
};
use std::collections::HashMap;

#[derive(Clone, PartialEq, Eq)]
pub struct SecretValue(pub String);

impl SecretValue {
    pub fn new(value: impl Into<String>) -> Self {
        SecretValue(value.into())
    }
}

impl std::fmt::Debug for SecretValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SecretValue(***)")
    }
}

/// Resolved secret values of one backup, by secret id.
pub type Secrets = HashMap<SecretId, SecretValue>;

/// Source of secret values, e.g. an interactive prompt.
#[async_trait::async_trait]
pub trait SecretProvider: Send + Sync {
    async fn resolve(&self, backup: &job::Name, id: &SecretId) -> eyre::Result<SecretValue>;
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to get secret '{0}'")]
    Resolve(SecretId, #[source] eyre::Report),
    #[error("{0} while waiting for secret '{1}'")]
    Cancelled(cancellation::Reason, SecretId),
}

/// Collects secrets for backups, asking the provider only once per secret id.
///
/// Values live as long as the collector, which is created per run.
pub struct SecretCollector<'a> {
    provider: &'a dyn SecretProvider,
    resolved: HashMap<SecretId, SecretValue>,
}

impl<'a> SecretCollector<'a> {
    pub fn new(provider: &'a dyn SecretProvider) -> Self {
        SecretCollector {
            provider,
            resolved: HashMap::new(),
        }
    }

    pub async fn collect(
        &mut self,
        backup: &job::Definition,
        cancel: &mut cancellation::Recv,
    ) -> Result<Secrets, Error> {
        let mut secrets = Secrets::new();
        for id in backup.secret_ids() {
            if secrets.contains_key(id) {
                continue;
            }
            let value = match self.resolved.get(id) {
                Some(value) => value.clone(),
                None => {
                    tracing::debug!(secret = %id, "asking for secret");
                    let value = tokio::select! {
                        value = self.provider.resolve(&backup.name, id) => {
                            value.map_err(|e| Error::Resolve(id.clone(), e))?
                        }
                        reason = cancel.recv() => return Err(Error::Cancelled(reason, id.clone())),
                    };
                    self.resolved.insert(id.clone(), value.clone());
                    value
                }
            };
            secrets.insert(id.clone(), value);
        }
        Ok(secrets)
    }
}

impl std::fmt::Debug for SecretCollector<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretCollector")
            .field("resolved", &self.resolved.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}
