use backsched_core::{
    config::job::{self, SecretId},
    secrets::{SecretProvider, SecretValue},
};

/// Asks for secrets on the controlling terminal without echoing them.
#[derive(Debug, Default, Copy, Clone)]
pub struct TerminalPrompt;

pub fn prompt(backup: &job::Name, id: &SecretId) -> String {
    format!("[backup \"{}\" {}]: ", backup, id)
}

/// Runs a blocking read on a detached thread.
///
/// A cancelled read is abandoned rather than waited for, so it can't hold up runtime shutdown
/// the way a `spawn_blocking` task would.
async fn read_detached<F>(read: F) -> eyre::Result<String>
where
    F: FnOnce() -> std::io::Result<String> + Send + 'static,
{
    let (send, recv) = tokio::sync::oneshot::channel();
    std::thread::Builder::new()
        .name("secret-prompt".to_owned())
        .spawn(move || {
            // the receiver is gone if the prompt was cancelled
            let _ = send.send(read());
        })?;
    Ok(recv.await??)
}

#[async_trait::async_trait]
impl SecretProvider for TerminalPrompt {
    async fn resolve(&self, backup: &job::Name, id: &SecretId) -> eyre::Result<SecretValue> {
        let prompt = prompt(backup, id);
        let value = read_detached(move || rpassword::prompt_password(prompt)).await?;
        Ok(SecretValue::new(value))
    }
}
