use std::time::Duration;
use tokio::process::Child;

#[derive(Debug, PartialEq, Eq, Hash, Copy, Clone)]
pub enum ExitStatus {
    Successful,
    Failed(i32),
    Signalled(i32),
    Unknown,
}

impl ExitStatus {
    pub fn success(&self) -> bool {
        self == &ExitStatus::Successful
    }

    pub fn message(&self) -> String {
        match self {
            ExitStatus::Successful => "exited successfully".to_owned(),
            ExitStatus::Failed(code) => format!("exited with error status {}", code),
            ExitStatus::Signalled(signal) => format!("terminated by signal {}", signal),
            ExitStatus::Unknown => "exited with unknown error status".to_owned(),
        }
    }
}

impl From<std::process::ExitStatus> for ExitStatus {
    fn from(status: std::process::ExitStatus) -> Self {
        if status.success() {
            ExitStatus::Successful
        } else if let Some(code) = status.code() {
            ExitStatus::Failed(code)
        } else {
            signal(status)
        }
    }
}

#[cfg(unix)]
fn signal(status: std::process::ExitStatus) -> ExitStatus {
    use std::os::unix::process::ExitStatusExt;

    status
        .signal()
        .map(ExitStatus::Signalled)
        .unwrap_or(ExitStatus::Unknown)
}

#[cfg(not(unix))]
fn signal(_status: std::process::ExitStatus) -> ExitStatus {
    ExitStatus::Unknown
}

#[cfg(unix)]
fn ask_to_terminate(child: &mut Child) -> std::io::Result<()> {
    match child.id() {
        Some(pid) => {
            if unsafe { libc::kill(pid as i32, libc::SIGTERM) } == 0 {
                Ok(())
            } else {
                Err(std::io::Error::last_os_error())
            }
        }
        // already reaped
        None => Ok(()),
    }
}

#[cfg(not(unix))]
fn ask_to_terminate(child: &mut Child) -> std::io::Result<()> {
    child.start_kill()
}

#[derive(Debug)]
pub struct Process(pub(crate) Child);

impl Process {
    pub async fn wait(&mut self) -> std::io::Result<ExitStatus> {
        Ok(self.0.wait().await?.into())
    }

    #[tracing::instrument(level = "debug", skip_all, fields(pid = self.0.id(), grace_period_secs = grace_period.as_secs_f64()))]
    pub async fn terminate(&mut self, grace_period: Duration) -> std::io::Result<()> {
        tracing::debug!("trying to terminate gracefully");
        ask_to_terminate(&mut self.0)?;
        match tokio::time::timeout(grace_period, self.wait()).await {
            Ok(result) => {
                tracing::debug!("process terminated before timeout");
                result?;
            }
            Err(_) => {
                tracing::debug!("process did not terminate before timeout, killing it instead");
                self.0.kill().await?;
            }
        };
        Ok(())
    }
}
