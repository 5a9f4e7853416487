use crate::{config::job, state::State};
use std::time::Duration;
use time::OffsetDateTime;

#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub enum Since {
    Never,
    Elapsed(Duration),
}

impl std::fmt::Display for Since {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Since::Never => write!(f, "never"),
            Since::Elapsed(elapsed) => write!(f, "{} ago", format_duration(*elapsed)),
        }
    }
}

/// A backup that is due.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct OutdatedInfo<'a> {
    pub since: Since,
    pub backup: &'a job::Definition,
}

impl std::fmt::Display for OutdatedInfo<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: last backup was {}", self.backup.name, self.since)
    }
}

fn format_duration(d: Duration) -> String {
    const MINUTE: u64 = 60;
    const HOUR: u64 = 60 * MINUTE;
    const DAY: u64 = 24 * HOUR;

    let secs = d.as_secs();
    if secs < MINUTE {
        "less than a minute".to_owned()
    } else if secs < HOUR {
        format!("{}m", secs / MINUTE)
    } else if secs < 48 * HOUR {
        format!("{}h", secs / HOUR)
    } else {
        format!("{} days", secs / DAY)
    }
}

/// Returns the backups that are due at `now`, in configuration order.
///
/// A backup is due if it never ran or if at least its interval has passed since its last run.
pub fn evaluate<'a>(
    backups: &'a [job::Definition],
    state: &State,
    now: OffsetDateTime,
) -> Vec<OutdatedInfo<'a>> {
    backups
        .iter()
        .filter_map(|backup| {
            let since = match state.last_run(&backup.name) {
                None => Since::Never,
                Some(last_run) => {
                    // a last run in the future counts as just now
                    let elapsed = Duration::try_from(now - last_run).unwrap_or(Duration::ZERO);
                    if elapsed < backup.interval {
                        tracing::debug!(
                            backup = %backup.name,
                            "not due, last backup was {} ago",
                            format_duration(elapsed)
                        );
                        return None;
                    }
                    Since::Elapsed(elapsed)
                }
            };
            Some(OutdatedInfo { since, backup })
        })
        .collect()
}
