use backsched_core::outdated::OutdatedInfo;
use notify_rust::Notification;

const SUMMARY: &str = "The following backups are outdated:";

fn body(outdated: &[OutdatedInfo<'_>]) -> String {
    outdated
        .iter()
        .map(|info| format!("  - {}", info))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Shows a desktop notification listing the outdated backups; does nothing if there are none.
pub fn notify_outdated(outdated: &[OutdatedInfo<'_>]) -> eyre::Result<()> {
    if outdated.is_empty() {
        return Ok(());
    }
    Notification::new()
        .summary(SUMMARY)
        .body(&body(outdated))
        .show()?;
    Ok(())
}
