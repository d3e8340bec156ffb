//! Watch command: run the sync service in the foreground

use colored::Colorize;
use mindmap_sync::{Notification, NotificationLevel, SyncService};
use tokio::sync::broadcast::error::RecvError;
use tracing::warn;

use crate::context::Context;
use crate::error::Result;

fn print_notification(notification: &Notification) {
    let level = notification.level.to_string();
    let level = match notification.level {
        NotificationLevel::Info => level.as_str().green(),
        NotificationLevel::Warning => level.as_str().yellow(),
        NotificationLevel::Error => level.as_str().red(),
    };
    println!("{} {}", level.bold(), notification.message);
}

/// Poll the file and autosave on schedule until Ctrl-C.
pub async fn run_watch(context: &Context) -> Result<()> {
    let coordinator = context.open().await?;
    let mut notifications = coordinator.subscribe();
    let service = SyncService::start(coordinator, &context.settings);

    println!(
        "Watching {} (poll every {}s, autosave every {}s). Press Ctrl-C to stop.",
        context.file.as_str().cyan(),
        context.settings.poll_interval().as_secs(),
        context.settings.autosave_interval().as_secs()
    );

    loop {
        tokio::select! {
            signal = tokio::signal::ctrl_c() => {
                signal?;
                break;
            }
            received = notifications.recv() => match received {
                Ok(notification) => print_notification(&notification),
                Err(RecvError::Lagged(skipped)) => warn!(skipped, "Missed notifications"),
                Err(RecvError::Closed) => break,
            }
        }
    }

    let mut coordinator = service.shutdown().await?;
    if coordinator.auto_save().await? {
        println!("{} Saved pending changes", "OK".green().bold());
    }
    println!("{}", "Stopped".dimmed());
    Ok(())
}
