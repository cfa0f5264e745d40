//! Status query for the running pipeline.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::watcher::{Watcher, WatcherStatus};

/// Result of a status query.
///
/// `status` and `file_watcher.is_running` describe the poll loop of the
/// calling process only. A `watch` running in another process shows up
/// through the ledger counts, not as `running`.
#[derive(Debug, Clone, Serialize)]
pub struct StatusResult {
    pub status: &'static str,
    pub file_watcher: WatcherStatus,
    pub timestamp: DateTime<Utc>,
}

pub async fn get_status(watcher: &Watcher) -> StatusResult {
    let file_watcher = watcher.status().await;
    StatusResult {
        status: if file_watcher.is_running { "running" } else { "idle" },
        file_watcher,
        timestamp: Utc::now(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use tempfile::TempDir;

    #[tokio::test]
    async fn idle_without_local_poll_loop() {
        let tmp = TempDir::new().unwrap();
        let watcher = Watcher::from_config(&Config::new(tmp.path()));
        let result = get_status(&watcher).await;
        assert_eq!(result.status, "idle");
        assert!(!result.file_watcher.is_running);
        assert_eq!(result.file_watcher.ledger.total_records, 0);
    }
}
