//! Ticket persistence
//!
//! A ticket is a caller-chosen id under which the outcome of one download is
//! published. Stores implement [`TicketStore`]:
//!
//! - [`SqliteTicketStore`]: durable, optional TTL
//! - [`MemoryTicketStore`]: process-local
//!
//! Records are JSON objects, so an external consumer polling the store reads
//! `{"status": "ready", "path": ..., "name": ..., ...}`.

mod memory;
mod sqlite;
mod traits;

pub use memory::MemoryTicketStore;
pub use sqlite::SqliteTicketStore;
pub use traits::TicketStore;

use crate::error::Result;
use crate::types::{DownloadResult, TicketId, TicketRecord};

/// Publish a completed download under `ticket`
///
/// Writes a `ready` record carrying the file's path and display name. Store
/// errors propagate unchanged; nothing is retried.
pub async fn persist(
    store: &dyn TicketStore,
    ticket: &TicketId,
    result: &DownloadResult,
) -> Result<()> {
    store.set(ticket, &TicketRecord::ready(result)).await?;
    tracing::debug!(
        ticket = %ticket,
        store = store.name(),
        path = %result.path.display(),
        "Ticket persisted"
    );
    Ok(())
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TicketStatus;
    use std::path::PathBuf;

    #[tokio::test]
    async fn test_persist_writes_path_and_name() {
        let store = MemoryTicketStore::new();
        let ticket = TicketId::new("t1");
        let result = DownloadResult {
            name: "lofi_beats.169999.m4a".into(),
            size: "3.45MiB".into(),
            path: PathBuf::from("/srv/media/lofi_beats.169999.m4a"),
        };

        persist(&store, &ticket, &result).await.unwrap();

        let record = store.get(&ticket).await.unwrap().unwrap();
        assert_eq!(record.status, TicketStatus::Ready);
        assert_eq!(record.path.as_deref(), Some(result.path.as_path()));
        assert_eq!(record.name.as_deref(), Some("lofi_beats.169999.m4a"));
        assert_eq!(record.size.as_deref(), Some("3.45MiB"));
    }
}
