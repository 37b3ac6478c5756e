//! Custom test assertions for integration tests

use std::time::Duration;
use ticket_dl::{Event, TicketDownloader, TicketId, TicketRecord, TicketStatus};

/// Poll the store until `ticket` reaches `status` or `timeout` passes
pub async fn wait_for_ticket(
    downloader: &TicketDownloader,
    ticket: &TicketId,
    status: TicketStatus,
    timeout: Duration,
) -> Option<TicketRecord> {
    tokio::time::timeout(timeout, async {
        loop {
            if let Ok(Some(record)) = downloader.ticket(ticket).await
                && record.status == status
            {
                return record;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    })
    .await
    .ok()
}

/// Drain every event currently buffered in `rx`
pub fn drain_events(rx: &mut tokio::sync::broadcast::Receiver<Event>) -> Vec<Event> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

/// Assert that `ticket` holds a ready record pointing at `file_name`
pub async fn assert_ticket_ready(downloader: &TicketDownloader, ticket: &TicketId, file_name: &str) {
    let record = downloader
        .ticket(ticket)
        .await
        .expect("Failed to read ticket")
        .unwrap_or_else(|| panic!("ticket {ticket} was never written"));
    assert_eq!(record.status, TicketStatus::Ready, "ticket {ticket}: {record:?}");
    assert_eq!(record.name.as_deref(), Some(file_name));
    let path = record.path.expect("ready record without path");
    assert!(path.is_absolute(), "path should be absolute: {}", path.display());
    assert_eq!(
        path.file_name().and_then(|n| n.to_str()),
        Some(file_name)
    );
}
