//! End-to-end workflow tests against fake engine executables
//!
//! Each test writes a small shell script standing in for `yt-dlp` or
//! `youtube-dl` and drives the full stack through it: CLI engine, CLI search
//! provider, SQLite ticket store and expiration scheduler.

#![cfg(unix)]

mod common;

use common::{
    FAKE_YT_DLP, KNOWN_FILE, KNOWN_VIDEO, assert_ticket_ready, create_fake_downloader,
    drain_events, init_tracing, test_config, wait_for_ticket, write_script,
};
use serial_test::serial;
use std::time::Duration;
use ticket_dl::{EngineKind, Event, TicketDownloader, TicketId, TicketStatus};

#[tokio::test]
#[serial]
async fn test_free_text_resolves_through_search() {
    init_tracing();
    let (downloader, temp_dir) = create_fake_downloader(EngineKind::YtDlp, true).await;
    let ticket = TicketId::new("t1");

    let result = downloader
        .run("lofi beats", ticket.clone())
        .await
        .expect("workflow failed")
        .expect("expected a download");

    assert_eq!(result.name, KNOWN_FILE);
    assert_eq!(result.size, "3.45MiB");
    assert_eq!(result.path, temp_dir.path().join("media").join(KNOWN_FILE));
    assert!(result.path.exists());
    assert_ticket_ready(&downloader, &ticket, KNOWN_FILE).await;
    assert_eq!(downloader.expiration().pending(), 1);

    downloader.shutdown().await.unwrap();
}

#[tokio::test]
#[serial]
async fn test_no_match_is_never_written_without_status_records() {
    init_tracing();
    let (downloader, _temp_dir) = create_fake_downloader(EngineKind::YtDlp, false).await;
    let ticket = TicketId::new("t2");

    let result = downloader.run("zzzz nothing", ticket.clone()).await.unwrap();

    assert!(result.is_none());
    assert!(downloader.ticket(&ticket).await.unwrap().is_none());
    assert_eq!(downloader.expiration().pending(), 0);

    downloader.shutdown().await.unwrap();
}

#[tokio::test]
#[serial]
async fn test_no_match_records_failure() {
    init_tracing();
    let (downloader, _temp_dir) = create_fake_downloader(EngineKind::YtDlp, true).await;
    let ticket = TicketId::new("t2");

    assert!(downloader.run("zzzz nothing", ticket.clone()).await.unwrap().is_none());

    let record = downloader.ticket(&ticket).await.unwrap().unwrap();
    assert_eq!(record.status, TicketStatus::Failed);
    assert!(record.error.unwrap().contains("zzzz nothing"));

    downloader.shutdown().await.unwrap();
}

#[tokio::test]
#[serial]
async fn test_playlist_reference_downloads_single_item() {
    init_tracing();
    let (downloader, _temp_dir) = create_fake_downloader(EngineKind::YtDlp, true).await;
    let mut events = downloader.subscribe();

    let result = downloader
        .run(&format!("{KNOWN_VIDEO}&list=PL123&index=3"), "t1")
        .await
        .unwrap();

    assert!(result.is_some());
    let sources: Vec<String> = drain_events(&mut events)
        .into_iter()
        .filter_map(|e| match e {
            Event::Downloaded { source, .. } => Some(source),
            _ => None,
        })
        .collect();
    assert_eq!(sources, vec![KNOWN_VIDEO.to_string()]);

    downloader.shutdown().await.unwrap();
}

#[tokio::test]
#[serial]
async fn test_youtube_dl_console_dialect() {
    init_tracing();
    let (downloader, _temp_dir) = create_fake_downloader(EngineKind::YoutubeDl, true).await;
    let ticket = TicketId::new("t1");

    let result = downloader.run("lofi beats", ticket.clone()).await.unwrap();

    let result = result.expect("expected a download");
    assert_eq!(result.size, "3.45MiB");
    assert_ticket_ready(&downloader, &ticket, KNOWN_FILE).await;

    downloader.shutdown().await.unwrap();
}

#[tokio::test]
#[serial]
async fn test_submitted_tickets_become_ready() {
    init_tracing();
    let (downloader, _temp_dir) = create_fake_downloader(EngineKind::YtDlp, true).await;

    let handles = vec![
        downloader.submit("lofi beats", "t1").await.unwrap(),
        downloader.submit(KNOWN_VIDEO, "t2").await.unwrap(),
        downloader.submit("zzzz nothing", "t3").await.unwrap(),
    ];
    let results = futures::future::join_all(handles).await;

    assert!(results[0].as_ref().unwrap().as_ref().unwrap().is_some());
    assert!(results[1].as_ref().unwrap().as_ref().unwrap().is_some());
    assert!(results[2].as_ref().unwrap().as_ref().unwrap().is_none());

    for id in ["t1", "t2"] {
        let ticket = TicketId::new(id);
        assert!(
            wait_for_ticket(&downloader, &ticket, TicketStatus::Ready, Duration::from_secs(5))
                .await
                .is_some(),
            "ticket {id} never became ready"
        );
    }
    let failed = downloader.ticket(&TicketId::new("t3")).await.unwrap().unwrap();
    assert_eq!(failed.status, TicketStatus::Failed);

    downloader.shutdown().await.unwrap();
}

#[tokio::test]
#[serial]
async fn test_file_expires_but_ticket_remains() {
    init_tracing();
    let temp_dir = tempfile::tempdir().unwrap();
    let binary = write_script(temp_dir.path(), "yt-dlp", FAKE_YT_DLP);
    let mut config = test_config(&temp_dir, EngineKind::YtDlp, binary);
    config.expiration.retention = Duration::from_millis(200);

    let downloader = TicketDownloader::new(config).await.unwrap();
    let mut events = downloader.subscribe();
    let ticket = TicketId::new("t1");

    let result = downloader.run(KNOWN_VIDEO, ticket.clone()).await.unwrap().unwrap();
    assert!(result.path.exists());

    let expired = tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            match events.recv().await {
                Ok(Event::Expired { path }) => return path,
                Ok(_) => continue,
                Err(e) => panic!("event channel failed: {e}"),
            }
        }
    })
    .await
    .expect("file was never expired");

    assert_eq!(expired, result.path);
    assert!(!result.path.exists());
    // Ticket lifetime is independent of the file's
    assert_ticket_ready(&downloader, &ticket, KNOWN_FILE).await;

    downloader.shutdown().await.unwrap();
}

#[tokio::test]
#[serial]
async fn test_tickets_survive_restart() {
    init_tracing();
    let (downloader, _temp_dir) = create_fake_downloader(EngineKind::YtDlp, true).await;
    let ticket = TicketId::new("t1");

    downloader.run(KNOWN_VIDEO, ticket.clone()).await.unwrap();
    let config = (*downloader.get_config()).clone();
    downloader.shutdown().await.unwrap();

    let reopened = TicketDownloader::new(config).await.unwrap();
    assert_ticket_ready(&reopened, &ticket, KNOWN_FILE).await;
    reopened.shutdown().await.unwrap();
}

#[tokio::test]
#[serial]
async fn test_missing_engine_is_an_error() {
    init_tracing();
    let temp_dir = tempfile::tempdir().unwrap();
    let mut config = test_config(
        &temp_dir,
        EngineKind::YtDlp,
        temp_dir.path().join("does-not-exist"),
    );
    config.tickets.record_status = true;

    let downloader = TicketDownloader::new(config).await.unwrap();
    let err = downloader.run(KNOWN_VIDEO, "t1").await.unwrap_err();
    assert!(matches!(err, ticket_dl::Error::ExternalTool(_)), "{err}");

    downloader.shutdown().await.unwrap();
}
