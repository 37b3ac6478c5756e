//! Test configuration helpers for creating downloaders backed by fake engines

use tempfile::TempDir;
use ticket_dl::config::ExpirationShutdown;
use ticket_dl::{Config, EngineKind, TicketDownloader};

/// Build a config rooted in `temp_dir` that runs `binary` as the engine
pub fn test_config(temp_dir: &TempDir, kind: EngineKind, binary: std::path::PathBuf) -> Config {
    let mut config = Config::default();
    config.download.media_root = temp_dir.path().join("media");
    config.engine.kind = kind;
    config.engine.binary_path = Some(binary);
    config.engine.search_path = false;
    config.persistence.database_path = temp_dir.path().join("tickets.db");
    config.expiration.on_shutdown = ExpirationShutdown::Cancel;
    config
}

/// Create a downloader driving the fake engine for `kind`
///
/// Returns the downloader and temp directory (keep temp_dir alive for test duration)
#[cfg(unix)]
pub async fn create_fake_downloader(
    kind: EngineKind,
    record_status: bool,
) -> (TicketDownloader, TempDir) {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let script = match kind {
        EngineKind::YtDlp => super::FAKE_YT_DLP,
        EngineKind::YoutubeDl => super::FAKE_YOUTUBE_DL,
    };
    let binary = super::write_script(temp_dir.path(), kind.binary_name(), script);

    let mut config = test_config(&temp_dir, kind, binary);
    config.tickets.record_status = record_status;

    let downloader = TicketDownloader::new(config)
        .await
        .expect("Failed to create downloader");
    (downloader, temp_dir)
}
