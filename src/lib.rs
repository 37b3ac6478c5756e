//! # ticket-dl
//!
//! Resolve a media reference (a URL or free search text) to an audio file,
//! publish the file's location under a caller-chosen ticket, and delete the
//! file again once a retention window has passed.
//!
//! ## Workflow
//!
//! 1. The reference is normalized (playlist continuations are stripped).
//! 2. The extraction engine (`yt-dlp` or `youtube-dl`) downloads it. If the
//!    engine cannot get the reference, the search provider is asked for the best
//!    match and the engine retries with that URL.
//! 3. The result is written to the ticket store as `{path, name}`.
//! 4. The file is deleted after `expiration.retention` (300 seconds by default).
//!
//! ## Quick Start
//!
//! ```no_run
//! use ticket_dl::{Config, TicketDownloader, TicketId};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut config = Config::default();
//!     config.download.media_root = "/srv/media".into();
//!
//!     let downloader = TicketDownloader::new(config).await?;
//!
//!     // Subscribe to events
//!     let mut events = downloader.subscribe();
//!     tokio::spawn(async move {
//!         while let Ok(event) = events.recv().await {
//!             println!("Event: {:?}", event);
//!         }
//!     });
//!
//!     downloader.submit("lofi beats", TicketId::new("t1")).await?;
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Configuration types
pub mod config;
/// Media extraction engines
pub mod engine;
/// Error types
pub mod error;
/// Download execution with search fallback
pub mod executor;
/// Delayed file deletion
pub mod expiration;
/// Reference normalization
pub mod normalize;
/// Search providers
pub mod search;
/// Ticket persistence
pub mod tickets;
/// Core types and events
pub mod types;
/// Utility functions
pub mod utils;
/// Download-persist-expire workflow
pub mod workflow;

// Re-export commonly used types
pub use config::{Config, EngineKind, ExpirationShutdown};
pub use engine::{CliEngine, ExtractionEngine, NoOpEngine, ProgressEvent, ProgressHookConfig};
pub use error::{DatabaseError, Error, ExtractionError, Result};
pub use executor::DownloadExecutor;
pub use expiration::{ExpirationOutcome, ExpirationScheduler};
pub use normalize::normalize_reference;
pub use search::{
    BlockingSearchProvider, CliSearchProvider, InvidiousSearchProvider, SearchMode,
    SearchProvider,
};
pub use tickets::{MemoryTicketStore, SqliteTicketStore, TicketStore};
pub use types::{
    DownloadOutcome, DownloadResult, Event, SearchMatch, TicketId, TicketRecord, TicketStatus,
};
pub use workflow::TicketDownloader;

/// Helper function to run the downloader with graceful signal handling.
///
/// Waits for a termination signal and then calls the downloader's `shutdown()` method.
///
/// - **Unix:** listens for SIGTERM and SIGINT, with fallbacks if signal registration fails.
/// - **Windows/other:** listens for Ctrl+C via `tokio::signal::ctrl_c()`.
///
/// # Example
///
/// ```no_run
/// use ticket_dl::{Config, TicketDownloader, run_with_shutdown};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let downloader = TicketDownloader::new(Config::default()).await?;
///
///     // Run with automatic signal handling
///     run_with_shutdown(downloader).await?;
///
///     Ok(())
/// }
/// ```
pub async fn run_with_shutdown(downloader: TicketDownloader) -> Result<()> {
    wait_for_signal().await;
    downloader.shutdown().await
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    // Registration can fail in restricted environments (containers, tests)
    let sigterm = signal(SignalKind::terminate());
    let sigint = signal(SignalKind::interrupt());

    match (sigterm, sigint) {
        (Ok(mut sigterm), Ok(mut sigint)) => {
            tokio::select! {
                _ = sigterm.recv() => {
                    tracing::info!("Received SIGTERM signal");
                }
                _ = sigint.recv() => {
                    tracing::info!("Received SIGINT signal (Ctrl+C)");
                }
            }
        }
        (Err(e), Ok(mut sigint)) => {
            tracing::warn!(error = %e, "Could not register SIGTERM handler, waiting for SIGINT only");
            sigint.recv().await;
            tracing::info!("Received SIGINT signal (Ctrl+C)");
        }
        (Ok(mut sigterm), Err(e)) => {
            tracing::warn!(error = %e, "Could not register SIGINT handler, waiting for SIGTERM only");
            sigterm.recv().await;
            tracing::info!("Received SIGTERM signal");
        }
        (Err(e), Err(_)) => {
            tracing::error!(error = %e, "Could not register any signal handlers, using ctrl_c fallback");
            tokio::signal::ctrl_c().await.ok();
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            tracing::info!("Received Ctrl+C signal");
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C signal");
        }
    }
}
