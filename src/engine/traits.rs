//! Traits and types for extraction engines

use crate::config::{DownloadConfig, EngineKind};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Status field of a progress event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressStatus {
    /// Bytes are still arriving
    Downloading,
    /// The file is complete on disk
    Finished,
    /// The engine reported an error for this item
    Error,
    /// Any status this crate does not interpret
    Other(String),
}

impl ProgressStatus {
    /// Map the engine's status string
    pub fn parse(status: &str) -> Self {
        match status.trim() {
            "downloading" => Self::Downloading,
            "finished" => Self::Finished,
            "error" => Self::Error,
            other => Self::Other(other.to_string()),
        }
    }
}

/// One status event reported by the engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressEvent {
    /// Event status; only `Finished` is acted on
    pub status: ProgressStatus,
    /// Output file the event refers to
    pub filename: Option<PathBuf>,
    /// Total size string as printed by the engine (e.g. "3.45MiB")
    pub total_bytes_str: Option<String>,
    /// Percentage string as printed by the engine (e.g. " 45.3%")
    pub percent_str: Option<String>,
}

/// Callback receiving engine status events
pub type ProgressHook = Arc<dyn Fn(&ProgressEvent) + Send + Sync>;

/// Options handed to the engine for a single download attempt
///
/// Carries the fixed engine options plus one hook slot. Build a fresh value for
/// every attempt; a value is never shared between concurrent downloads, so a hook
/// only ever sees events from the attempt it was attached to.
#[derive(Clone)]
pub struct ProgressHookConfig {
    /// Only download the referenced item, not its playlist
    pub no_playlist: bool,
    /// Suppress engine chatter
    pub quiet: bool,
    /// Suppress engine warnings
    pub no_warnings: bool,
    /// Absolute output template (`<media_root>/<title>.<epoch>.<ext>`)
    pub output_template: PathBuf,
    /// Format selector (e.g. "bestaudio[ext=m4a]")
    pub format: String,
    hook: Option<ProgressHook>,
}

impl ProgressHookConfig {
    /// Build options from the download config, rooted at `media_root`
    pub fn new(media_root: &Path, download: &DownloadConfig) -> Self {
        Self {
            no_playlist: download.no_playlist,
            quiet: download.quiet,
            no_warnings: download.no_warnings,
            output_template: media_root.join(&download.output_template),
            format: download.audio_format.clone(),
            hook: None,
        }
    }

    /// Attach the progress hook, replacing any previous one
    pub fn with_hook<F>(mut self, hook: F) -> Self
    where
        F: Fn(&ProgressEvent) + Send + Sync + 'static,
    {
        self.hook = Some(Arc::new(hook));
        self
    }

    /// Deliver an event to the attached hook, if any
    pub fn emit(&self, event: &ProgressEvent) {
        if let Some(hook) = &self.hook {
            hook(event);
        }
    }
}

impl std::fmt::Debug for ProgressHookConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressHookConfig")
            .field("no_playlist", &self.no_playlist)
            .field("quiet", &self.quiet)
            .field("no_warnings", &self.no_warnings)
            .field("output_template", &self.output_template)
            .field("format", &self.format)
            .field("hook", &self.hook.is_some())
            .finish()
    }
}

/// Trait for media extraction engines
///
/// An engine resolves a reference to a stream and writes it to disk, reporting
/// status through the hook in the [`ProgressHookConfig`]. `extract` blocks for
/// the whole download; callers run it on a blocking worker.
///
/// # Errors
///
/// Implementations return [`Error::Extraction`](crate::Error::Extraction) with
/// [`ExtractionError::DownloadFailed`](crate::ExtractionError::DownloadFailed)
/// when the engine ran but could not get the reference. Any other error means the
/// engine itself is unusable and is not worth a search fallback.
pub trait ExtractionEngine: Send + Sync {
    /// Download `reference` according to `options`
    fn extract(&self, reference: &str, options: &ProgressHookConfig) -> crate::Result<()>;

    /// Engine flavor; decides which search backend pairs with it
    fn kind(&self) -> EngineKind;

    /// Human-readable name for logging
    fn name(&self) -> &'static str;
}
