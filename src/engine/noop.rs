//! No-op extraction engine for graceful degradation

use super::traits::{ExtractionEngine, ProgressHookConfig};
use crate::config::EngineKind;

/// Engine used when no yt-dlp/youtube-dl executable is available
///
/// Every extraction fails with `Error::NotSupported`, which the download path
/// treats as fatal rather than as a reason to search. The downloader can still
/// be constructed, so tickets remain queryable.
///
/// # Examples
///
/// ```
/// use ticket_dl::engine::{ExtractionEngine, NoOpEngine, ProgressHookConfig};
/// use ticket_dl::config::DownloadConfig;
/// use std::path::Path;
///
/// let engine = NoOpEngine::default();
/// let options = ProgressHookConfig::new(Path::new("/tmp"), &DownloadConfig::default());
/// assert!(engine.extract("https://youtube.com/watch?v=X", &options).is_err());
/// ```
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpEngine {
    kind: EngineKind,
}

impl NoOpEngine {
    /// Stand in for an engine of the given flavor
    pub fn new(kind: EngineKind) -> Self {
        Self { kind }
    }
}

impl ExtractionEngine for NoOpEngine {
    fn extract(&self, _reference: &str, _options: &ProgressHookConfig) -> crate::Result<()> {
        Err(crate::Error::NotSupported(format!(
            "Downloads require the {} executable. \
             Configure engine.binary_path or ensure it is in PATH.",
            self.kind.binary_name()
        )))
    }

    fn kind(&self) -> EngineKind {
        self.kind
    }

    fn name(&self) -> &'static str {
        "noop"
    }
}
