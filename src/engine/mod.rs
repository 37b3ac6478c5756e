//! Media extraction engines
//!
//! The core abstraction is the [`ExtractionEngine`] trait: given a reference and
//! a [`ProgressHookConfig`], download the media and report status events through
//! the hook. Implementations:
//!
//! - [`CliEngine`]: runs the `yt-dlp` or `youtube-dl` executable
//! - [`NoOpEngine`]: stand-in when no executable is available
//!
//! Engines block for the whole download; the executor runs them on tokio's
//! blocking pool.

mod cli;
mod noop;
pub mod parser;
mod traits;

pub use cli::CliEngine;
pub use noop::NoOpEngine;
pub use traits::{ExtractionEngine, ProgressEvent, ProgressHook, ProgressHookConfig, ProgressStatus};

use crate::config::EngineConfig;
use std::sync::Arc;

/// Pick the engine described by `config`
///
/// An explicit binary path wins; otherwise PATH is searched (if allowed) and the
/// no-op engine is used when nothing is found.
pub fn engine_for(config: &EngineConfig) -> Arc<dyn ExtractionEngine> {
    let engine: Arc<dyn ExtractionEngine> = if let Some(ref path) = config.binary_path {
        Arc::new(CliEngine::new(path.clone(), config.kind))
    } else if config.search_path {
        CliEngine::from_path(config.kind)
            .map(|e| Arc::new(e) as Arc<dyn ExtractionEngine>)
            .unwrap_or_else(|| Arc::new(NoOpEngine::new(config.kind)))
    } else {
        Arc::new(NoOpEngine::new(config.kind))
    };

    tracing::info!(
        engine = engine.name(),
        kind = ?engine.kind(),
        "Extraction engine initialized"
    );
    engine
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineKind;
    use std::path::PathBuf;

    #[test]
    fn test_explicit_binary_path_wins() {
        let config = EngineConfig {
            kind: EngineKind::YoutubeDl,
            binary_path: Some(PathBuf::from("/opt/bin/youtube-dl")),
            search_path: false,
        };
        let engine = engine_for(&config);
        assert_eq!(engine.name(), "cli-youtube-dl");
        assert_eq!(engine.kind(), EngineKind::YoutubeDl);
    }

    #[test]
    fn test_no_path_search_falls_back_to_noop() {
        let config = EngineConfig {
            kind: EngineKind::YtDlp,
            binary_path: None,
            search_path: false,
        };
        assert_eq!(engine_for(&config).name(), "noop");
    }
}
