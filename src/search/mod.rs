//! Search providers used when direct extraction fails
//!
//! The core abstraction is the [`SearchProvider`] trait. Implementations:
//!
//! - [`BlockingSearchProvider`]: engine executable, blocking call on the blocking pool
//! - [`CliSearchProvider`]: engine executable, async child process
//! - [`InvidiousSearchProvider`]: Invidious JSON API over HTTP
//!
//! [`provider_for`] pairs a provider with the active engine.

mod blocking;
mod cli;
mod invidious;
mod traits;

pub use blocking::BlockingSearchProvider;
pub use cli::CliSearchProvider;
pub use invidious::InvidiousSearchProvider;
pub use traits::{SearchMode, SearchProvider};

use crate::config::{Config, EngineKind};
use crate::error::Result;
use std::path::PathBuf;
use std::sync::Arc;

/// Pick the search provider for the engine flavor in use
///
/// A configured Invidious instance wins. Otherwise youtube-dl pairs with the
/// blocking provider and yt-dlp with the suspending one, both running the same
/// executable the engine uses.
pub fn provider_for(config: &Config, kind: EngineKind) -> Result<Arc<dyn SearchProvider>> {
    if let Some(ref base) = config.search.invidious_url {
        let provider = InvidiousSearchProvider::new(base.clone(), config.search.timeout)?;
        tracing::info!(provider = provider.name(), %base, "Search provider initialized");
        return Ok(Arc::new(provider));
    }

    let binary = config
        .engine
        .binary_path
        .clone()
        .or_else(|| {
            config
                .engine
                .search_path
                .then(|| which::which(kind.binary_name()).ok())
                .flatten()
        })
        .unwrap_or_else(|| PathBuf::from(kind.binary_name()));

    let provider: Arc<dyn SearchProvider> = match kind {
        EngineKind::YoutubeDl => Arc::new(BlockingSearchProvider::new(binary)),
        EngineKind::YtDlp => Arc::new(CliSearchProvider::new(binary)),
    };
    tracing::info!(
        provider = provider.name(),
        mode = ?provider.mode(),
        "Search provider initialized"
    );
    Ok(provider)
}
