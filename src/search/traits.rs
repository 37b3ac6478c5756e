//! Traits and types for search providers

use crate::types::SearchMatch;
use async_trait::async_trait;

/// How a provider waits for its backend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchMode {
    /// The backend call blocks; it is moved onto the blocking pool
    Blocking,
    /// The backend call yields while waiting
    Suspending,
}

/// Trait for search providers
///
/// Maps free text (or a reference the engine could not handle) to the single
/// best-matching playable URL. Every implementation requests exactly one
/// top-ranked result.
///
/// # Errors
///
/// Returns an error only when the provider could not be queried. An empty result
/// set is `Ok(None)`.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Resolve `query` to its best match, if any
    async fn resolve_best(&self, query: &str) -> crate::Result<Option<SearchMatch>>;

    /// How this provider waits for its backend
    fn mode(&self) -> SearchMode;

    /// Human-readable name for logging
    fn name(&self) -> &'static str;
}
