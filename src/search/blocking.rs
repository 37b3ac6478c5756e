//! Engine-executable search, blocking variant

use super::cli::{parse_search_output, search_args};
use super::traits::{SearchMode, SearchProvider};
use crate::error::{Error, Result};
use crate::types::SearchMatch;
use crate::utils::tail_lines;
use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Command;

/// Search through the engine executable with a blocking call
///
/// The child process is run with `std::process` on tokio's blocking pool, so the
/// caller still suspends cooperatively. Paired with the youtube-dl engine.
#[derive(Debug, Clone)]
pub struct BlockingSearchProvider {
    binary_path: PathBuf,
}

impl BlockingSearchProvider {
    /// Create a provider with an explicit binary path
    pub fn new(binary_path: PathBuf) -> Self {
        Self { binary_path }
    }

    /// Run the search on the current thread
    pub fn search_blocking(&self, query: &str) -> Result<Option<SearchMatch>> {
        let output = Command::new(&self.binary_path)
            .args(search_args(query))
            .output()
            .map_err(|e| {
                Error::ExternalTool(format!(
                    "Failed to execute {}: {}",
                    self.binary_path.display(),
                    e
                ))
            })?;

        if !output.status.success() {
            return Err(Error::Search(format!(
                "search for {query:?} failed: {}",
                tail_lines(&String::from_utf8_lossy(&output.stderr), 3)
            )));
        }
        parse_search_output(&output.stdout, "blocking-cli-search")
    }
}

#[async_trait]
impl SearchProvider for BlockingSearchProvider {
    async fn resolve_best(&self, query: &str) -> Result<Option<SearchMatch>> {
        tracing::debug!(provider = self.name(), query, "Searching");
        let provider = self.clone();
        let query = query.to_string();
        tokio::task::spawn_blocking(move || provider.search_blocking(&query))
            .await
            .map_err(|e| Error::Search(format!("search worker failed: {e}")))?
    }

    fn mode(&self) -> SearchMode {
        SearchMode::Blocking
    }

    fn name(&self) -> &'static str {
        "blocking-cli-search"
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blocking_missing_binary_is_an_error() {
        let provider =
            BlockingSearchProvider::new(PathBuf::from("/nonexistent/ticket-dl-search-xyz"));
        let err = provider.search_blocking("lofi beats").unwrap_err();
        assert!(matches!(err, Error::ExternalTool(_)));
    }

    #[tokio::test]
    async fn test_async_wrapper_propagates_errors() {
        let provider =
            BlockingSearchProvider::new(PathBuf::from("/nonexistent/ticket-dl-search-xyz"));
        let err = provider.resolve_best("lofi beats").await.unwrap_err();
        assert!(matches!(err, Error::ExternalTool(_)));
        assert_eq!(provider.mode(), SearchMode::Blocking);
    }
}
