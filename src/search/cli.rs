//! Engine-executable search (`ytsearch1:`), suspending variant

use super::traits::{SearchMode, SearchProvider};
use crate::error::{Error, Result};
use crate::types::SearchMatch;
use crate::utils::tail_lines;
use async_trait::async_trait;
use serde::Deserialize;
use std::path::PathBuf;
use tokio::process::Command;

const WATCH_URL: &str = "https://www.youtube.com/watch?v=";

/// Arguments asking the engine for the single best search hit as JSON
pub(crate) fn search_args(query: &str) -> Vec<String> {
    vec![
        "--dump-json".to_string(),
        "--flat-playlist".to_string(),
        "--no-warnings".to_string(),
        "--".to_string(),
        format!("ytsearch1:{query}"),
    ]
}

/// Entry printed by `--dump-json --flat-playlist`
#[derive(Debug, Deserialize)]
struct FlatEntry {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    webpage_url: Option<String>,
    #[serde(default)]
    title: Option<String>,
}

fn is_absolute_url(s: &str) -> bool {
    s.starts_with("https://") || s.starts_with("http://")
}

/// Parse engine search output into the best match
///
/// yt-dlp prints absolute `url`/`webpage_url` values; youtube-dl prints the bare
/// video id as `url`, so the watch URL is rebuilt from the id when needed.
pub(crate) fn parse_search_output(stdout: &[u8], provider: &str) -> Result<Option<SearchMatch>> {
    let output = String::from_utf8_lossy(stdout);
    let Some(line) = output.lines().map(str::trim).find(|l| !l.is_empty()) else {
        return Ok(None);
    };

    let entry: FlatEntry = serde_json::from_str(line)?;
    let url = entry
        .webpage_url
        .clone()
        .filter(|u| is_absolute_url(u))
        .or_else(|| entry.url.clone().filter(|u| is_absolute_url(u)))
        .or_else(|| entry.id.as_ref().map(|id| format!("{WATCH_URL}{id}")))
        .or_else(|| entry.url.as_ref().map(|id| format!("{WATCH_URL}{id}")));

    match url {
        Some(url) => Ok(Some(SearchMatch {
            url,
            id: entry.id,
            title: entry.title,
            provider: provider.to_string(),
        })),
        None => Err(Error::Search(format!(
            "{provider} returned an entry without id or url"
        ))),
    }
}

/// Search through the engine executable without blocking the runtime
///
/// Runs `<engine> --dump-json --flat-playlist ytsearch1:<query>` as an async
/// child process. Paired with the yt-dlp engine.
#[derive(Debug, Clone)]
pub struct CliSearchProvider {
    binary_path: PathBuf,
}

impl CliSearchProvider {
    /// Create a provider with an explicit binary path
    pub fn new(binary_path: PathBuf) -> Self {
        Self { binary_path }
    }
}

#[async_trait]
impl SearchProvider for CliSearchProvider {
    async fn resolve_best(&self, query: &str) -> Result<Option<SearchMatch>> {
        tracing::debug!(provider = self.name(), query, "Searching");
        let output = Command::new(&self.binary_path)
            .args(search_args(query))
            .kill_on_drop(true)
            .output()
            .await
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
        parse_search_output(&output.stdout, self.name())
    }

    fn mode(&self) -> SearchMode {
        SearchMode::Suspending
    }

    fn name(&self) -> &'static str {
        "cli-search"
    }
}
