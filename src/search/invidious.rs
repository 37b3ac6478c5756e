//! Invidious HTTP API search

use super::traits::{SearchMode, SearchProvider};
use crate::error::{Error, Result};
use crate::types::SearchMatch;
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use url::Url;

/// One item of `/api/v1/search`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchItem {
    #[serde(rename = "type", default)]
    kind: Option<String>,
    #[serde(default)]
    video_id: Option<String>,
    #[serde(default)]
    title: Option<String>,
}

/// Search through an Invidious instance's JSON API
///
/// Requests `GET {base}/api/v1/search?q=<query>&type=video&page=1` and takes the
/// first video. Used instead of the engine executable when
/// `search.invidious_url` is configured.
#[derive(Debug, Clone)]
pub struct InvidiousSearchProvider {
    client: reqwest::Client,
    base_url: Url,
}

impl InvidiousSearchProvider {
    /// Create a provider for the instance at `base_url`
    pub fn new(base_url: Url, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client, base_url })
    }

    fn search_url(&self) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| Error::Config {
                message: format!("invalid invidious base URL: {}", self.base_url),
                key: Some("search.invidious_url".into()),
            })?
            .pop_if_empty()
            .extend(["api", "v1", "search"]);
        Ok(url)
    }
}

#[async_trait]
impl SearchProvider for InvidiousSearchProvider {
    async fn resolve_best(&self, query: &str) -> Result<Option<SearchMatch>> {
        let url = self.search_url()?;
        tracing::debug!(provider = self.name(), %url, query, "Searching");

        let items: Vec<SearchItem> = self
            .client
            .get(url)
            .query(&[("q", query), ("type", "video"), ("page", "1")])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let best = items
            .into_iter()
            .filter(|item| item.kind.as_deref().is_none_or(|k| k == "video"))
            .find_map(|item| item.video_id.map(|id| (id, item.title)));

        Ok(best.map(|(id, title)| SearchMatch {
            url: format!("https://www.youtube.com/watch?v={id}"),
            id: Some(id),
            title,
            provider: self.name().to_string(),
        }))
    }

    fn mode(&self) -> SearchMode {
        SearchMode::Suspending
    }

    fn name(&self) -> &'static str {
        "invidious"
    }
}
