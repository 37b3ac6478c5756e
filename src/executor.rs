//! Download execution with search fallback
//!
//! [`DownloadExecutor::download`] normalizes a reference, hands it to the
//! extraction engine and, when the engine cannot get it, asks the search
//! provider for the best match and tries again with that URL.

use crate::config::DownloadConfig;
use crate::engine::{ExtractionEngine, ProgressHookConfig};
use crate::error::{Error, ExtractionError, Result};
use crate::normalize::normalize_reference;
use crate::search::SearchProvider;
use crate::types::{DownloadOutcome, DownloadResult, Event, TicketId};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tokio::sync::{Semaphore, broadcast};

/// Runs download attempts against an engine, falling back to search
pub struct DownloadExecutor {
    engine: Arc<dyn ExtractionEngine>,
    search: Arc<dyn SearchProvider>,
    media_root: PathBuf,
    download: DownloadConfig,
    max_search_retries: u32,
    concurrent_limit: Arc<Semaphore>,
    event_tx: Option<broadcast::Sender<Event>>,
}

impl DownloadExecutor {
    /// Create an executor writing under `media_root`
    ///
    /// `media_root` should already be absolute; see
    /// [`prepare_media_root`](crate::utils::prepare_media_root).
    pub fn new(
        engine: Arc<dyn ExtractionEngine>,
        search: Arc<dyn SearchProvider>,
        media_root: PathBuf,
        download: DownloadConfig,
        max_search_retries: u32,
    ) -> Self {
        let concurrent_limit = Arc::new(Semaphore::new(download.max_concurrent_downloads.max(1)));
        Self {
            engine,
            search,
            media_root,
            download,
            max_search_retries,
            concurrent_limit,
            event_tx: None,
        }
    }

    /// Report attempts and fallback searches as [`Event`]s on `event_tx`
    pub fn with_events(mut self, event_tx: broadcast::Sender<Event>) -> Self {
        self.event_tx = Some(event_tx);
        self
    }

    /// Directory downloads are written to
    pub fn media_root(&self) -> &Path {
        &self.media_root
    }

    /// Engine in use
    pub fn engine(&self) -> &Arc<dyn ExtractionEngine> {
        &self.engine
    }

    /// Search provider in use
    pub fn search(&self) -> &Arc<dyn SearchProvider> {
        &self.search
    }

    /// Download `reference`, searching for it if the engine cannot get it directly
    ///
    /// Extraction failures never surface as `Err`: they end in a search fallback,
    /// [`DownloadOutcome::NoMatch`] or [`DownloadOutcome::Exhausted`]. Only
    /// failures unrelated to the reference (engine missing, search transport,
    /// worker panic) are returned as errors.
    pub async fn download(&self, reference: &str) -> Result<DownloadOutcome> {
        self.download_for(reference, None).await
    }

    /// [`download`](Self::download) on behalf of `ticket`, which is attached to
    /// the events emitted along the way
    pub async fn download_for(
        &self,
        reference: &str,
        ticket: Option<&TicketId>,
    ) -> Result<DownloadOutcome> {
        let query = normalize_reference(reference);
        let mut target = query.clone();
        let mut attempted: Vec<String> = Vec::new();
        let mut retries_left = self.max_search_retries;

        loop {
            attempted.push(target.clone());
            self.emit_event(Event::Downloading {
                ticket: ticket.cloned(),
                reference: target.clone(),
            });
            let err = match self.attempt(&target).await {
                Ok(Some(result)) => {
                    tracing::info!(
                        source = %target,
                        path = %result.path.display(),
                        size = %result.size,
                        "Download completed"
                    );
                    return Ok(DownloadOutcome::Completed {
                        result,
                        source: target,
                    });
                }
                Ok(None) => {
                    tracing::warn!(reference = %target, "Engine finished without reporting a file");
                    return Ok(DownloadOutcome::Incomplete { reference: target });
                }
                Err(e) if e.is_extraction_failure() => e,
                Err(e) => return Err(e),
            };

            if retries_left == 0 {
                tracing::warn!(reference = %target, error = %err, "Extraction failed, no search fallback left");
                return Ok(DownloadOutcome::Exhausted {
                    reason: err.to_string(),
                });
            }
            retries_left -= 1;

            tracing::info!(
                reference = %target,
                error = %err,
                provider = self.search.name(),
                "Extraction failed, searching"
            );
            self.emit_event(Event::FallbackSearch {
                ticket: ticket.cloned(),
                query: query.clone(),
                error: err.to_string(),
            });

            let Some(found) = self.search.resolve_best(&query).await? else {
                tracing::info!(query = %query, "No search match, giving up");
                return Ok(DownloadOutcome::NoMatch { query });
            };

            let next = normalize_reference(&found.url);
            if attempted.contains(&next) {
                tracing::warn!(url = %next, "Search returned an already attempted URL");
                return Ok(DownloadOutcome::Exhausted {
                    reason: err.to_string(),
                });
            }

            tracing::debug!(
                url = %next,
                title = ?found.title,
                provider = %found.provider,
                "Retrying with search match"
            );
            target = next;
        }
    }

    fn emit_event(&self, event: Event) {
        if let Some(tx) = &self.event_tx {
            tx.send(event).ok();
        }
    }

    /// One engine run; `Ok(None)` if the engine never reported a finished file
    async fn attempt(&self, reference: &str) -> Result<Option<DownloadResult>> {
        let _permit = self
            .concurrent_limit
            .acquire()
            .await
            .map_err(|_| Error::ShuttingDown)?;

        let harvested: Arc<Mutex<Option<DownloadResult>>> = Arc::new(Mutex::new(None));
        let slot = harvested.clone();
        let options = ProgressHookConfig::new(&self.media_root, &self.download).with_hook(
            move |event| {
                if let Some(result) = DownloadResult::from_finished(event)
                    && let Ok(mut guard) = slot.lock()
                {
                    *guard = Some(result);
                }
            },
        );

        let engine = self.engine.clone();
        let owned_reference = reference.to_string();
        tokio::task::spawn_blocking(move || engine.extract(&owned_reference, &options))
            .await
            .map_err(|e| ExtractionError::WorkerFailed(e.to_string()))??;

        let result = harvested.lock().ok().and_then(|mut guard| guard.take());
        let Some(result) = result else {
            return Ok(None);
        };

        if !tokio::fs::try_exists(&result.path).await? {
            return Err(ExtractionError::MissingOutput { path: result.path }.into());
        }
        Ok(Some(result))
    }
}

impl std::fmt::Debug for DownloadExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DownloadExecutor")
            .field("engine", &self.engine.name())
            .field("search", &self.search.name())
            .field("media_root", &self.media_root)
            .field("max_search_retries", &self.max_search_retries)
            .field("reports_events", &self.event_tx.is_some())
            .finish()
    }
}
