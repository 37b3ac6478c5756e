//! Core types for ticket-dl

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::engine::{ProgressEvent, ProgressStatus};
use crate::utils::format_size;

/// Caller-chosen identifier a download result is published under
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TicketId(pub String);

impl TicketId {
    /// Create a new TicketId
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the inner string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for TicketId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for TicketId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for TicketId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Terminal state of one successful download attempt
///
/// Only constructed from a `finished` progress event, so every field is
/// populated by the time a value exists.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadResult {
    /// Display filename (basename only)
    pub name: String,
    /// Human-readable size as reported by the engine (e.g. "3.45MiB")
    pub size: String,
    /// Absolute path of the downloaded file
    pub path: PathBuf,
}

impl DownloadResult {
    /// Harvest a result from a progress event.
    ///
    /// Returns `None` for anything but a `finished` event carrying a filename.
    /// When the engine did not report a size (e.g. the file was already on disk)
    /// the size is read from the file itself.
    pub fn from_finished(event: &ProgressEvent) -> Option<Self> {
        if event.status != ProgressStatus::Finished {
            return None;
        }
        let path = event.filename.as_ref()?;
        let name = path.file_name()?.to_string_lossy().into_owned();
        if name.is_empty() {
            return None;
        }
        let size = match event.total_bytes_str.as_deref().map(str::trim) {
            Some(s) if !s.is_empty() && s != "NA" => s.to_string(),
            _ => std::fs::metadata(path).ok().map(|m| format_size(m.len()))?,
        };
        Some(Self {
            name,
            size,
            path: path.clone(),
        })
    }
}

/// Best match returned by a search provider
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchMatch {
    /// Canonical playable URL; the only field the download path consumes
    pub url: String,
    /// Provider-side video id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Title as reported by the provider
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Name of the provider that produced the match
    pub provider: String,
}

/// Lifecycle state of a ticket
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TicketStatus {
    /// Submitted, download still running
    Pending,
    /// File downloaded, `path` and `name` are set
    Ready,
    /// Download gave up; the ticket will never become ready
    Failed,
}

impl std::fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            TicketStatus::Pending => "pending",
            TicketStatus::Ready => "ready",
            TicketStatus::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Value stored under a ticket id
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketRecord {
    /// Lifecycle state
    pub status: TicketStatus,
    /// Absolute path of the downloaded file (ready only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    /// Display filename (ready only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Human-readable size (ready only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    /// Why the download gave up (failed only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// When this record was written
    pub updated_at: DateTime<Utc>,
}

impl TicketRecord {
    /// Record for a submitted download
    pub fn pending() -> Self {
        Self {
            status: TicketStatus::Pending,
            path: None,
            name: None,
            size: None,
            error: None,
            updated_at: Utc::now(),
        }
    }

    /// Record for a completed download
    pub fn ready(result: &DownloadResult) -> Self {
        Self {
            status: TicketStatus::Ready,
            path: Some(result.path.clone()),
            name: Some(result.name.clone()),
            size: Some(result.size.clone()),
            error: None,
            updated_at: Utc::now(),
        }
    }

    /// Record for a download that gave up
    pub fn failed(reason: impl Into<String>) -> Self {
        Self {
            status: TicketStatus::Failed,
            path: None,
            name: None,
            size: None,
            error: Some(reason.into()),
            updated_at: Utc::now(),
        }
    }
}

/// How one call to the download executor ended
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DownloadOutcome {
    /// The engine finished and reported the file
    Completed {
        /// Harvested result
        result: DownloadResult,
        /// Reference the successful attempt ran against
        source: String,
    },
    /// Extraction failed and the search provider had nothing to offer
    NoMatch {
        /// Query that returned no match
        query: String,
    },
    /// Extraction failed and the fallback budget is used up
    Exhausted {
        /// Last extraction error
        reason: String,
    },
    /// The engine exited cleanly without ever reporting a finished file
    Incomplete {
        /// Reference the attempt ran against
        reference: String,
    },
}

impl DownloadOutcome {
    /// The result, if the download completed
    pub fn result(&self) -> Option<&DownloadResult> {
        match self {
            DownloadOutcome::Completed { result, .. } => Some(result),
            _ => None,
        }
    }

    /// Human-readable reason for a non-completed outcome
    pub fn failure_reason(&self) -> Option<String> {
        match self {
            DownloadOutcome::Completed { .. } => None,
            DownloadOutcome::NoMatch { query } => Some(format!("no search match for {query:?}")),
            DownloadOutcome::Exhausted { reason } => Some(reason.clone()),
            DownloadOutcome::Incomplete { reference } => Some(format!(
                "engine finished {reference:?} without reporting a file"
            )),
        }
    }
}

/// Event emitted during the download lifecycle
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// A reference was accepted for download
    Submitted {
        /// Ticket id
        ticket: TicketId,
        /// Reference as supplied by the caller
        reference: String,
    },

    /// An engine attempt started
    Downloading {
        /// Ticket id, when the attempt runs on behalf of a ticket
        #[serde(default, skip_serializing_if = "Option::is_none")]
        ticket: Option<TicketId>,
        /// Reference handed to the engine
        reference: String,
    },

    /// Extraction failed and the search provider is being asked for a match
    FallbackSearch {
        /// Ticket id, when the attempt runs on behalf of a ticket
        #[serde(default, skip_serializing_if = "Option::is_none")]
        ticket: Option<TicketId>,
        /// Search query
        query: String,
        /// Extraction error that triggered the search
        error: String,
    },

    /// The engine finished writing the file
    Downloaded {
        /// Ticket id
        ticket: TicketId,
        /// Reference the successful attempt ran against
        source: String,
        /// Downloaded file
        result: DownloadResult,
    },

    /// A ticket record was written to the store
    TicketWritten {
        /// Ticket id
        ticket: TicketId,
        /// Status that was written
        status: TicketStatus,
    },

    /// The download gave up or errored
    Failed {
        /// Ticket id
        ticket: TicketId,
        /// Error message
        error: String,
    },

    /// A downloaded file was removed by the expiration scheduler
    Expired {
        /// Deleted path
        path: PathBuf,
    },

    /// Downloader is shutting down
    Shutdown,
}
