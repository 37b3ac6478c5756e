//! Error types for ticket-dl
//!
//! This module provides the error handling for the library:
//! - A top-level [`Error`] with one variant per failure domain
//! - [`ExtractionError`] for failures reported by the extraction engine
//! - [`DatabaseError`] for the SQLite ticket store
//!
//! Only [`Error::Extraction`] is recovered locally (by the search fallback).
//! Everything else propagates to the caller of the workflow.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for ticket-dl operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for ticket-dl
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "media_root")
        key: Option<String>,
    },

    /// Ticket store operation failed
    #[error("database error: {0}")]
    Database(#[from] DatabaseError),

    /// SQLx database error
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    /// The extraction engine could not resolve or download a reference
    #[error("extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    /// The search provider failed (transport or malformed response)
    #[error("search error: {0}")]
    Search(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Network error
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// External tool execution failed (yt-dlp, youtube-dl)
    #[error("external tool error: {0}")]
    ExternalTool(String),

    /// Operation not supported (missing binary, not implemented, etc.)
    #[error("not supported: {0}")]
    NotSupported(String),

    /// Shutdown in progress - not accepting new downloads
    #[error("shutdown in progress: not accepting new downloads")]
    ShuttingDown,
}

impl Error {
    /// Whether this error means "the engine could not get this reference",
    /// which is the only failure that triggers a search fallback.
    pub fn is_extraction_failure(&self) -> bool {
        matches!(self, Error::Extraction(ExtractionError::DownloadFailed { .. }))
    }
}

/// Database-related errors
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// Failed to connect to database
    #[error("failed to connect to database: {0}")]
    ConnectionFailed(String),

    /// Failed to run migrations
    #[error("failed to run migrations: {0}")]
    MigrationFailed(String),

    /// Query failed
    #[error("query failed: {0}")]
    QueryFailed(String),
}

/// Errors reported by an extraction engine run
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// The engine ran but could not resolve or download the reference
    #[error("could not download {reference}: {reason}")]
    DownloadFailed {
        /// The reference handed to the engine
        reference: String,
        /// Last error line reported by the engine
        reason: String,
    },

    /// The engine reported success but the output file is missing
    #[error("engine reported {path} but the file does not exist")]
    MissingOutput {
        /// Path reported by the engine
        path: PathBuf,
    },

    /// The blocking worker running the engine panicked or was cancelled
    #[error("engine worker failed: {0}")]
    WorkerFailed(String),
}
