//! Configuration types for ticket-dl

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::{path::PathBuf, time::Duration};
use url::Url;

/// How long a downloaded file is kept before it is deleted
pub const DEFAULT_RETENTION: Duration = Duration::from_secs(300);

/// Download behavior configuration (media root, engine options, concurrency)
///
/// These are the fixed options handed to the extraction engine on every attempt.
/// Used as a flattened sub-config within [`Config`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DownloadConfig {
    /// Directory downloaded files are written to (default: "./media")
    #[serde(default = "default_media_root")]
    pub media_root: PathBuf,

    /// Output filename template, relative to `media_root`
    /// (default: "%(title)s.%(epoch)s.%(ext)s")
    ///
    /// The epoch token keeps concurrent downloads of the same title apart.
    #[serde(default = "default_output_template")]
    pub output_template: String,

    /// Format selector passed to the engine (default: "bestaudio[ext=m4a]")
    #[serde(default = "default_audio_format")]
    pub audio_format: String,

    /// Only fetch the referenced item, never the surrounding playlist (default: true)
    #[serde(default = "default_true")]
    pub no_playlist: bool,

    /// Suppress engine chatter (default: true)
    #[serde(default = "default_true")]
    pub quiet: bool,

    /// Suppress engine warnings (default: true)
    #[serde(default = "default_true")]
    pub no_warnings: bool,

    /// Maximum concurrent engine runs (default: 3)
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent_downloads: usize,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            media_root: default_media_root(),
            output_template: default_output_template(),
            audio_format: default_audio_format(),
            no_playlist: true,
            quiet: true,
            no_warnings: true,
            max_concurrent_downloads: default_max_concurrent(),
        }
    }
}

/// Which extraction engine drives downloads
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EngineKind {
    /// `yt-dlp`, reports progress through a machine-readable template
    #[default]
    YtDlp,
    /// Legacy `youtube-dl`, progress is scraped from its console output
    YoutubeDl,
}

impl EngineKind {
    /// Executable name searched for in PATH
    pub fn binary_name(&self) -> &'static str {
        match self {
            EngineKind::YtDlp => "yt-dlp",
            EngineKind::YoutubeDl => "youtube-dl",
        }
    }
}

/// Extraction engine selection and binary discovery
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Engine flavor (default: yt-dlp)
    #[serde(default)]
    pub kind: EngineKind,

    /// Path to the engine executable (auto-detected if None)
    #[serde(default)]
    pub binary_path: Option<PathBuf>,

    /// Whether to search PATH for the engine if no explicit path is set (default: true)
    #[serde(default = "default_true")]
    pub search_path: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            kind: EngineKind::default(),
            binary_path: None,
            search_path: true,
        }
    }
}

/// Search provider configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Base URL of an Invidious instance. When set, searches go through its
    /// HTTP API instead of the engine executable.
    #[serde(default)]
    pub invidious_url: Option<Url>,

    /// Request timeout for HTTP searches (default: 15 seconds)
    #[serde(default = "default_search_timeout", with = "duration_serde")]
    pub timeout: Duration,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            invidious_url: None,
            timeout: default_search_timeout(),
        }
    }
}

/// Search-and-retry behavior when direct extraction fails
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FallbackConfig {
    /// Maximum number of search fallbacks per request (default: 1)
    ///
    /// Zero disables the fallback: a failed extraction ends the request.
    #[serde(default = "default_max_search_retries")]
    pub max_search_retries: u32,
}

impl Default for FallbackConfig {
    fn default() -> Self {
        Self {
            max_search_retries: default_max_search_retries(),
        }
    }
}

/// What happens to pending expirations when the downloader shuts down
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpirationShutdown {
    /// Delete every pending file immediately
    #[default]
    ExpireNow,
    /// Drop the timers and leave the files on disk
    Cancel,
}

/// File expiration configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ExpirationConfig {
    /// Delay between ticket persistence and file deletion (default: 300 seconds)
    #[serde(default = "default_retention", with = "duration_serde")]
    pub retention: Duration,

    /// Policy for pending expirations on shutdown
    #[serde(default)]
    pub on_shutdown: ExpirationShutdown,
}

impl Default for ExpirationConfig {
    fn default() -> Self {
        Self {
            retention: DEFAULT_RETENTION,
            on_shutdown: ExpirationShutdown::default(),
        }
    }
}

/// Ticket store persistence
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PersistenceConfig {
    /// Database path (default: "./ticket-dl.db")
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,

    /// Lifetime of a ticket record in the store (None = kept until purged)
    #[serde(default, with = "optional_duration_serde")]
    pub ticket_ttl: Option<Duration>,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            ticket_ttl: None,
        }
    }
}

/// Ticket record behavior
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TicketConfig {
    /// Write `pending` and `failed` records in addition to `ready` ones (default: true)
    ///
    /// When false, only successful downloads produce a ticket and callers see
    /// absence for both "still running" and "gave up".
    #[serde(default = "default_true")]
    pub record_status: bool,
}

impl Default for TicketConfig {
    fn default() -> Self {
        Self {
            record_status: true,
        }
    }
}

/// Main configuration for [`TicketDownloader`](crate::TicketDownloader)
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Config {
    /// Download behavior (media root, engine options, concurrency)
    #[serde(flatten)]
    pub download: DownloadConfig,

    /// Extraction engine selection
    #[serde(default)]
    pub engine: EngineConfig,

    /// Search provider selection
    #[serde(default)]
    pub search: SearchConfig,

    /// Search fallback limits
    #[serde(default)]
    pub fallback: FallbackConfig,

    /// File expiration
    #[serde(default)]
    pub expiration: ExpirationConfig,

    /// Ticket store persistence
    #[serde(default)]
    pub persistence: PersistenceConfig,

    /// Ticket record behavior
    #[serde(default)]
    pub tickets: TicketConfig,
}

impl Config {
    /// Media root directory
    pub fn media_root(&self) -> &PathBuf {
        &self.download.media_root
    }

    /// Check settings that would make every download fail
    pub fn validate(&self) -> Result<()> {
        if self.download.output_template.trim().is_empty() {
            return Err(Error::Config {
                message: "output_template must not be empty".into(),
                key: Some("output_template".into()),
            });
        }
        if !self.download.output_template.contains("%(ext)s") {
            return Err(Error::Config {
                message: "output_template must contain %(ext)s".into(),
                key: Some("output_template".into()),
            });
        }
        if self.download.audio_format.trim().is_empty() {
            return Err(Error::Config {
                message: "audio_format must not be empty".into(),
                key: Some("audio_format".into()),
            });
        }
        if self.download.max_concurrent_downloads == 0 {
            return Err(Error::Config {
                message: "max_concurrent_downloads must be at least 1".into(),
                key: Some("max_concurrent_downloads".into()),
            });
        }
        Ok(())
    }
}

// Default value functions
fn default_media_root() -> PathBuf {
    PathBuf::from("media")
}

fn default_output_template() -> String {
    "%(title)s.%(epoch)s.%(ext)s".to_string()
}

fn default_audio_format() -> String {
    "bestaudio[ext=m4a]".to_string()
}

fn default_max_concurrent() -> usize {
    3
}

fn default_database_path() -> PathBuf {
    PathBuf::from("ticket-dl.db")
}

fn default_true() -> bool {
    true
}

fn default_search_timeout() -> Duration {
    Duration::from_secs(15)
}

fn default_max_search_retries() -> u32 {
    1
}

fn default_retention() -> Duration {
    DEFAULT_RETENTION
}

// Duration serialization helper (as whole seconds)
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

// Optional Duration serialization helper
mod optional_duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match duration {
            Some(d) => serializer.serialize_some(&d.as_secs()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = Option::<u64>::deserialize(deserializer)?;
        Ok(secs.map(Duration::from_secs))
    }
}
