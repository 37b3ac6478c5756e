//! CLI-based extraction engine driving yt-dlp or youtube-dl

use super::parser::{LegacyProgressParser, parse_template_line, progress_template};
use super::traits::{ExtractionEngine, ProgressEvent, ProgressHookConfig};
use crate::config::EngineKind;
use crate::error::{Error, ExtractionError};
use crate::utils::tail_lines;
use std::io::{BufRead, BufReader, Read};
use std::path::PathBuf;
use std::process::{Command, Stdio};

/// Number of stderr lines kept for the failure reason
const STDERR_TAIL_LINES: usize = 5;

/// Extraction engine that runs the `yt-dlp` or `youtube-dl` executable
///
/// Progress events are read from the child's stdout line by line and delivered
/// to the hook as they arrive. A non-zero exit is reported as
/// [`ExtractionError::DownloadFailed`] carrying the tail of stderr.
///
/// # Examples
///
/// ```no_run
/// use ticket_dl::engine::{CliEngine, ExtractionEngine, ProgressHookConfig};
/// use ticket_dl::config::{DownloadConfig, EngineKind};
/// use std::path::Path;
///
/// let engine = CliEngine::from_path(EngineKind::YtDlp).expect("yt-dlp not found in PATH");
/// let options = ProgressHookConfig::new(Path::new("/srv/media"), &DownloadConfig::default())
///     .with_hook(|event| println!("{:?}", event.status));
/// engine.extract("https://youtube.com/watch?v=X", &options)?;
/// # Ok::<(), ticket_dl::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct CliEngine {
    binary_path: PathBuf,
    kind: EngineKind,
}

impl CliEngine {
    /// Create a CLI engine with an explicit binary path
    pub fn new(binary_path: PathBuf, kind: EngineKind) -> Self {
        Self { binary_path, kind }
    }

    /// Attempt to find the engine's executable in PATH
    pub fn from_path(kind: EngineKind) -> Option<Self> {
        which::which(kind.binary_name())
            .ok()
            .map(|path| Self::new(path, kind))
    }

    /// Path of the executable this engine runs
    pub fn binary_path(&self) -> &PathBuf {
        &self.binary_path
    }

    /// Command-line arguments for one download
    pub(crate) fn build_args(&self, reference: &str, options: &ProgressHookConfig) -> Vec<String> {
        let mut args = vec![
            "-f".to_string(),
            options.format.clone(),
            "-o".to_string(),
            options.output_template.to_string_lossy().into_owned(),
            "--newline".to_string(),
        ];
        if options.no_playlist {
            args.push("--no-playlist".to_string());
        }
        if options.no_warnings {
            args.push("--no-warnings".to_string());
        }
        match self.kind {
            EngineKind::YtDlp => {
                // --progress keeps the template lines coming under --quiet
                if options.quiet {
                    args.push("--quiet".to_string());
                }
                args.push("--progress".to_string());
                args.push("--progress-template".to_string());
                args.push(progress_template());
            }
            EngineKind::YoutubeDl => {
                // Progress is scraped from regular output, so it cannot be quiet
            }
        }
        args.push("--".to_string());
        args.push(reference.to_string());
        args
    }

    fn parse_output_line(
        &self,
        line: &str,
        legacy: &mut LegacyProgressParser,
    ) -> Option<ProgressEvent> {
        match self.kind {
            EngineKind::YtDlp => parse_template_line(line),
            EngineKind::YoutubeDl => legacy.parse_line(line),
        }
    }
}

impl ExtractionEngine for CliEngine {
    fn extract(&self, reference: &str, options: &ProgressHookConfig) -> crate::Result<()> {
        let args = self.build_args(reference, options);
        tracing::debug!(
            engine = self.name(),
            binary = %self.binary_path.display(),
            reference,
            "Starting extraction"
        );

        let mut child = Command::new(&self.binary_path)
            .args(&args)
            .env("PYTHONIOENCODING", "UTF-8")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                Error::ExternalTool(format!(
                    "Failed to execute {}: {}",
                    self.binary_path.display(),
                    e
                ))
            })?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| Error::ExternalTool("Failed to capture engine stdout".into()))?;
        let mut stderr = child
            .stderr
            .take()
            .ok_or_else(|| Error::ExternalTool("Failed to capture engine stderr".into()))?;

        // Drain stderr on its own thread so a chatty engine cannot fill the pipe
        let stderr_reader = std::thread::spawn(move || {
            let mut buf = Vec::new();
            let _ = stderr.read_to_end(&mut buf);
            String::from_utf8_lossy(&buf).into_owned()
        });

        let mut legacy = LegacyProgressParser::new();
        let mut reader = BufReader::new(stdout);
        let mut buf = Vec::new();
        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf) {
                Ok(0) => break,
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to read engine output");
                    break;
                }
            }
            // Titles are not guaranteed to be valid UTF-8
            let line = String::from_utf8_lossy(&buf);
            let line = line.trim_end_matches(['\n', '\r']);
            if let Some(event) = self.parse_output_line(line, &mut legacy) {
                options.emit(&event);
            }
        }

        let status = child.wait().map_err(|e| {
            Error::ExternalTool(format!("Failed to wait for {}: {}", self.name(), e))
        })?;
        let stderr = stderr_reader.join().unwrap_or_default();

        if status.success() {
            return Ok(());
        }

        let mut reason = tail_lines(&stderr, STDERR_TAIL_LINES);
        if reason.is_empty() {
            reason = format!("{} exited with {}", self.name(), status);
        }
        Err(Error::Extraction(ExtractionError::DownloadFailed {
            reference: reference.to_string(),
            reason,
        }))
    }

    fn kind(&self) -> EngineKind {
        self.kind
    }

    fn name(&self) -> &'static str {
        match self.kind {
            EngineKind::YtDlp => "cli-yt-dlp",
            EngineKind::YoutubeDl => "cli-youtube-dl",
        }
    }
}
