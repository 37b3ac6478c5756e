//! Parsers for extraction engine console output
//!
//! `yt-dlp` is told to print one machine-readable line per progress event (see
//! [`progress_template`]). `youtube-dl` has no template support, so its regular
//! `[download]` lines are scraped instead.

use super::traits::{ProgressEvent, ProgressStatus};
use regex::Regex;
use std::path::PathBuf;
use std::sync::OnceLock;

/// Prefix marking template lines on stdout
pub(crate) const PROGRESS_PREFIX: &str = "ticketdl-progress|";

/// `--progress-template` argument for yt-dlp.
///
/// The filename goes last because it is the only field that may contain `|`.
pub(crate) fn progress_template() -> String {
    format!(
        "download:{PROGRESS_PREFIX}%(progress.status)s|%(progress._percent_str)s|%(progress._total_bytes_str)s|%(progress.filename)s"
    )
}

/// Placeholders the engines print for unknown values
fn known(value: &str) -> Option<String> {
    let value = value.trim();
    match value {
        "" | "NA" | "N/A" | "None" | "Unknown" => None,
        v => Some(v.to_string()),
    }
}

/// Parse one yt-dlp template line; `None` for any other output
pub fn parse_template_line(line: &str) -> Option<ProgressEvent> {
    let rest = line.trim_end_matches(['\r', '\n']).strip_prefix(PROGRESS_PREFIX)?;
    let mut fields = rest.splitn(4, '|');
    let status = ProgressStatus::parse(fields.next()?);
    let percent_str = fields.next().and_then(known);
    let total_bytes_str = fields.next().and_then(known);
    let filename = fields.next().and_then(known).map(PathBuf::from);

    Some(ProgressEvent {
        status,
        filename,
        total_bytes_str,
        percent_str,
    })
}

#[allow(clippy::expect_used)]
fn destination_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\[download\] Destination: (.+)$").expect("compile destination regex"))
}

#[allow(clippy::expect_used)]
fn percent_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\[download\]\s+(\d+(?:\.\d+)?)% of ~?\s*(\S+)").expect("compile percent regex")
    })
}

#[allow(clippy::expect_used)]
fn already_downloaded_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\[download\] (.+) has already been downloaded").expect("compile already-downloaded regex")
    })
}

/// Stateful scraper for youtube-dl console output
///
/// Remembers the current destination so the final `100% of` line can be
/// reported as a `finished` event for that file, once.
#[derive(Debug, Default)]
pub struct LegacyProgressParser {
    destination: Option<PathBuf>,
    finished: bool,
}

impl LegacyProgressParser {
    /// Create a parser with no destination seen yet
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one line of output
    pub fn parse_line(&mut self, line: &str) -> Option<ProgressEvent> {
        let line = line.trim_end_matches(['\r', '\n']);

        if let Some(caps) = destination_re().captures(line) {
            let path = PathBuf::from(caps[1].trim());
            self.destination = Some(path.clone());
            self.finished = false;
            return Some(ProgressEvent {
                status: ProgressStatus::Downloading,
                filename: Some(path),
                total_bytes_str: None,
                percent_str: Some("0.0%".into()),
            });
        }

        if let Some(caps) = already_downloaded_re().captures(line) {
            let path = PathBuf::from(caps[1].trim());
            self.destination = Some(path.clone());
            self.finished = true;
            return Some(ProgressEvent {
                status: ProgressStatus::Finished,
                filename: Some(path),
                total_bytes_str: None,
                percent_str: Some("100%".into()),
            });
        }

        if let Some(caps) = percent_re().captures(line) {
            let percent: f64 = caps[1].parse().ok()?;
            let total = known(&caps[2]);
            let percent_str = Some(format!("{}%", &caps[1]));

            if percent >= 100.0 {
                if self.finished {
                    return None;
                }
                self.finished = true;
                return Some(ProgressEvent {
                    status: ProgressStatus::Finished,
                    filename: self.destination.clone(),
                    total_bytes_str: total,
                    percent_str,
                });
            }
            return Some(ProgressEvent {
                status: ProgressStatus::Downloading,
                filename: self.destination.clone(),
                total_bytes_str: total,
                percent_str,
            });
        }

        None
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_contains_prefix_and_fields() {
        let template = progress_template();
        assert!(template.starts_with("download:ticketdl-progress|"));
        assert!(template.contains("%(progress.status)s"));
        assert!(template.ends_with("%(progress.filename)s"));
    }

    #[test]
    fn test_parse_finished_template_line() {
        let event = parse_template_line(
            "ticketdl-progress|finished|100.0%|3.45MiB|/srv/media/lofi_beats.169999.m4a\n",
        )
        .unwrap();
        assert_eq!(event.status, ProgressStatus::Finished);
        assert_eq!(event.percent_str.as_deref(), Some("100.0%"));
        assert_eq!(event.total_bytes_str.as_deref(), Some("3.45MiB"));
        assert_eq!(
            event.filename,
            Some(PathBuf::from("/srv/media/lofi_beats.169999.m4a"))
        );
    }

    #[test]
    fn test_parse_template_line_keeps_pipes_in_filename() {
        let event =
            parse_template_line("ticketdl-progress|downloading| 12.5%|NA|/m/a|b.1.m4a").unwrap();
        assert_eq!(event.status, ProgressStatus::Downloading);
        assert_eq!(event.total_bytes_str, None);
        assert_eq!(event.filename, Some(PathBuf::from("/m/a|b.1.m4a")));
    }

    #[test]
    fn test_non_template_lines_are_ignored() {
        assert!(parse_template_line("[youtube] X: Downloading webpage").is_none());
        assert!(parse_template_line("").is_none());
    }

    #[test]
    fn test_legacy_download_sequence() {
        let mut parser = LegacyProgressParser::new();
        let lines = [
            "[youtube] X: Downloading webpage",
            "[download] Destination: /srv/media/Song.1699.m4a",
            "[download]   0.0% of 3.45MiB at 12.30KiB/s ETA 04:38",
            "[download]  51.2% of 3.45MiB at  1.20MiB/s ETA 00:01",
            "[download] 100% of 3.45MiB at  1.40MiB/s ETA 00:00",
            "[download] 100% of 3.45MiB in 00:02",
        ];
        let events: Vec<ProgressEvent> = lines.iter().filter_map(|l| parser.parse_line(l)).collect();

        assert_eq!(events.len(), 4);
        assert_eq!(events[0].status, ProgressStatus::Downloading);
        assert_eq!(events[2].percent_str.as_deref(), Some("51.2%"));

        let finished: Vec<_> = events
            .iter()
            .filter(|e| e.status == ProgressStatus::Finished)
            .collect();
        assert_eq!(finished.len(), 1, "only one finished event per file");
        assert_eq!(
            finished[0].filename,
            Some(PathBuf::from("/srv/media/Song.1699.m4a"))
        );
        assert_eq!(finished[0].total_bytes_str.as_deref(), Some("3.45MiB"));
    }

    #[test]
    fn test_legacy_already_downloaded() {
        let mut parser = LegacyProgressParser::new();
        let event = parser
            .parse_line("[download] /srv/media/Song.1699.m4a has already been downloaded")
            .unwrap();
        assert_eq!(event.status, ProgressStatus::Finished);
        assert_eq!(event.total_bytes_str, None);
        assert_eq!(
            event.filename,
            Some(PathBuf::from("/srv/media/Song.1699.m4a"))
        );
        // A trailing 100% line must not produce a second finished event
        assert!(parser.parse_line("[download] 100% of 3.45MiB").is_none());
    }

    #[test]
    fn test_legacy_estimated_size() {
        let mut parser = LegacyProgressParser::new();
        parser.parse_line("[download] Destination: /m/a.m4a");
        let event = parser.parse_line("[download] 100% of ~4.10MiB in 00:03").unwrap();
        assert_eq!(event.status, ProgressStatus::Finished);
        assert_eq!(event.total_bytes_str.as_deref(), Some("4.10MiB"));
    }
}
