//! Utility functions for sizes and path handling

use crate::error::{Error, Result};
use std::path::{Path, PathBuf};

const SIZE_UNITS: [&str; 6] = ["B", "KiB", "MiB", "GiB", "TiB", "PiB"];

/// Format a byte count the way the extraction engines print sizes
///
/// # Examples
///
/// ```
/// use ticket_dl::utils::format_size;
///
/// assert_eq!(format_size(0), "0.00B");
/// assert_eq!(format_size(3_617_587), "3.45MiB");
/// ```
pub fn format_size(bytes: u64) -> String {
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < SIZE_UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{:.2}{}", value, SIZE_UNITS[unit])
}

/// Create `dir` if needed and return its absolute form
///
/// Downloads are published by absolute path, so the media root is resolved
/// once up front instead of trusting the process working directory later.
pub async fn prepare_media_root(dir: &Path) -> Result<PathBuf> {
    tokio::fs::create_dir_all(dir).await.map_err(|e| {
        Error::Io(std::io::Error::new(
            e.kind(),
            format!("Failed to create media root '{}': {}", dir.display(), e),
        ))
    })?;
    std::path::absolute(dir).map_err(|e| Error::Config {
        message: format!("cannot resolve media root '{}': {}", dir.display(), e),
        key: Some("media_root".into()),
    })
}

/// Keep only the last `max` non-empty lines of engine output
pub(crate) fn tail_lines(output: &str, max: usize) -> String {
    let lines: Vec<&str> = output
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();
    let start = lines.len().saturating_sub(max);
    lines[start..].join("\n")
}
