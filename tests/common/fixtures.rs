//! Fake engine executables and other test fixtures

use std::path::{Path, PathBuf};

/// URL the fake engine can download
pub const KNOWN_VIDEO: &str = "https://youtube.com/watch?v=Y";

/// File the fake engine writes for [`KNOWN_VIDEO`]
pub const KNOWN_FILE: &str = "lofi_beats.169999.m4a";

/// Fake `yt-dlp`
///
/// - `--dump-json ... ytsearch1:<q>`: prints one entry for [`KNOWN_VIDEO`] when
///   `<q>` mentions "lofi", nothing otherwise
/// - download of [`KNOWN_VIDEO`]: writes [`KNOWN_FILE`] under the `-o` template
///   directory and prints template progress lines
/// - anything else: error on stderr, exit 1
pub const FAKE_YT_DLP: &str = r#"#!/bin/sh
out=""
prev=""
last=""
search=0
for arg in "$@"; do
  if [ "$prev" = "-o" ]; then out="$arg"; fi
  if [ "$arg" = "--dump-json" ]; then search=1; fi
  prev="$arg"
  last="$arg"
done

if [ "$search" = 1 ]; then
  case "$last" in
    *lofi*) echo '{"id":"Y","title":"lofi beats","webpage_url":"https://youtube.com/watch?v=Y"}' ;;
  esac
  exit 0
fi

if [ "$last" = "https://youtube.com/watch?v=Y" ]; then
  dest=$(printf '%s' "$out" | sed -e 's/%(title)s/lofi_beats/' -e 's/%(epoch)s/169999/' -e 's/%(ext)s/m4a/')
  printf 'audio' > "$dest"
  echo "ticketdl-progress|downloading| 50.0%|3.45MiB|$dest"
  echo "ticketdl-progress|finished|100.0%|3.45MiB|$dest"
  exit 0
fi

echo "ERROR: [generic] '$last' is not a valid URL" >&2
exit 1
"#;

/// Fake `youtube-dl` speaking the legacy console dialect
pub const FAKE_YOUTUBE_DL: &str = r#"#!/bin/sh
out=""
prev=""
last=""
search=0
for arg in "$@"; do
  if [ "$prev" = "-o" ]; then out="$arg"; fi
  if [ "$arg" = "--dump-json" ]; then search=1; fi
  prev="$arg"
  last="$arg"
done

if [ "$search" = 1 ]; then
  case "$last" in
    *lofi*) echo '{"id":"Y","title":"lofi beats","url":"Y"}' ;;
  esac
  exit 0
fi

if [ "$last" = "https://www.youtube.com/watch?v=Y" ]; then
  dest=$(printf '%s' "$out" | sed -e 's/%(title)s/lofi_beats/' -e 's/%(epoch)s/169999/' -e 's/%(ext)s/m4a/')
  echo "[youtube] Y: Downloading webpage"
  echo "[download] Destination: $dest"
  echo "[download]  50.0% of 3.45MiB at 1.00MiB/s ETA 00:01"
  printf 'audio' > "$dest"
  echo "[download] 100% of 3.45MiB in 00:02"
  exit 0
fi

echo "ERROR: '$last' is not a valid URL. Set --default-search \"ytsearch\" (or run  youtube-dl \"ytsearch:$last\" ) to search YouTube" >&2
exit 1
"#;

/// Write an executable script into `dir` and return its path
#[cfg(unix)]
pub fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    use std::io::Write;
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join(name);
    {
        let mut file = std::fs::File::create(&path).expect("create script");
        file.write_all(body.as_bytes()).expect("write script");
        file.sync_all().expect("sync script");
    }
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))
        .expect("chmod script");
    path
}
