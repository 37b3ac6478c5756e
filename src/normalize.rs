//! Reference normalization

/// Query fragment that marks a playlist continuation
const PLAYLIST_MARKER: &str = "&list=";

/// Strip playlist continuation from a reference so the engine targets one item.
///
/// When the reference carries `&list=`, everything from the first `&` onward is
/// dropped. Any other reference, including free text, is returned unchanged.
///
/// ```
/// use ticket_dl::normalize_reference;
///
/// assert_eq!(
///     normalize_reference("https://youtube.com/watch?v=X&list=PL123"),
///     "https://youtube.com/watch?v=X"
/// );
/// assert_eq!(normalize_reference("lofi beats"), "lofi beats");
/// ```
pub fn normalize_reference(reference: &str) -> String {
    if reference.contains(PLAYLIST_MARKER) {
        // split() always yields at least one segment
        reference.split('&').next().unwrap_or(reference).to_string()
    } else {
        reference.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_playlist_marker_is_stripped() {
        assert_eq!(
            normalize_reference("https://youtube.com/watch?v=X&list=PL123"),
            "https://youtube.com/watch?v=X"
        );
        assert_eq!(
            normalize_reference("https://youtube.com/watch?v=X&list=PL123&index=4"),
            "https://youtube.com/watch?v=X"
        );
    }

    #[test]
    fn test_everything_after_first_separator_goes() {
        // The cut happens at the first '&', not at the marker itself
        assert_eq!(
            normalize_reference("https://youtube.com/watch?v=X&t=42&list=PL123"),
            "https://youtube.com/watch?v=X"
        );
    }

    #[test]
    fn test_references_without_marker_are_unchanged() {
        for reference in [
            "https://youtube.com/watch?v=X",
            "https://youtube.com/watch?v=X&t=42",
            "https://youtube.com/playlist?list=PL123",
            "lofi beats",
            "",
        ] {
            assert_eq!(normalize_reference(reference), reference);
        }
    }

    #[test]
    fn test_normalization_is_idempotent() {
        let once = normalize_reference("https://youtube.com/watch?v=X&list=PL123");
        assert_eq!(normalize_reference(&once), once);
    }
}
