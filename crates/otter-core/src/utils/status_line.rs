//! Status line cleaning.
//!
//! Engine output lines look like `[download] Destination: clip.mp4` - a
//! bracketed component tag followed by the useful part. For display we
//! strip the tag, bound the length, and substitute a placeholder when
//! nothing readable is left.

/// Maximum characters of a cleaned status line.
pub const STATUS_TEXT_MAX: usize = 40;

/// Shown when a status line cleans down to nothing.
pub const STATUS_PLACEHOLDER: &str = "Processing...";

/// Clean a raw engine output line for display.
#[must_use]
pub fn clean_status_line(line: Option<&str>) -> String {
    let stripped = strip_bracket_tag(line.unwrap_or_default());
    let bounded: String = stripped.chars().take(STATUS_TEXT_MAX).collect();
    let cleaned = bounded.trim();
    if cleaned.is_empty() {
        STATUS_PLACEHOLDER.to_string()
    } else {
        cleaned.to_string()
    }
}

/// Drop one leading `[tag]` prefix, if present.
fn strip_bracket_tag(line: &str) -> &str {
    let trimmed = line.trim_start();
    if let Some(rest) = trimmed.strip_prefix('[') {
        if let Some(end) = rest.find(']') {
            return rest[end + 1..].trim_start();
        }
    }
    trimmed
}
