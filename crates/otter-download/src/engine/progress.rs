//! yt-dlp progress line parsing.

use std::sync::LazyLock;

use regex::Regex;

/// Matches progress lines like:
/// `[download]   6.2% of ~ 343.72MiB at  420.30KiB/s ETA 12:32 (frag 29/454)`
static PROGRESS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[download\]\s+(\d+\.?\d*)%(?:.*?\bETA\s+(\S+))?").unwrap()
});

/// Percent and ETA extracted from one progress line.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct ProgressLine {
    pub percent: f32,
    pub eta_seconds: u64,
}

/// Parse a progress line; `None` for lines that carry no percentage.
pub(crate) fn parse_progress_line(line: &str) -> Option<ProgressLine> {
    let caps = PROGRESS_RE.captures(line)?;
    let percent: f32 = caps.get(1)?.as_str().parse().ok()?;
    let eta_seconds = caps.get(2).map_or(0, |m| parse_eta(m.as_str()));
    Some(ProgressLine {
        percent,
        eta_seconds,
    })
}

/// Parse yt-dlp's `HH:MM:SS` / `MM:SS` ETA field. Unknown forms map to 0.
fn parse_eta(field: &str) -> u64 {
    let mut seconds = 0u64;
    for part in field.split(':') {
        let Ok(value) = part.parse::<u64>() else {
            return 0;
        };
        seconds = seconds * 60 + value;
    }
    seconds
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_fragmented_progress_line() {
        let line = "[download]   6.2% of ~ 343.72MiB at  420.30KiB/s ETA 12:32 (frag 29/454)";
        let parsed = parse_progress_line(line).unwrap();
        assert!((parsed.percent - 6.2).abs() < 0.001);
        assert_eq!(parsed.eta_seconds, 12 * 60 + 32);
    }

    #[test]
    fn parses_line_without_eta() {
        let line = "[download] 100% of 10.00MiB in 00:05";
        let parsed = parse_progress_line(line).unwrap();
        assert!((parsed.percent - 100.0).abs() < f32::EPSILON);
        assert_eq!(parsed.eta_seconds, 0);
    }

    #[test]
    fn non_progress_lines_yield_none() {
        assert!(parse_progress_line("[download] Destination: clip.mp4").is_none());
        assert!(parse_progress_line("[Merger] Merging formats into clip.mp4").is_none());
        assert!(parse_progress_line("").is_none());
    }

    #[test]
    fn eta_field_forms() {
        assert_eq!(parse_eta("00:05"), 5);
        assert_eq!(parse_eta("12:32"), 752);
        assert_eq!(parse_eta("1:02:03"), 3723);
        assert_eq!(parse_eta("Unknown"), 0);
    }
}
