//! Output filename construction

use chrono::{DateTime, Utc};

/// Extension of every recording
pub const OUTPUT_EXTENSION: &str = "mp3";

/// Sanitize a title for use in filenames.
///
/// Keeps word characters, whitespace and hyphens, collapses runs of
/// whitespace/hyphens into a single hyphen, trims hyphens and lowercases.
pub fn sanitize_title(title: &str) -> String {
    let mut sanitized = String::with_capacity(title.len());
    let mut pending_separator = false;

    for ch in title.chars() {
        if ch == '-' || ch.is_whitespace() {
            pending_separator = true;
        } else if ch.is_alphanumeric() || ch == '_' {
            if pending_separator && !sanitized.is_empty() {
                sanitized.push('-');
            }
            pending_separator = false;
            sanitized.extend(ch.to_lowercase());
        }
    }

    sanitized
}

/// Build the output filename: `YYYYmmdd-HHMMSS[--sanitized-title].mp3`
pub fn build_output_filename(title: Option<&str>, now: DateTime<Utc>) -> String {
    let timestamp = now.format("%Y%m%d-%H%M%S");

    match title.map(sanitize_title) {
        Some(sanitized) if !sanitized.is_empty() => {
            format!("{}--{}.{}", timestamp, sanitized, OUTPUT_EXTENSION)
        }
        _ => format!("{}.{}", timestamp, OUTPUT_EXTENSION),
    }
}
