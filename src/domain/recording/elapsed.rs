//! Elapsed-time formatting

/// Interval between status lines, in seconds
pub const STATUS_INTERVAL_SECS: u64 = 30;

/// Format elapsed seconds as zero-padded `HH:MM:SS`
pub fn format_elapsed(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;
    format!("{:02}:{:02}:{:02}", hours, minutes, secs)
}

/// Whether a status line is due at this elapsed second
pub fn is_status_tick(elapsed_secs: u64) -> bool {
    elapsed_secs > 0 && elapsed_secs % STATUS_INTERVAL_SECS == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_zero() {
        assert_eq!(format_elapsed(0), "00:00:00");
    }

    #[test]
    fn formats_minutes_and_hours() {
        assert_eq!(format_elapsed(59), "00:00:59");
        assert_eq!(format_elapsed(90), "00:01:30");
        assert_eq!(format_elapsed(3661), "01:01:01");
        assert_eq!(format_elapsed(9000), "02:30:00");
    }

    #[test]
    fn hours_are_not_wrapped() {
        assert_eq!(format_elapsed(100 * 3600), "100:00:00");
    }

    #[test]
    fn status_ticks_every_thirty_seconds() {
        assert!(!is_status_tick(0));
        assert!(!is_status_tick(29));
        assert!(is_status_tick(30));
        assert!(!is_status_tick(31));
        assert!(is_status_tick(60));
    }
}
