//! Countdown formatting for the UI.

/// Format milliseconds as `"MM:SS"`, rounding up so the display only shows
/// `00:00` once the rest is actually over.
pub fn format_mm_ss(ms: i64) -> String {
    let total_secs = (ms.max(0) as u64).div_ceil(1000);
    let m = total_secs / 60;
    let s = total_secs % 60;
    format!("{m:02}:{s:02}")
}

/// Format milliseconds as `"H:MM:SS"` for the odd very long rest.
pub fn format_hms(ms: i64) -> String {
    let total_secs = (ms.max(0) as u64).div_ceil(1000);
    let h = total_secs / 3600;
    let m = (total_secs % 3600) / 60;
    let s = total_secs % 60;
    format!("{h}:{m:02}:{s:02}")
}

#[cfg(test)]
#[allow(clippy::panic, clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn mm_ss_rounds_up() {
        assert_eq!(format_mm_ss(0), "00:00");
        assert_eq!(format_mm_ss(1), "00:01");
        assert_eq!(format_mm_ss(90_000), "01:30");
        assert_eq!(format_mm_ss(89_001), "01:30");
        assert_eq!(format_mm_ss(-5), "00:00");
    }

    #[test]
    fn hms_formats_hours() {
        assert_eq!(format_hms(0), "0:00:00");
        assert_eq!(format_hms(3_661_000), "1:01:01");
    }
}
