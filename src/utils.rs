//! Utility helpers shared by the engine and the view layer.

/// Label shown for the elapsed time when nothing is known yet.
pub const ZERO_TIME_LABEL: &str = "0:00";
/// Label shown for the total time when the duration is unknown.
pub const UNKNOWN_TIME_LABEL: &str = "--:--";

/// Clamp a volume to the 0..=1 range, mapping NaN to the default.
pub fn normalize_volume(value: f64, fallback: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        fallback
    }
}

/// Whether a media duration is usable for display and seeking.
pub fn is_known_duration(duration: f64) -> bool {
    duration.is_finite() && duration > 0.0
}

/// Format seconds as `m:ss`, or `h:mm:ss` past an hour.
pub fn format_time(seconds: f64) -> String {
    if !seconds.is_finite() || seconds < 0.0 {
        return ZERO_TIME_LABEL.to_string();
    }
    let total = seconds.floor() as u64;
    let hours = total / 3600;
    let mins = (total % 3600) / 60;
    let secs = total % 60;
    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, mins, secs)
    } else {
        format!("{}:{:02}", mins, secs)
    }
}

/// Format a duration, falling back to the unknown sentinel.
pub fn format_duration(duration: f64) -> String {
    if is_known_duration(duration) {
        format_time(duration)
    } else {
        UNKNOWN_TIME_LABEL.to_string()
    }
}

/// Progress through the track as a percentage, 0 when the duration is unknown.
pub fn progress_percent(current_time: f64, duration: f64) -> f64 {
    if !is_known_duration(duration) || !current_time.is_finite() {
        return 0.0;
    }
    (current_time / duration * 100.0).clamp(0.0, 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_minutes_and_hours() {
        assert_eq!(format_time(0.0), "0:00");
        assert_eq!(format_time(65.9), "1:05");
        assert_eq!(format_time(3725.0), "1:02:05");
    }

    #[test]
    fn unknown_values_use_sentinels() {
        assert_eq!(format_time(f64::NAN), ZERO_TIME_LABEL);
        assert_eq!(format_duration(f64::NAN), UNKNOWN_TIME_LABEL);
        assert_eq!(format_duration(f64::INFINITY), UNKNOWN_TIME_LABEL);
        assert_eq!(format_duration(0.0), UNKNOWN_TIME_LABEL);
    }

    #[test]
    fn progress_guards_divide_by_zero() {
        assert_eq!(progress_percent(10.0, 0.0), 0.0);
        assert_eq!(progress_percent(10.0, f64::NAN), 0.0);
        assert!((progress_percent(30.0, 120.0) - 25.0).abs() < 1e-9);
        assert_eq!(progress_percent(500.0, 120.0), 100.0);
    }

    #[test]
    fn volume_is_clamped() {
        assert_eq!(normalize_volume(1.7, 0.5), 1.0);
        assert_eq!(normalize_volume(-0.2, 0.5), 0.0);
        assert_eq!(normalize_volume(f64::NAN, 0.5), 0.5);
    }
}
