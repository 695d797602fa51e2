use std::time::Duration;

/// Small string helpers.
pub struct StringUtil;

impl StringUtil {
    /// Convert a string to a boolean.
    ///
    /// Valid true values: `"1"`, `"true"`, `"yes"` (case-insensitive).
    /// Valid false values: `"0"`, `"false"`, `"no"` (case-insensitive).
    /// Returns `None` for unrecognized values.
    pub fn convert_to_bool(value: &str) -> Option<bool> {
        match value.trim().to_lowercase().as_str() {
            "1" | "true" | "yes" => Some(true),
            "0" | "false" | "no" => Some(false),
            _ => None,
        }
    }

    /// Render a duration for humans: milliseconds under a second, seconds
    /// under a minute, minutes otherwise. Always two decimals.
    pub fn format_duration(duration: Duration) -> String {
        if duration < Duration::from_secs(1) {
            format!("{:.2} ms", duration.as_micros() as f64 / 1000.0)
        } else if duration < Duration::from_secs(60) {
            format!("{:.2} seconds", duration.as_secs_f64())
        } else {
            format!("{:.2} minutes", duration.as_secs_f64() / 60.0)
        }
    }
}
