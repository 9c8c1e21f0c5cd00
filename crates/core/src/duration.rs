//! Duration helpers for the live monitoring view.

/// Milliseconds in one hour. Estimation values below [`MS_THRESHOLD`] are
/// hours and get scaled by this.
pub const MS_PER_HOUR: f64 = 3_600_000.0;

/// Stored estimations at or above this value are already milliseconds.
pub const MS_THRESHOLD: f64 = 1000.0;

/// Format milliseconds as the non-zero parts of `Nh Nmin Ns`.
///
/// Seconds are floored and negative inputs are formatted by magnitude.
/// Anything under one second renders as `"0s"`.
pub fn format_duration_compact(ms: i64) -> String {
    let total_secs = ms.unsigned_abs() / 1000;
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;

    let mut parts = Vec::with_capacity(3);
    if hours > 0 {
        parts.push(format!("{hours}h"));
    }
    if minutes > 0 {
        parts.push(format!("{minutes}min"));
    }
    if seconds > 0 || parts.is_empty() {
        parts.push(format!("{seconds}s"));
    }
    parts.join(" ")
}

/// Convert a stored estimation value to milliseconds.
///
/// `0 < value < 1000` is read as hours (`8` means an 8-hour day) and rounded to
/// the nearest millisecond. Every other finite value is taken as milliseconds.
/// Non-finite values count as zero.
pub fn estimate_to_ms(value: f64) -> i64 {
    if !value.is_finite() {
        return 0;
    }
    if value > 0.0 && value < MS_THRESHOLD {
        (value * MS_PER_HOUR).round() as i64
    } else {
        value as i64
    }
}
