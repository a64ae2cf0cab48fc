use chrono::{DateTime, Duration, Utc};

/// Returns the current Unix timestamp in milliseconds.
pub fn current_unix_timestamp_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis()
        .try_into()
        .unwrap_or(u64::MAX)
}

/// Elapsed time between `earlier` and `now`, clamped at zero for clock skew.
pub fn age_at(earlier: DateTime<Utc>, now: DateTime<Utc>) -> Duration {
    let age = now.signed_duration_since(earlier);
    if age < Duration::zero() {
        Duration::zero()
    } else {
        age
    }
}

/// Returns true when strictly more than `max_age` has passed since `earlier`.
pub fn is_older_than(earlier: DateTime<Utc>, now: DateTime<Utc>, max_age: Duration) -> bool {
    now.signed_duration_since(earlier) > max_age
}

/// Renders an age as fractional hours, e.g. `3.5h`.
pub fn format_age_hours(age: Duration) -> String {
    let hours = age.num_seconds() as f64 / 3_600.0;
    format!("{hours:.1}h")
}
