//! Foundational low-level utilities shared across raven crates.
//!
//! Provides atomic file-write helpers and time utilities used by session
//! persistence, profile records, and expiry calculations.

pub mod atomic_io;
pub mod time_utils;

pub use atomic_io::{
    remove_file_if_exists, write_bytes_atomic, write_secret_atomic, write_text_atomic,
};
pub use time_utils::{age_at, current_unix_timestamp_ms, format_age_hours, is_older_than};

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};

    use super::*;

    #[test]
    fn unit_is_older_than_is_strict_at_the_boundary() {
        let issued = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).single().expect("ts");
        let max_age = Duration::hours(24);
        assert!(!is_older_than(issued, issued + max_age, max_age));
        assert!(is_older_than(
            issued,
            issued + max_age + Duration::seconds(1),
            max_age
        ));
        assert!(!is_older_than(issued, issued - Duration::hours(1), max_age));
    }

    #[test]
    fn unit_age_at_clamps_future_timestamps_to_zero() {
        let now = Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).single().expect("ts");
        assert_eq!(age_at(now + Duration::minutes(5), now), Duration::zero());
        assert_eq!(age_at(now - Duration::minutes(90), now), Duration::minutes(90));
        assert_eq!(format_age_hours(Duration::minutes(90)), "1.5h");
    }

    #[test]
    fn unit_current_unix_timestamp_ms_is_monotonic_enough() {
        let first = current_unix_timestamp_ms();
        let second = current_unix_timestamp_ms();
        assert!(second >= first);
    }
}
