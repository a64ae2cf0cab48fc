#![no_main]

use chrono::Utc;
use libfuzzer_sys::fuzz_target;
use raven_profile::{
    reconcile_profile, render_report, FreshProfileFields, MergePolicy, ProfileRecord,
};

fuzz_target!(|data: &[u8]| {
    let Ok(record) = serde_json::from_slice::<ProfileRecord>(data) else {
        return;
    };
    let _ = render_report(&record);

    let fresh = FreshProfileFields::with_username(format!("{}_next", record.username.trim()));
    let merged = reconcile_profile(
        Some(&record),
        record.id,
        &fresh,
        MergePolicy::default(),
        Utc::now(),
    )
    .expect("merge with an existing record never needs a username");
    assert_eq!(merged.id, record.id);
    assert_eq!(merged.first_analysis, record.first_analysis);
    assert_eq!(
        merged.username_history.last().map(String::as_str),
        Some(merged.username.as_str())
    );
    assert_eq!(merged.analysis_count, record.analysis_count.saturating_add(1));
});
