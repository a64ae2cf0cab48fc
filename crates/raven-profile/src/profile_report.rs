use std::fmt::Write as _;

use chrono::SecondsFormat;

use crate::profile_record::ProfileRecord;

const RULE_WIDE: usize = 50;
const RULE_NARROW: usize = 30;

/// Renders the human-readable report for a record. Output depends only on the record.
pub fn render_report(record: &ProfileRecord) -> String {
    let mut out = String::new();
    let wide = "=".repeat(RULE_WIDE);
    let narrow = "-".repeat(RULE_NARROW);

    let _ = writeln!(out, "PROFILE REPORT - @{}", record.username);
    let _ = writeln!(out, "{wide}");
    let _ = writeln!(out);

    let _ = writeln!(out, "IDENTITY");
    let _ = writeln!(out, "{narrow}");
    let _ = writeln!(out, "ID: {}", record.id);
    let _ = writeln!(out, "Username: @{}", record.username);
    let _ = writeln!(out, "Analyses: {}", record.analysis_count);
    let _ = writeln!(out);

    let _ = writeln!(out, "PROFILE");
    let _ = writeln!(out, "{narrow}");
    let _ = writeln!(out, "Name: {}", or_na(&record.full_name));
    let _ = writeln!(out, "Biography: {}", or_na(&record.biography));
    let _ = writeln!(out, "Picture: {}", or_na(&record.profile_pic_url));
    let _ = writeln!(out);

    let _ = writeln!(out, "STATISTICS");
    let _ = writeln!(out, "{narrow}");
    let _ = writeln!(out, "Followers: {}", group_thousands(record.followers));
    let _ = writeln!(out, "Following: {}", group_thousands(record.following));
    let _ = writeln!(out, "Posts: {}", group_thousands(record.posts_count));
    let _ = writeln!(out, "Private: {}", yes_no(record.is_private));
    let _ = writeln!(out, "Verified: {}", yes_no(record.is_verified));
    let _ = writeln!(out);

    if record.username_history.len() > 1 {
        let _ = writeln!(out, "USERNAME HISTORY");
        let _ = writeln!(out, "{narrow}");
        let last = record.username_history.len() - 1;
        for (index, username) in record.username_history.iter().enumerate() {
            let marker = if index == last { " (current)" } else { "" };
            let _ = writeln!(out, "{}. @{username}{marker}", index + 1);
        }
        let _ = writeln!(out);
    }

    let _ = writeln!(out, "{narrow}");
    let _ = writeln!(
        out,
        "First analysis: {}",
        record.first_analysis.to_rfc3339_opts(SecondsFormat::Secs, true)
    );
    let _ = writeln!(
        out,
        "Last updated: {}",
        record.last_updated.to_rfc3339_opts(SecondsFormat::Secs, true)
    );
    out
}

fn or_na(value: &str) -> &str {
    if value.trim().is_empty() {
        "N/A"
    } else {
        value
    }
}

fn yes_no(value: bool) -> &'static str {
    if value {
        "yes"
    } else {
        "no"
    }
}

fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, ch) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}
