// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Plain-text rendering for CLI output.

use crate::models::{ActivityRecommendation, ActivityRecord, Credential};
use crate::time_utils::format_utc_rfc3339;
use chrono::{DateTime, Utc};
use std::fmt::Write as _;

pub fn activity_table(activities: &[ActivityRecord]) -> String {
    if activities.is_empty() {
        return "No activities logged yet.\n".to_string();
    }

    let mut out = format!(
        "{:<26} {:<16} {:>8} {:>9}  {}\n",
        "ID", "TYPE", "MINUTES", "CALORIES", "CREATED"
    );
    for activity in activities {
        let _ = writeln!(
            out,
            "{:<26} {:<16} {:>8} {:>9}  {}",
            activity.id,
            activity.activity_type.label(),
            activity.duration,
            activity.calories_burnt,
            activity.created_at.format("%Y-%m-%d %H:%M"),
        );
    }
    out
}

pub fn activity_detail(activity: &ActivityRecord) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} ({})", activity.activity_type.label(), activity.id);
    let _ = writeln!(out, "  Duration:  {} minutes", activity.duration);
    let _ = writeln!(out, "  Calories:  {} kcal", activity.calories_burnt);
    if let Some(start) = activity.start_time {
        let _ = writeln!(out, "  Started:   {}", format_utc_rfc3339(start));
    }
    let _ = writeln!(out, "  Recorded:  {}", format_utc_rfc3339(activity.created_at));
    if !activity.additional_metrics.is_empty() {
        let _ = writeln!(out, "  Metrics:");
        for (key, value) in &activity.additional_metrics {
            let _ = writeln!(out, "    {}: {}", key, value);
        }
    }
    out
}

/// Recommendation view, or an empty state when none has been generated.
pub fn recommendation_detail(rec: &ActivityRecommendation) -> String {
    let mut out = String::new();

    let label = rec
        .activity_type
        .map(|t| t.label())
        .unwrap_or("Activity");
    let _ = writeln!(out, "{} ({})", label, rec.activity_id);
    if let Some(duration) = rec.duration {
        let _ = writeln!(out, "  Duration:  {} minutes", duration);
    }
    if let Some(calories) = rec.calories_burnt {
        let _ = writeln!(out, "  Calories:  {} kcal", calories);
    }
    let _ = writeln!(out, "  Intensity: {}", rec.intensity_label());
    if let Some(created) = rec.created_at {
        let _ = writeln!(out, "  Recorded:  {}", format_utc_rfc3339(created));
    }

    let Some(result) = rec.result() else {
        out.push_str("\nNo recommendation available yet.\n");
        return out;
    };

    let _ = writeln!(out, "\nAnalysis\n  {}", result.recommendation);
    numbered_section(&mut out, "Suggested improvements", &result.improvements);
    numbered_section(&mut out, "Safety tips", &result.safety);
    out
}

pub fn no_recommendation(activity_id: &str) -> String {
    format!("No recommendation available yet for activity {}.\n", activity_id)
}

pub fn credential_status(credential: &Credential, now: DateTime<Utc>) -> String {
    if !credential.is_authenticated() {
        return "Not signed in. Run `fittrack login`.\n".to_string();
    }

    let mut out = format!(
        "Signed in as {}\n",
        credential.user_id().unwrap_or("<unknown user>")
    );
    match credential.expires_at() {
        Some(expires_at) if expires_at <= now => {
            out.push_str("  Token expired");
            if credential.refresh_token().is_some() {
                out.push_str(" (will refresh on next request)");
            }
            out.push('\n');
        }
        Some(expires_at) => {
            let _ = writeln!(out, "  Token expires {}", format_utc_rfc3339(expires_at));
        }
        None => out.push_str("  Token expiry unknown\n"),
    }
    out
}

fn numbered_section(out: &mut String, title: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    let _ = writeln!(out, "\n{}", title);
    for (i, item) in items.iter().enumerate() {
        let _ = writeln!(out, "  {}. {}", i + 1, item);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ActivityType;
    use chrono::{Duration, TimeZone};

    fn record() -> ActivityRecord {
        ActivityRecord {
            id: "a1".to_string(),
            user_id: None,
            activity_type: ActivityType::Hiit,
            duration: 20,
            calories_burnt: 250,
            start_time: None,
            created_at: Utc.with_ymd_and_hms(2025, 3, 1, 7, 30, 0).unwrap(),
            updated_at: None,
            additional_metrics: Default::default(),
        }
    }

    #[test]
    fn test_activity_table() {
        let table = activity_table(&[record()]);
        assert!(table.starts_with("ID"));
        assert!(table.contains("HIIT"));
        assert!(table.contains("2025-03-01 07:30"));

        assert_eq!(activity_table(&[]), "No activities logged yet.\n");
    }

    #[test]
    fn test_recommendation_empty_state() {
        let rec = ActivityRecommendation {
            activity_id: "a1".to_string(),
            ..Default::default()
        };
        let text = recommendation_detail(&rec);
        assert!(text.contains("Intensity: Moderate"));
        assert!(text.contains("No recommendation available yet."));
    }

    #[test]
    fn test_recommendation_sections_numbered() {
        let rec = ActivityRecommendation {
            activity_id: "a1".to_string(),
            recommendation: Some("Good pace.".to_string()),
            improvements: vec!["Longer cooldown".to_string()],
            safety: vec!["Hydrate".to_string(), "Stretch".to_string()],
            ..Default::default()
        };
        let text = recommendation_detail(&rec);
        assert!(text.contains("Good pace."));
        assert!(text.contains("  1. Longer cooldown"));
        assert!(text.contains("  2. Stretch"));
    }

    #[test]
    fn test_credential_status() {
        let now = Utc::now();
        assert!(credential_status(&Credential::empty(), now).starts_with("Not signed in"));

        let cred =
            Credential::authenticated("t", Some("u1".to_string()), Some(now - Duration::minutes(1)))
                .unwrap();
        let text = credential_status(&cred, now);
        assert!(text.contains("Signed in as u1"));
        assert!(text.contains("Token expired"));
    }
}
