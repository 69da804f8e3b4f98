// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Activity records as served by `/activities`.

use crate::time_utils::{option_timestamp, timestamp};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use validator::Validate;

/// Free-form per-activity metrics (heart rate, distance, ...).
pub type Metrics = BTreeMap<String, serde_json::Value>;

/// Kind of workout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActivityType {
    Running,
    Walking,
    Cycling,
    Swimming,
    WeightTraining,
    Yoga,
    Hiit,
    Cardio,
    // The recommendation service spells it this way.
    #[serde(alias = "STREACHING")]
    Stretching,
    Other,
}

impl ActivityType {
    pub const ALL: [ActivityType; 10] = [
        ActivityType::Running,
        ActivityType::Walking,
        ActivityType::Cycling,
        ActivityType::Swimming,
        ActivityType::WeightTraining,
        ActivityType::Yoga,
        ActivityType::Hiit,
        ActivityType::Cardio,
        ActivityType::Stretching,
        ActivityType::Other,
    ];

    /// Wire name, e.g. `WEIGHT_TRAINING`.
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityType::Running => "RUNNING",
            ActivityType::Walking => "WALKING",
            ActivityType::Cycling => "CYCLING",
            ActivityType::Swimming => "SWIMMING",
            ActivityType::WeightTraining => "WEIGHT_TRAINING",
            ActivityType::Yoga => "YOGA",
            ActivityType::Hiit => "HIIT",
            ActivityType::Cardio => "CARDIO",
            ActivityType::Stretching => "STRETCHING",
            ActivityType::Other => "OTHER",
        }
    }

    /// Human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            ActivityType::Running => "Running",
            ActivityType::Walking => "Walking",
            ActivityType::Cycling => "Cycling",
            ActivityType::Swimming => "Swimming",
            ActivityType::WeightTraining => "Weight Training",
            ActivityType::Yoga => "Yoga",
            ActivityType::Hiit => "HIIT",
            ActivityType::Cardio => "Cardio",
            ActivityType::Stretching => "Stretching",
            ActivityType::Other => "Other",
        }
    }
}

impl fmt::Display for ActivityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Error for an activity type name nobody recognises.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown activity type: {0}")]
pub struct UnknownActivityType(pub String);

impl FromStr for ActivityType {
    type Err = UnknownActivityType;

    /// Accepts wire names and loose spellings: `weight-training`, `Weight Training`, `hiit`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase().replace(['-', ' '], "_");
        if normalized == "STREACHING" {
            return Ok(ActivityType::Stretching);
        }
        ActivityType::ALL
            .into_iter()
            .find(|t| t.as_str() == normalized)
            .ok_or_else(|| UnknownActivityType(s.to_string()))
    }
}

/// An activity owned by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityRecord {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(rename = "type")]
    pub activity_type: ActivityType,
    /// Duration in minutes
    pub duration: i32,
    pub calories_burnt: i32,
    #[serde(
        default,
        with = "option_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(
        default,
        with = "option_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub additional_metrics: Metrics,
}

/// Write-side shape for `POST /activities`; the backend assigns `id` and `createdAt`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewActivityRequest {
    #[serde(rename = "type")]
    pub activity_type: ActivityType,
    /// Duration in minutes
    #[validate(range(min = 1, message = "duration must be a positive number of minutes"))]
    pub duration: i32,
    #[validate(range(min = 0, message = "caloriesBurnt must not be negative"))]
    pub calories_burnt: i32,
    #[serde(
        default,
        with = "option_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub additional_metrics: Metrics,
}

impl NewActivityRequest {
    pub fn new(activity_type: ActivityType, duration: i32, calories_burnt: i32) -> Self {
        Self {
            activity_type,
            duration,
            calories_burnt,
            start_time: None,
            additional_metrics: Metrics::new(),
        }
    }

    pub fn with_metric(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.additional_metrics.insert(key.into(), value);
        self
    }

    pub fn with_start_time(mut self, start_time: DateTime<Utc>) -> Self {
        self.start_time = Some(start_time);
        self
    }
}

fn null_as_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Metrics, D::Error> {
    Ok(Option::<Metrics>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_activity_type_wire_names() {
        for t in ActivityType::ALL {
            let encoded = serde_json::to_value(t).unwrap();
            assert_eq!(encoded, json!(t.as_str()));
        }
    }

    #[test]
    fn test_activity_type_accepts_streaching() {
        let t: ActivityType = serde_json::from_value(json!("STREACHING")).unwrap();
        assert_eq!(t, ActivityType::Stretching);
        assert_eq!("streaching".parse::<ActivityType>().unwrap(), ActivityType::Stretching);
    }

    #[test]
    fn test_activity_type_from_loose_input() {
        assert_eq!(
            "weight-training".parse::<ActivityType>().unwrap(),
            ActivityType::WeightTraining
        );
        assert_eq!(
            "Weight Training".parse::<ActivityType>().unwrap(),
            ActivityType::WeightTraining
        );
        assert_eq!("hiit".parse::<ActivityType>().unwrap(), ActivityType::Hiit);
        assert!("rowing".parse::<ActivityType>().is_err());
    }

    #[test]
    fn test_record_from_backend_json() {
        let record: ActivityRecord = serde_json::from_value(json!({
            "id": "a1",
            "userId": "u1",
            "type": "CYCLING",
            "duration": 45,
            "caloriesBurnt": 380,
            "startTime": null,
            "createdAt": "2025-03-01T07:30:00.123",
            "updatedAt": "2025-03-01T07:30:00.123",
            "additionalMetrics": null
        }))
        .unwrap();

        assert_eq!(record.activity_type, ActivityType::Cycling);
        assert_eq!(record.duration, 45);
        assert!(record.start_time.is_none());
        assert!(record.additional_metrics.is_empty());
    }

    #[test]
    fn test_new_request_validation() {
        let ok = NewActivityRequest::new(ActivityType::Running, 30, 0);
        assert!(ok.validate().is_ok());

        let zero = NewActivityRequest::new(ActivityType::Running, 0, 100);
        assert!(zero.validate().is_err());

        let negative = NewActivityRequest::new(ActivityType::Running, -5, 100);
        assert!(negative.validate().is_err());

        let negative_calories = NewActivityRequest::new(ActivityType::Yoga, 20, -1);
        assert!(negative_calories.validate().is_err());
    }

    #[test]
    fn test_new_request_wire_shape() {
        let req = NewActivityRequest::new(ActivityType::WeightTraining, 40, 210)
            .with_metric("sets", json!(5));
        let body = serde_json::to_value(&req).unwrap();

        assert_eq!(
            body,
            json!({
                "type": "WEIGHT_TRAINING",
                "duration": 40,
                "caloriesBurnt": 210,
                "additionalMetrics": {"sets": 5}
            })
        );
    }
}
