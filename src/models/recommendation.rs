// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! AI recommendation payloads from `/recommendations`.

use crate::models::ActivityType;
use crate::time_utils::option_timestamp;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Intensity shown when the backend did not classify one.
pub const DEFAULT_INTENSITY: &str = "Moderate";

/// Recommendation text and guidance for a single activity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationResult {
    pub activity_id: String,
    pub recommendation: String,
    pub improvements: Vec<String>,
    pub safety: Vec<String>,
}

/// A recommendation merged with the fields of the activity it was generated for.
///
/// Every field is optional on the wire: the recommendation may not have been
/// generated yet, and the activity fields depend on the backend version.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityRecommendation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub activity_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(
        default,
        rename = "type",
        alias = "activityType",
        skip_serializing_if = "Option::is_none"
    )]
    pub activity_type: Option<ActivityType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calories_burnt: Option<i32>,
    #[serde(
        default,
        with = "option_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intensity: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommendation: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub improvements: Vec<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub suggestions: Vec<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub safety: Vec<String>,
}

impl ActivityRecommendation {
    /// The recommendation part, if one has been generated.
    pub fn result(&self) -> Option<RecommendationResult> {
        let recommendation = self
            .recommendation
            .as_deref()
            .map(str::trim)
            .filter(|text| !text.is_empty())?;

        Some(RecommendationResult {
            activity_id: self.activity_id.clone(),
            recommendation: recommendation.to_string(),
            improvements: self.improvements.clone(),
            safety: self.safety.clone(),
        })
    }

    pub fn intensity_label(&self) -> &str {
        self.intensity
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(DEFAULT_INTENSITY)
    }
}

fn null_as_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}
