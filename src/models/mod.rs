// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod activity;
pub mod credential;
pub mod recommendation;

pub use activity::{ActivityRecord, ActivityType, Metrics, NewActivityRequest};
pub use credential::Credential;
pub use recommendation::{ActivityRecommendation, RecommendationResult};
