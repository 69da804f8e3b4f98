// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Fitness API client.
//!
//! Handles:
//! - Activity listing, lookup and creation
//! - Recommendation lookup per activity and per user
//! - Identity headers on every request (via [`RequestDecorator`])
//!
//! Every call is a single round trip. Nothing is retried or queued here;
//! callers own any retry policy.

use crate::config::Config;
use crate::error::{ClientError, Result};
use crate::middleware::{OutgoingRequest, RequestDecorator};
use crate::models::{ActivityRecommendation, ActivityRecord, NewActivityRequest};
use crate::services::CredentialStore;
use serde::de::DeserializeOwned;
use validator::Validate;

/// Typed client for `/activities` and `/recommendations`.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    decorator: RequestDecorator,
}

impl ApiClient {
    /// Create a client for `config.api_url` reading identity from `store`.
    pub fn new(config: &Config, store: CredentialStore) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .build()
            .map_err(|e| ClientError::Internal(anyhow::anyhow!("building HTTP client: {}", e)))?;

        Ok(Self::with_http_client(
            http,
            config.api_url.clone(),
            RequestDecorator::new(store),
        ))
    }

    pub fn with_http_client(
        http: reqwest::Client,
        base_url: impl Into<String>,
        decorator: RequestDecorator,
    ) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            decorator,
        }
    }

    /// List the signed-in user's activities, in server order.
    pub async fn list_activities(&self) -> Result<Vec<ActivityRecord>> {
        let response = self
            .send(OutgoingRequest::get("/activities"), "activities")
            .await?;
        parse_json(response).await
    }

    /// Get a single activity by ID.
    pub async fn get_activity(&self, activity_id: &str) -> Result<ActivityRecord> {
        let activity_id = require_id(activity_id, "activity id")?;
        let path = format!("/activities/{}", urlencoding::encode(activity_id));
        let response = self
            .send(OutgoingRequest::get(path), &format!("activity {}", activity_id))
            .await?;
        parse_json(response).await
    }

    /// Create an activity.
    ///
    /// Returns `None` when the backend answers with an empty body.
    pub async fn create_activity(
        &self,
        request: &NewActivityRequest,
    ) -> Result<Option<ActivityRecord>> {
        request
            .validate()
            .map_err(|e| ClientError::Validation(e.to_string()))?;

        let body = serde_json::to_value(request)
            .map_err(|e| ClientError::Internal(anyhow::anyhow!("encoding activity: {}", e)))?;

        let response = self
            .send(OutgoingRequest::post("/activities", body), "activities")
            .await?;

        let bytes = response.bytes().await.map_err(ClientError::transport)?;
        if bytes.iter().all(u8::is_ascii_whitespace) {
            tracing::info!(activity_type = %request.activity_type, "Activity created (no body returned)");
            return Ok(None);
        }

        let created: ActivityRecord = serde_json::from_slice(&bytes)
            .map_err(|e| ClientError::Decode(format!("created activity: {}", e)))?;
        tracing::info!(activity_id = %created.id, "Activity created");
        Ok(Some(created))
    }

    /// Get the recommendation generated for an activity.
    ///
    /// An unknown activity (or one without a recommendation yet) yields
    /// [`ClientError::NotFound`].
    pub async fn get_activity_recommendation(
        &self,
        activity_id: &str,
    ) -> Result<ActivityRecommendation> {
        let activity_id = require_id(activity_id, "activity id")?;
        let path = format!(
            "/recommendations/activity/{}",
            urlencoding::encode(activity_id)
        );
        let response = self
            .send(
                OutgoingRequest::get(path),
                &format!("recommendation for activity {}", activity_id),
            )
            .await?;

        let mut recommendation: ActivityRecommendation = parse_json(response).await?;
        if recommendation.activity_id.is_empty() {
            recommendation.activity_id = activity_id.to_string();
        }
        Ok(recommendation)
    }

    /// List every recommendation generated for a user.
    pub async fn list_user_recommendations(
        &self,
        user_id: &str,
    ) -> Result<Vec<ActivityRecommendation>> {
        let user_id = require_id(user_id, "user id")?;
        let path = format!("/recommendations/user/{}", urlencoding::encode(user_id));
        let response = self
            .send(
                OutgoingRequest::get(path),
                &format!("recommendations for user {}", user_id),
            )
            .await?;
        parse_json(response).await
    }

    /// Decorate, send, and check the status of one request.
    async fn send(&self, request: OutgoingRequest, resource: &str) -> Result<reqwest::Response> {
        let request = self.decorator.decorate(&request);
        let url = format!("{}{}", self.base_url, request.path);

        let mut builder = self
            .http
            .request(request.method.clone(), &url)
            .headers(request.headers);
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(|e| {
            tracing::warn!(url = %url, error = %e, "API request failed");
            ClientError::transport(e)
        })?;

        let status = response.status();
        if status.is_success() {
            tracing::debug!(method = %request.method, url = %url, status = status.as_u16(), "API request complete");
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        tracing::warn!(
            method = %request.method,
            url = %url,
            status = status.as_u16(),
            "API request rejected"
        );
        Err(ClientError::from_status(status, body, resource))
    }
}

fn require_id<'a>(id: &'a str, what: &str) -> Result<&'a str> {
    let id = id.trim();
    if id.is_empty() {
        return Err(ClientError::Validation(format!("{} must not be empty", what)));
    }
    Ok(id)
}

async fn parse_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    let bytes = response.bytes().await.map_err(ClientError::transport)?;
    serde_json::from_slice(&bytes).map_err(|e| ClientError::Decode(e.to_string()))
}
