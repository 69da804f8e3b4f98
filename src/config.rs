// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Client configuration loaded from environment variables.
//!
//! A `.env` file in the working directory is honoured for local development.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_CLIENT_ID: &str = "oauth2-pkce-client";
const DEFAULT_AUTHORIZATION_ENDPOINT: &str =
    "http://localhost:8070/realms/fitness-oauth2/protocol/openid-connect/auth";
const DEFAULT_TOKEN_ENDPOINT: &str =
    "http://localhost:8070/realms/fitness-oauth2/protocol/openid-connect/token";
const DEFAULT_REDIRECT_URI: &str = "http://localhost:5173";
const DEFAULT_SCOPES: &str = "openid profile email offline_access";
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// Client configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the fitness API (`/activities`, `/recommendations`)
    pub api_url: String,
    /// OAuth2 client ID (public client, no secret)
    pub client_id: String,
    /// Authorization endpoint the user is sent to
    pub authorization_endpoint: String,
    /// Token endpoint for code exchange and refresh
    pub token_endpoint: String,
    /// Optional end-session endpoint for server-side logout
    pub end_session_endpoint: Option<String>,
    /// Loopback redirect URI registered for this client
    pub redirect_uri: String,
    /// Space-separated scopes requested at login
    pub scopes: String,
    /// Where the credential store persists between runs
    pub credentials_path: PathBuf,
    /// Per-request timeout
    pub http_timeout: Duration,
}

impl Default for Config {
    /// Default config for testing only.
    fn default() -> Self {
        Self {
            api_url: "http://localhost:8080/api".to_string(),
            client_id: DEFAULT_CLIENT_ID.to_string(),
            authorization_endpoint: DEFAULT_AUTHORIZATION_ENDPOINT.to_string(),
            token_endpoint: DEFAULT_TOKEN_ENDPOINT.to_string(),
            end_session_endpoint: None,
            redirect_uri: DEFAULT_REDIRECT_URI.to_string(),
            scopes: DEFAULT_SCOPES.to_string(),
            credentials_path: PathBuf::from("fittrack-test-credentials.json"),
            http_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let api_url = env::var("FITTRACK_API_URL")
            .map(|v| v.trim().trim_end_matches('/').to_string())
            .map_err(|_| ConfigError::Missing("FITTRACK_API_URL"))?;
        validate_url("FITTRACK_API_URL", &api_url)?;

        let authorization_endpoint = env::var("FITTRACK_AUTHORIZATION_ENDPOINT")
            .unwrap_or_else(|_| DEFAULT_AUTHORIZATION_ENDPOINT.to_string());
        validate_url("FITTRACK_AUTHORIZATION_ENDPOINT", &authorization_endpoint)?;

        let token_endpoint = env::var("FITTRACK_TOKEN_ENDPOINT")
            .unwrap_or_else(|_| DEFAULT_TOKEN_ENDPOINT.to_string());
        validate_url("FITTRACK_TOKEN_ENDPOINT", &token_endpoint)?;

        let end_session_endpoint = env::var("FITTRACK_END_SESSION_ENDPOINT")
            .ok()
            .filter(|v| !v.trim().is_empty());
        if let Some(url) = &end_session_endpoint {
            validate_url("FITTRACK_END_SESSION_ENDPOINT", url)?;
        }

        let redirect_uri =
            env::var("FITTRACK_REDIRECT_URI").unwrap_or_else(|_| DEFAULT_REDIRECT_URI.to_string());
        validate_url("FITTRACK_REDIRECT_URI", &redirect_uri)?;

        let http_timeout = match env::var("FITTRACK_HTTP_TIMEOUT_SECS") {
            Ok(raw) => raw
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs)
                .ok_or_else(|| ConfigError::Invalid("FITTRACK_HTTP_TIMEOUT_SECS", raw))?,
            Err(_) => Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
        };

        Ok(Self {
            api_url,
            client_id: env::var("FITTRACK_CLIENT_ID")
                .unwrap_or_else(|_| DEFAULT_CLIENT_ID.to_string()),
            authorization_endpoint,
            token_endpoint,
            end_session_endpoint,
            redirect_uri,
            scopes: env::var("FITTRACK_SCOPES").unwrap_or_else(|_| DEFAULT_SCOPES.to_string()),
            credentials_path: env::var("FITTRACK_CREDENTIALS_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| default_credentials_path()),
            http_timeout,
        })
    }

    /// Point the client at a different API base URL (used by tests).
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into().trim_end_matches('/').to_string();
        self
    }
}

/// `<config dir>/fittrack/credentials.json`, or a dot-directory in the
/// working directory when the platform has no config dir.
pub fn default_credentials_path() -> PathBuf {
    dirs::config_dir()
        .map(|dir| dir.join("fittrack"))
        .unwrap_or_else(|| PathBuf::from(".fittrack"))
        .join("credentials.json")
}

fn validate_url(name: &'static str, value: &str) -> Result<(), ConfigError> {
    reqwest::Url::parse(value)
        .map(|_| ())
        .map_err(|_| ConfigError::Invalid(name, value.to_string()))
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {0}: {1}")]
    Invalid(&'static str, String),
}
