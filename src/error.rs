// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Client error types shared by every operation in the crate.

use reqwest::StatusCode;

/// Error returned by the API client, the credential store and the session
/// controller.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("Request failed: {0}")]
    Transport(String),

    #[error("Authentication required")]
    Unauthorized,

    #[error("Invalid request: {0}")]
    Validation(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("Invalid response body: {0}")]
    Decode(String),

    #[error("OAuth error: {0}")]
    OAuth(String),

    #[error("Invalid credential: {0}")]
    InvalidCredential(String),

    #[error("Credential storage error: {0}")]
    Storage(String),

    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl ClientError {
    /// Marker text the token endpoint uses when a refresh token is no longer valid.
    pub const INVALID_GRANT: &'static str = "invalid_grant";

    /// True when the server reported the resource as missing.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ClientError::NotFound(_))
    }

    /// True when the caller should send the user through login again.
    pub fn is_auth_error(&self) -> bool {
        match self {
            ClientError::Unauthorized | ClientError::InvalidCredential(_) => true,
            ClientError::OAuth(_) => self.is_invalid_grant(),
            _ => false,
        }
    }

    /// True when the token endpoint rejected a refresh token.
    pub fn is_invalid_grant(&self) -> bool {
        match self {
            ClientError::OAuth(msg) => msg.contains(Self::INVALID_GRANT),
            _ => false,
        }
    }

    /// HTTP status behind this error, if there was one.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Unauthorized => Some(401),
            ClientError::NotFound(_) => Some(404),
            ClientError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Map a non-success status and its body into the error taxonomy.
    ///
    /// `resource` names what was requested and only feeds the not-found message.
    pub fn from_status(status: StatusCode, body: String, resource: &str) -> Self {
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ClientError::Unauthorized,
            StatusCode::NOT_FOUND => ClientError::NotFound(resource.to_string()),
            StatusCode::BAD_REQUEST
            | StatusCode::CONFLICT
            | StatusCode::UNPROCESSABLE_ENTITY => ClientError::Validation(body),
            _ => ClientError::Http {
                status: status.as_u16(),
                body,
            },
        }
    }

    /// Map a reqwest transport failure.
    pub fn transport(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ClientError::Transport(format!("timed out: {}", err))
        } else {
            ClientError::Transport(err.to_string())
        }
    }
}

/// Result type alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ClientError>;
