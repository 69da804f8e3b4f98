// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! The signed-in identity presented on every API request.

use crate::error::ClientError;
use crate::time_utils::option_timestamp;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Current identity: bearer token, user id and token expiry.
///
/// Either empty (signed out) or carrying a non-empty access token. A user id
/// never exists without a token.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credential {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    access_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    user_id: Option<String>,
    #[serde(
        default,
        with = "option_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    expires_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    refresh_token: Option<String>,
}

impl Credential {
    /// The signed-out credential.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build an authenticated credential. Rejects a blank access token.
    pub fn authenticated(
        access_token: impl Into<String>,
        user_id: Option<String>,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<Self, ClientError> {
        let access_token = access_token.into();
        if access_token.trim().is_empty() {
            return Err(ClientError::InvalidCredential(
                "access token must not be empty".to_string(),
            ));
        }

        Ok(Self {
            access_token: Some(access_token),
            user_id: user_id.filter(|id| !id.trim().is_empty()),
            expires_at,
            refresh_token: None,
        })
    }

    pub fn with_refresh_token(mut self, refresh_token: Option<String>) -> Self {
        if self.access_token.is_some() {
            self.refresh_token = refresh_token.filter(|t| !t.is_empty());
        }
        self
    }

    pub fn access_token(&self) -> Option<&str> {
        self.access_token.as_deref()
    }

    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }

    pub fn refresh_token(&self) -> Option<&str> {
        self.refresh_token.as_deref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.access_token.is_some()
    }

    /// True when the token is known to expire before `now + margin`.
    pub fn expires_within(&self, now: DateTime<Utc>, margin: Duration) -> bool {
        match self.expires_at {
            Some(expires_at) => now + margin >= expires_at,
            None => false,
        }
    }

    /// Restore the invariant on data read from outside (e.g. a hand-edited file).
    pub(crate) fn normalized(self) -> Self {
        match self.access_token.as_deref() {
            Some(token) if !token.trim().is_empty() => self,
            _ => Self::empty(),
        }
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("access_token", &self.access_token.as_ref().map(|_| "<redacted>"))
            .field("user_id", &self.user_id)
            .field("expires_at", &self.expires_at)
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}
