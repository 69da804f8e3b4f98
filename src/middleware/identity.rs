// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Identity header injection for outbound API requests.

use crate::services::CredentialStore;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION};
use reqwest::Method;

/// Header carrying the signed-in user's id.
pub const USER_ID_HEADER: HeaderName = HeaderName::from_static("x-user-id");

/// Description of a request before it is handed to the HTTP client.
#[derive(Debug, Clone, PartialEq)]
pub struct OutgoingRequest {
    pub method: Method,
    /// Path relative to the API base URL, starting with `/`
    pub path: String,
    pub headers: HeaderMap,
    pub body: Option<serde_json::Value>,
}

impl OutgoingRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            headers: HeaderMap::new(),
            body: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>, body: serde_json::Value) -> Self {
        Self {
            body: Some(body),
            ..Self::new(Method::POST, path)
        }
    }
}

/// Attaches `Authorization` and `X-User-ID` from the credential store.
///
/// The store is read on every call, so a credential written by the session
/// controller is visible to the very next request.
#[derive(Clone)]
pub struct RequestDecorator {
    store: CredentialStore,
}

impl RequestDecorator {
    pub fn new(store: CredentialStore) -> Self {
        Self { store }
    }

    /// Return a copy of `request` carrying whatever identity is present.
    ///
    /// Missing identity is not an error here; the server decides whether an
    /// anonymous request is acceptable.
    pub fn decorate(&self, request: &OutgoingRequest) -> OutgoingRequest {
        let credential = self.store.get();
        let mut decorated = request.clone();

        if let Some(user_id) = credential.user_id() {
            match HeaderValue::from_str(user_id) {
                Ok(value) => {
                    decorated.headers.insert(USER_ID_HEADER, value);
                }
                Err(_) => tracing::warn!("User id is not a valid header value, omitting it"),
            }
        }

        if let Some(token) = credential.access_token() {
            match HeaderValue::from_str(&format!("Bearer {}", token)) {
                Ok(mut value) => {
                    value.set_sensitive(true);
                    decorated.headers.insert(AUTHORIZATION, value);
                }
                Err(_) => tracing::warn!("Access token is not a valid header value, omitting it"),
            }
        }

        decorated
    }
}
