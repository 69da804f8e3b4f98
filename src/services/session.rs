// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! OAuth2 authorization-code + PKCE session lifecycle.
//!
//! The session controller is the only writer of the [`CredentialStore`].
//! Every credential change is written to the store first and then announced
//! to subscribers, so any API call issued after an event sees the new identity.

use crate::config::Config;
use crate::error::{ClientError, Result};
use crate::models::Credential;
use crate::routes::callback::CallbackListener;
use crate::services::pkce::{self, PkcePair};
use crate::services::CredentialStore;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use std::collections::HashSet;
use tokio::sync::{broadcast, Mutex};

/// Margin before token expiration when we proactively refresh (5 minutes).
const TOKEN_REFRESH_MARGIN_SECS: i64 = 5 * 60;

/// How long `login()` waits for the browser to come back.
pub const LOGIN_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(5 * 60);

const EVENT_CHANNEL_CAPACITY: usize = 16;

/// Credential lifecycle notifications.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// A credential was obtained by login or silent renewal.
    TokenRefreshed(Credential),
    /// The user signed out; the store is empty.
    LoggedOut,
    /// The refresh token is no longer accepted; the user must log in again.
    LoginRequired,
}

/// Query parameters the authorization server appends to the redirect URI.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct AuthorizationCallback {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub error_description: Option<String>,
}

/// A login started by [`SessionController::begin_login`], waiting for its callback.
#[derive(Debug)]
pub struct PendingLogin {
    authorize_url: String,
    state: String,
    pkce: PkcePair,
}

impl PendingLogin {
    /// URL the user must open to authenticate.
    pub fn authorize_url(&self) -> &str {
        &self.authorize_url
    }

    pub fn state(&self) -> &str {
        &self.state
    }
}

/// Token endpoint response.
#[derive(Debug, Clone, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    id_token: Option<String>,
}

/// The only claim we need from ID/access tokens.
#[derive(Debug, Deserialize)]
struct IdentityClaims {
    #[serde(default)]
    sub: Option<String>,
}

/// Drives login, silent refresh and logout, and owns writes to the credential store.
pub struct SessionController {
    http: reqwest::Client,
    client_id: String,
    authorization_endpoint: String,
    token_endpoint: String,
    end_session_endpoint: Option<String>,
    redirect_uri: String,
    scopes: String,
    store: CredentialStore,
    events: broadcast::Sender<SessionEvent>,
    /// Serializes refreshes (so concurrent callers trigger a single exchange)
    /// and orders logout after any refresh in flight.
    refresh_lock: Mutex<()>,
}

impl SessionController {
    pub fn new(config: &Config, store: CredentialStore) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .build()
            .map_err(|e| ClientError::Internal(anyhow::anyhow!("building OAuth HTTP client: {}", e)))?;

        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        Ok(Self {
            http,
            client_id: config.client_id.clone(),
            authorization_endpoint: config.authorization_endpoint.clone(),
            token_endpoint: config.token_endpoint.clone(),
            end_session_endpoint: config.end_session_endpoint.clone(),
            redirect_uri: config.redirect_uri.clone(),
            scopes: config.scopes.clone(),
            store,
            events,
            refresh_lock: Mutex::new(()),
        })
    }

    /// Subscribe to credential lifecycle events.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    // ─── Login ───────────────────────────────────────────────────────────────

    /// Interactive login: listen on the redirect URI, hand the authorization
    /// URL to `present`, and finish the exchange when the browser returns.
    pub async fn login<F: FnOnce(&str)>(&self, present: F) -> Result<Credential> {
        let pending = self.begin_login()?;

        // Bind before showing the URL so a fast redirect cannot miss us.
        let listener = CallbackListener::bind(&self.redirect_uri).await?;
        present(pending.authorize_url());

        let callback = listener.wait(LOGIN_TIMEOUT).await?;
        self.complete_login(pending, callback).await
    }

    /// Start an authorization-code + PKCE login.
    pub fn begin_login(&self) -> Result<PendingLogin> {
        let pkce = PkcePair::generate()?;
        let state = pkce::new_state()?;

        let separator = if self.authorization_endpoint.contains('?') {
            '&'
        } else {
            '?'
        };

        let authorize_url = format!(
            "{}{}response_type=code&\
             client_id={}&\
             redirect_uri={}&\
             scope={}&\
             state={}&\
             code_challenge={}&\
             code_challenge_method={}",
            self.authorization_endpoint,
            separator,
            urlencoding::encode(&self.client_id),
            urlencoding::encode(&self.redirect_uri),
            urlencoding::encode(&self.scopes),
            state,
            pkce.challenge(),
            pkce::CHALLENGE_METHOD,
        );

        tracing::info!(
            client_id = %self.client_id,
            redirect_uri = %self.redirect_uri,
            "Starting OAuth login"
        );

        Ok(PendingLogin {
            authorize_url,
            state,
            pkce,
        })
    }

    /// Finish a login with the parameters delivered to the redirect URI.
    pub async fn complete_login(
        &self,
        pending: PendingLogin,
        callback: AuthorizationCallback,
    ) -> Result<Credential> {
        if let Some(error) = callback.error {
            let description = callback.error_description.unwrap_or_default();
            tracing::warn!(error = %error, description = %description, "Authorization denied");
            return Err(ClientError::OAuth(format!(
                "authorization failed: {} {}",
                error, description
            )));
        }

        let state_ok = callback
            .state
            .as_deref()
            .is_some_and(|received| pkce::states_match(&pending.state, received));
        if !state_ok {
            tracing::warn!("OAuth state mismatch on callback");
            return Err(ClientError::OAuth("state mismatch".to_string()));
        }

        let code = callback
            .code
            .filter(|c| !c.is_empty())
            .ok_or_else(|| ClientError::OAuth("missing authorization code".to_string()))?;

        let tokens = self
            .token_request(&[
                ("grant_type", "authorization_code"),
                ("code", code.as_str()),
                ("redirect_uri", self.redirect_uri.as_str()),
                ("client_id", self.client_id.as_str()),
                ("code_verifier", pending.pkce.verifier()),
            ])
            .await?;

        let credential = credential_from(tokens, None, None)?;
        tracing::info!(
            user_id = credential.user_id().unwrap_or("<unknown>"),
            "OAuth login complete"
        );
        self.on_token_refreshed(credential.clone());
        Ok(credential)
    }

    // ─── Token Lifecycle ─────────────────────────────────────────────────────

    /// Record a new credential and notify subscribers.
    ///
    /// The store is written before the event goes out.
    pub fn on_token_refreshed(&self, credential: Credential) {
        self.store.set(credential.clone());
        // No subscribers is fine.
        let _ = self.events.send(SessionEvent::TokenRefreshed(credential));
    }

    /// Refresh the access token now.
    pub async fn refresh(&self) -> Result<Credential> {
        self.refresh_inner(true).await
    }

    /// Return a credential that is not about to expire, refreshing if needed.
    ///
    /// Signed-out sessions and tokens that cannot be refreshed are returned
    /// as-is; the server decides whether to accept them.
    pub async fn ensure_fresh(&self) -> Result<Credential> {
        let current = self.store.get();
        if !self.needs_refresh(&current) {
            return Ok(current);
        }
        self.refresh_inner(false).await
    }

    fn needs_refresh(&self, credential: &Credential) -> bool {
        credential.is_authenticated()
            && credential.refresh_token().is_some()
            && credential.expires_within(Utc::now(), Duration::seconds(TOKEN_REFRESH_MARGIN_SECS))
    }

    async fn refresh_inner(&self, force: bool) -> Result<Credential> {
        let _guard = self.refresh_lock.lock().await;

        // Another task may have refreshed while we were waiting.
        let current = self.store.get();
        if !force && !self.needs_refresh(&current) {
            return Ok(current);
        }

        let refresh_token = current
            .refresh_token()
            .map(str::to_string)
            .ok_or(ClientError::Unauthorized)?;

        let tokens = match self
            .token_request(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token.as_str()),
                ("client_id", self.client_id.as_str()),
            ])
            .await
        {
            Ok(tokens) => tokens,
            Err(e) if e.is_invalid_grant() => {
                tracing::info!("Refresh token rejected, login required");
                self.store.clear();
                let _ = self.events.send(SessionEvent::LoginRequired);
                return Err(e);
            }
            Err(e) => return Err(e),
        };

        let credential = credential_from(
            tokens,
            current.user_id().map(str::to_string),
            Some(refresh_token),
        )?;
        tracing::info!(
            user_id = credential.user_id().unwrap_or("<unknown>"),
            "Access token refreshed"
        );
        self.on_token_refreshed(credential.clone());
        Ok(credential)
    }

    // ─── Logout ──────────────────────────────────────────────────────────────

    /// Sign out locally, then end the server-side session if configured.
    ///
    /// The local credential is always cleared; a failing end-session call is
    /// only logged. A refresh already in flight finishes before the store is
    /// cleared, so it cannot sign the user back in.
    pub async fn logout(&self) {
        let previous = {
            let _guard = self.refresh_lock.lock().await;
            let previous = self.store.get();
            self.store.clear();
            let _ = self.events.send(SessionEvent::LoggedOut);
            previous
        };
        tracing::info!("Signed out");

        let (Some(endpoint), Some(refresh_token)) =
            (self.end_session_endpoint.as_deref(), previous.refresh_token())
        else {
            return;
        };

        let result = self
            .http
            .post(endpoint)
            .form(&[
                ("client_id", self.client_id.as_str()),
                ("refresh_token", refresh_token),
            ])
            .send()
            .await;

        match result {
            Ok(response) if response.status().is_success() => {
                tracing::info!("Server-side session ended");
            }
            Ok(response) => {
                tracing::warn!(status = %response.status(), "End-session request rejected");
            }
            Err(e) => {
                tracing::warn!(error = %e, "End-session request failed");
            }
        }
    }

    // ─── Token Endpoint ──────────────────────────────────────────────────────

    async fn token_request(&self, form: &[(&str, &str)]) -> Result<TokenResponse> {
        let response = self
            .http
            .post(&self.token_endpoint)
            .form(form)
            .send()
            .await
            .map_err(|e| ClientError::OAuth(format!("Token request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "Token endpoint rejected request");
            return Err(ClientError::OAuth(format!(
                "token endpoint returned {}: {}",
                status, body
            )));
        }

        response
            .json()
            .await
            .map_err(|e| ClientError::OAuth(format!("Failed to parse token response: {}", e)))
    }
}

/// Build a credential from a token response.
///
/// The user id comes from the ID token, then the access token, then the
/// previous credential.
fn credential_from(
    tokens: TokenResponse,
    previous_user_id: Option<String>,
    previous_refresh_token: Option<String>,
) -> Result<Credential> {
    let user_id = tokens
        .id_token
        .as_deref()
        .and_then(subject_from_jwt)
        .or_else(|| subject_from_jwt(&tokens.access_token))
        .or(previous_user_id);

    let expires_at = tokens
        .expires_in
        .filter(|secs| *secs > 0)
        .map(|secs| Utc::now() + Duration::seconds(secs));

    Ok(
        Credential::authenticated(tokens.access_token, user_id, expires_at)?
            .with_refresh_token(tokens.refresh_token.or(previous_refresh_token)),
    )
}

/// Read the `sub` claim of a JWT without verifying it.
///
/// The token came straight from the token endpoint over TLS; the API server
/// does the real verification.
fn subject_from_jwt(token: &str) -> Option<String> {
    let mut validation = Validation::new(Algorithm::RS256);
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.validate_aud = false;
    validation.required_spec_claims = HashSet::new();

    decode::<IdentityClaims>(token, &DecodingKey::from_secret(&[]), &validation)
        .ok()
        .and_then(|data| data.claims.sub)
        .filter(|sub| !sub.is_empty())
}
