// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Loopback listener for the OAuth redirect.
//!
//! Serves the redirect URI's path on its host and port until the first
//! callback arrives, then shuts down.

use crate::error::{ClientError, Result};
use crate::services::session::AuthorizationCallback;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::Html,
    routing::get,
    Router,
};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

type CallbackSlot = Arc<Mutex<Option<oneshot::Sender<AuthorizationCallback>>>>;

/// Bound, not yet serving, callback listener.
pub struct CallbackListener {
    listener: TcpListener,
    path: String,
}

impl CallbackListener {
    /// Bind to the host and port of `redirect_uri`.
    pub async fn bind(redirect_uri: &str) -> Result<Self> {
        let url = reqwest::Url::parse(redirect_uri)
            .map_err(|e| ClientError::OAuth(format!("invalid redirect URI {}: {}", redirect_uri, e)))?;

        let host = url
            .host_str()
            .ok_or_else(|| ClientError::OAuth(format!("redirect URI has no host: {}", redirect_uri)))?
            .trim_start_matches('[')
            .trim_end_matches(']')
            .to_string();
        let port = url
            .port_or_known_default()
            .ok_or_else(|| ClientError::OAuth(format!("redirect URI has no port: {}", redirect_uri)))?;

        let listener = TcpListener::bind((host.as_str(), port)).await.map_err(|e| {
            ClientError::OAuth(format!("cannot listen on {}:{}: {}", host, port, e))
        })?;

        tracing::debug!(host = %host, port, path = url.path(), "Listening for OAuth callback");

        Ok(Self {
            listener,
            path: url.path().to_string(),
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.listener
            .local_addr()
            .map_err(|e| ClientError::Internal(e.into()))
    }

    /// Serve until the first callback or until `timeout` elapses.
    pub async fn wait(self, timeout: Duration) -> Result<AuthorizationCallback> {
        let (callback_tx, callback_rx) = oneshot::channel();
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let app = callback_router(&self.path, callback_tx);

        let server = tokio::spawn(async move {
            axum::serve(self.listener, app)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await
        });

        let outcome = tokio::time::timeout(timeout, callback_rx).await;

        let _ = shutdown_tx.send(());
        if tokio::time::timeout(SHUTDOWN_GRACE, server).await.is_err() {
            tracing::debug!("Callback listener did not stop in time");
        }

        match outcome {
            Ok(Ok(callback)) => Ok(callback),
            Ok(Err(_)) => Err(ClientError::OAuth(
                "callback listener stopped before a callback arrived".to_string(),
            )),
            Err(_) => Err(ClientError::OAuth(
                "timed out waiting for the authorization callback".to_string(),
            )),
        }
    }
}

/// Router answering the redirect at `path` and forwarding the first callback to `tx`.
pub fn callback_router(path: &str, tx: oneshot::Sender<AuthorizationCallback>) -> Router {
    let slot: CallbackSlot = Arc::new(Mutex::new(Some(tx)));

    Router::new()
        .route(path, get(handle_callback))
        .with_state(slot)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::DEBUG))
                .on_response(DefaultOnResponse::new().level(Level::DEBUG)),
        )
}

async fn handle_callback(
    State(slot): State<CallbackSlot>,
    Query(params): Query<AuthorizationCallback>,
) -> (StatusCode, Html<&'static str>) {
    let failed = params.error.is_some();
    if params.code.is_none() && !failed {
        // Stray or prefetch hit; keep waiting for the real redirect.
        return (
            StatusCode::BAD_REQUEST,
            Html("<h1>Waiting for sign-in</h1><p>Complete sign-in in the browser.</p>"),
        );
    }

    let sender = slot.lock().unwrap_or_else(|e| e.into_inner()).take();

    let Some(sender) = sender else {
        return (
            StatusCode::CONFLICT,
            Html("<h1>Sign-in already handled</h1><p>You can close this window.</p>"),
        );
    };

    if sender.send(params).is_err() {
        return (
            StatusCode::GONE,
            Html("<h1>Sign-in expired</h1><p>Run <code>fittrack login</code> again.</p>"),
        );
    }

    if failed {
        (
            StatusCode::OK,
            Html("<h1>Sign-in failed</h1><p>Return to the terminal for details.</p>"),
        )
    } else {
        (
            StatusCode::OK,
            Html("<h1>Signed in to FitTrack</h1><p>You can close this window.</p>"),
        )
    }
}
