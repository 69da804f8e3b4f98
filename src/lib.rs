// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! FitTrack client: log workouts and read AI recommendations from the
//! FitTrack API.
//!
//! This crate provides the authenticated API access layer (credential store,
//! identity headers, typed API operations, OAuth2 PKCE session lifecycle)
//! and the `fittrack` command-line front end built on it.

pub mod cli;
pub mod config;
pub mod display;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use error::Result;
use services::{ApiClient, CredentialStore, SessionController};
use std::sync::Arc;

/// Shared client state: one credential store read by the API client and
/// written by the session controller.
pub struct AppState {
    pub config: Config,
    pub store: CredentialStore,
    pub session: Arc<SessionController>,
    pub api: ApiClient,
}

impl AppState {
    /// Wire up the client around an already-opened credential store.
    pub fn new(config: Config, store: CredentialStore) -> Result<Self> {
        let session = Arc::new(SessionController::new(&config, store.clone())?);
        let api = ApiClient::new(&config, store.clone())?;
        Ok(Self {
            config,
            store,
            session,
            api,
        })
    }

    /// Load configuration from the environment and wire up the client.
    pub fn from_env() -> Result<Self> {
        Self::from_config(Config::from_env()?)
    }

    /// Wire up the client with the file-backed store named in `config`.
    pub fn from_config(config: Config) -> Result<Self> {
        let store = CredentialStore::file(config.credentials_path.clone());
        Self::new(config, store)
    }
}
