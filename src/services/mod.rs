// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - credential storage, API access and session lifecycle.

pub mod api;
pub mod credential_store;
pub mod pkce;
pub mod session;

pub use api::ApiClient;
pub use credential_store::{CredentialBackend, CredentialStore, FileBackend, MemoryBackend};
pub use session::{AuthorizationCallback, PendingLogin, SessionController, SessionEvent};
