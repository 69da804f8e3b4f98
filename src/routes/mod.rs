// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! HTTP route handlers served by the client itself (OAuth redirect).

pub mod callback;

pub use callback::{callback_router, CallbackListener};
