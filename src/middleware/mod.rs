// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Request middleware (identity headers).

pub mod identity;

pub use identity::{OutgoingRequest, RequestDecorator, USER_ID_HEADER};
