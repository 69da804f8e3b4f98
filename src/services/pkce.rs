// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! PKCE (RFC 7636) verifier/challenge generation and OAuth state handling.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use ring::rand::{SecureRandom, SystemRandom};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

/// Random bytes behind a verifier; encodes to 43 characters.
const VERIFIER_BYTES: usize = 32;
const STATE_BYTES: usize = 16;

pub const CHALLENGE_METHOD: &str = "S256";

/// Code verifier and its S256 challenge.
#[derive(Clone, PartialEq, Eq)]
pub struct PkcePair {
    verifier: String,
    challenge: String,
}

impl PkcePair {
    /// Generate a fresh random verifier.
    pub fn generate() -> anyhow::Result<Self> {
        Ok(Self::from_verifier(random_urlsafe(VERIFIER_BYTES)?))
    }

    pub fn from_verifier(verifier: impl Into<String>) -> Self {
        let verifier = verifier.into();
        let challenge = challenge_for(&verifier);
        Self {
            verifier,
            challenge,
        }
    }

    pub fn verifier(&self) -> &str {
        &self.verifier
    }

    pub fn challenge(&self) -> &str {
        &self.challenge
    }
}

impl std::fmt::Debug for PkcePair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PkcePair")
            .field("verifier", &"<redacted>")
            .field("challenge", &self.challenge)
            .finish()
    }
}

/// `BASE64URL(SHA256(verifier))` without padding.
pub fn challenge_for(verifier: &str) -> String {
    URL_SAFE_NO_PAD.encode(Sha256::digest(verifier.as_bytes()))
}

/// New random value for the OAuth `state` parameter.
pub fn new_state() -> anyhow::Result<String> {
    random_urlsafe(STATE_BYTES)
}

/// Compare the `state` returned by the authorization server in constant time.
pub fn states_match(expected: &str, received: &str) -> bool {
    expected.as_bytes().ct_eq(received.as_bytes()).into()
}

fn random_urlsafe(len: usize) -> anyhow::Result<String> {
    let mut bytes = vec![0u8; len];
    SystemRandom::new()
        .fill(&mut bytes)
        .map_err(|_| anyhow::anyhow!("system random source unavailable"))?;
    Ok(URL_SAFE_NO_PAD.encode(&bytes))
}
