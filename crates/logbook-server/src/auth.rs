//! API-key authentication for the `/log` routes.
//!
//! Keys are held only as blake3 hashes and compared in constant time.
//! Clients present a key either as `Authorization: Bearer <key>` or in the
//! `X-API-Key` header. With no keys configured every request passes.

use std::fmt;
use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::Response;
use logbook_core::LogError;
use subtle::ConstantTimeEq;
use tracing::debug;

use crate::error::ApiError;
use crate::state::AppState;

/// Header carrying a bare API key.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Hash of an accepted API key.
#[derive(Clone)]
struct KeyHash([u8; 32]);

impl KeyHash {
    fn from_key(key: &str) -> Self {
        Self(*blake3::hash(key.as_bytes()).as_bytes())
    }

    fn verify(&self, key: &str) -> bool {
        let other = blake3::hash(key.as_bytes());
        self.0.as_slice().ct_eq(other.as_bytes().as_slice()).into()
    }
}

/// The set of API keys the server accepts.
#[derive(Clone, Default)]
pub struct ApiKeys {
    hashes: Vec<KeyHash>,
}

impl ApiKeys {
    /// Builds the set from plaintext keys.
    #[must_use]
    pub fn new<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            hashes: keys
                .into_iter()
                .map(|k| KeyHash::from_key(k.as_ref()))
                .collect(),
        }
    }

    /// Returns true if authentication is switched on.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        !self.hashes.is_empty()
    }

    /// Returns the number of accepted keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.hashes.len()
    }

    /// Returns true if no keys are configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.hashes.is_empty()
    }

    /// Checks a presented key against every accepted key.
    ///
    /// All hashes are compared so the time taken does not depend on which
    /// key matched.
    #[must_use]
    pub fn verify(&self, key: &str) -> bool {
        self.hashes
            .iter()
            .fold(false, |matched, hash| hash.verify(key) | matched)
    }

    /// Authorizes a request by its headers.
    ///
    /// # Errors
    ///
    /// Returns [`LogError::Unauthorized`] if keys are configured and the
    /// headers carry none of them.
    pub fn authorize(&self, headers: &HeaderMap) -> Result<(), LogError> {
        if !self.is_enabled() {
            return Ok(());
        }

        match presented_key(headers) {
            Some(key) if self.verify(key) => Ok(()),
            Some(_) => {
                debug!("API key rejected");
                Err(LogError::Unauthorized)
            }
            None => {
                debug!("API key missing");
                Err(LogError::Unauthorized)
            }
        }
    }
}

impl fmt::Debug for ApiKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiKeys")
            .field("keys", &self.hashes.len())
            .finish()
    }
}

/// Extracts the key a client presented, if any.
fn presented_key(headers: &HeaderMap) -> Option<&str> {
    if let Some(value) = headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok()) {
        if let Some(token) = value.strip_prefix("Bearer ") {
            let token = token.trim();
            if !token.is_empty() {
                return Some(token);
            }
        }
    }

    headers
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|k| !k.is_empty())
}

/// Middleware rejecting requests without a valid API key.
pub async fn require_api_key(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    state.api_keys().authorize(request.headers())?;
    Ok(next.run(request).await)
}
