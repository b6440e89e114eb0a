use chrono::Utc;
use parking_lot::Mutex;

use super::token::BearerToken;
use super::types::TokenState;
use crate::error::Result;

/// Token manager
/// Holds the current bearer token and serializes every refresh, so concurrent
/// callers never race into two acquisitions or observe a half-replaced token
#[derive(Debug, Default)]
pub struct TokenManager {
    token: Mutex<BearerToken>,
}

impl TokenManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the currently held token
    pub fn snapshot(&self) -> BearerToken {
        self.token.lock().clone()
    }

    pub fn state(&self) -> TokenState {
        self.token.lock().state(Utc::now())
    }

    /// Drop the held token
    pub fn clear(&self) {
        *self.token.lock() = BearerToken::default();
    }

    /// Unconditionally fetch a new token and store it.
    /// On failure the previously held token is left untouched.
    pub fn refresh<F>(&self, fetch: F) -> Result<()>
    where
        F: FnOnce() -> Result<BearerToken>,
    {
        let mut token = self.token.lock();
        *token = fetch()?;
        Ok(())
    }

    /// Authorization header value for a valid token, fetching at most once
    pub fn authorization<F>(&self, fetch: F) -> Result<String>
    where
        F: FnOnce() -> Result<BearerToken>,
    {
        let mut token = self.token.lock();

        let state = token.state(Utc::now());
        if state != TokenState::Valid {
            tracing::debug!(state = ?state, "Token not valid, acquiring a new one");
            *token = fetch()?;
        }

        Ok(token.authorization())
    }
}
