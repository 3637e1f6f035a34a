//! Authenticated session returned by account creation or login.

use std::sync::Mutex;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::api::AuthResponse;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Session I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Session serialization error: {0}")]
    Serde(String),
}

/// Claims read from the token payload. Nothing here is verified.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenClaims {
    #[serde(default)]
    pub sub: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub exp: Option<i64>,
}

impl TokenClaims {
    pub fn user_id(&self) -> Option<Uuid> {
        self.user_id
            .as_deref()
            .and_then(|raw| Uuid::parse_str(raw).ok())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    token: String,
    #[serde(default)]
    username: Option<String>,
    #[serde(default)]
    email: Option<String>,
}

impl Session {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            username: None,
            email: None,
        }
    }

    pub fn with_user(mut self, username: Option<String>, email: Option<String>) -> Self {
        self.username = username;
        self.email = email;
        self
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.token)
    }

    /// Decodes the JWT payload segment, if the token has one.
    pub fn claims(&self) -> Option<TokenClaims> {
        let payload = self.token.split('.').nth(1)?;
        let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('=')).ok()?;
        serde_json::from_slice(&bytes).ok()
    }

    /// A token without a readable `exp` is treated as expired.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        match self.claims().and_then(|claims| claims.exp) {
            Some(exp) => exp <= now.timestamp(),
            None => true,
        }
    }
}

impl From<AuthResponse> for Session {
    fn from(response: AuthResponse) -> Self {
        Session::new(response.token).with_user(response.username, response.email)
    }
}

/// Where the current session lives between runs.
pub trait SessionStore {
    fn save(&self, session: &Session) -> Result<(), SessionError>;
    fn load(&self) -> Result<Option<Session>, SessionError>;
    fn clear(&self) -> Result<(), SessionError>;
}

/// Process-local store, used when nothing should touch disk.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    slot: Mutex<Option<Session>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    fn save(&self, session: &Session) -> Result<(), SessionError> {
        let mut slot = self.slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        *slot = Some(session.clone());
        Ok(())
    }

    fn load(&self) -> Result<Option<Session>, SessionError> {
        let slot = self.slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        Ok(slot.clone())
    }

    fn clear(&self) -> Result<(), SessionError> {
        let mut slot = self.slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        *slot = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn token_with(payload: &str) -> String {
        format!("eyJhbGciOiJIUzI1NiJ9.{}.sig", URL_SAFE_NO_PAD.encode(payload))
    }

    #[test]
    fn reads_claims_from_payload() {
        let id = "7d9f0c1e-4b7a-4c3e-9a51-2f0e8f6b1c2d";
        let session = Session::new(token_with(&format!(
            r#"{{"sub":"bob@x.io","userId":"{id}","exp":1893456000}}"#
        )));
        let claims = session.claims().unwrap();
        assert_eq!(claims.sub.as_deref(), Some("bob@x.io"));
        assert_eq!(claims.user_id().unwrap().to_string(), id);
        assert!(!session.is_expired(Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap()));
        assert!(session.is_expired(Utc.with_ymd_and_hms(2031, 1, 1, 0, 0, 0).unwrap()));
    }

    #[test]
    fn opaque_token_counts_as_expired() {
        let session = Session::new("not-a-jwt");
        assert!(session.claims().is_none());
        assert!(session.is_expired(Utc::now()));
    }

    #[test]
    fn memory_store_round_trips() {
        let store = MemorySessionStore::new();
        assert!(store.load().unwrap().is_none());
        store.save(&Session::new("abc")).unwrap();
        assert_eq!(store.load().unwrap().unwrap().token(), "abc");
        store.clear().unwrap();
        assert!(store.load().unwrap().is_none());
    }
}
