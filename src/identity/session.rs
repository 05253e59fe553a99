use std::collections::HashMap;
use std::time::Duration;

use anyhow::{anyhow, Result};
use base64::Engine;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::debug;

pub type SessionToken = String;

/// Authentication state of one request as seen by the admin gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Loading,
    Unauthenticated,
    Authenticated { email: String, strapi_jwt: Option<String> },
}

impl SessionState {
    pub fn authenticated<S: Into<String>>(email: S, strapi_jwt: Option<String>) -> Self {
        SessionState::Authenticated { email: email.into(), strapi_jwt }
    }

    pub fn email(&self) -> Option<&str> {
        match self {
            SessionState::Authenticated { email, .. } => Some(email.as_str()),
            _ => None,
        }
    }

    pub fn strapi_jwt(&self) -> Option<&str> {
        match self {
            SessionState::Authenticated { strapi_jwt, .. } => strapi_jwt.as_deref(),
            _ => None,
        }
    }

    /// Wire shape served by `/api/auth/session`.
    pub fn to_payload(&self) -> SessionPayload {
        match self {
            SessionState::Loading => SessionPayload { status: "loading".into(), user: None, strapi_jwt: None },
            SessionState::Unauthenticated => SessionPayload { status: "unauthenticated".into(), user: None, strapi_jwt: None },
            SessionState::Authenticated { email, strapi_jwt } => SessionPayload {
                status: "authenticated".into(),
                user: Some(SessionUser { email: email.clone() }),
                strapi_jwt: strapi_jwt.clone(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionPayload {
    pub status: String,
    pub user: Option<SessionUser>,
    #[serde(rename = "strapiJwt", default, skip_serializing_if = "Option::is_none")]
    pub strapi_jwt: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Session {
    pub session_id: String,
    pub token: SessionToken,
    pub email: String,
    pub strapi_jwt: Option<String>,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn state(&self) -> SessionState {
        SessionState::authenticated(self.email.clone(), self.strapi_jwt.clone())
    }
}

fn gen_id() -> Result<String> {
    // 256-bit random token, base64url without padding
    let mut buf = [0u8; 32];
    getrandom::getrandom(&mut buf).map_err(|e| anyhow!("session token generation failed: {}", e))?;
    Ok(base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(buf))
}

/// In-process session table keyed by cookie token.
pub struct SessionStore {
    pub ttl: Duration,
    sessions: RwLock<HashMap<SessionToken, Session>>,
}

impl Default for SessionStore {
    fn default() -> Self { Self::new(Duration::from_secs(60 * 60)) }
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self { ttl, sessions: RwLock::new(HashMap::new()) }
    }

    /// Fails only when the OS random source is unavailable.
    pub fn issue(&self, email: &str, strapi_jwt: Option<String>) -> Result<Session> {
        let now = Utc::now();
        let ttl = chrono::Duration::from_std(self.ttl).unwrap_or_else(|_| chrono::Duration::hours(1));
        let sess = Session {
            session_id: gen_id()?,
            token: gen_id()?,
            email: email.trim().to_string(),
            strapi_jwt,
            issued_at: now,
            expires_at: now + ttl,
        };
        self.sessions.write().insert(sess.token.clone(), sess.clone());
        debug!(target: "atlas::session", "session.issue email={} sid={} ttl_secs={}", sess.email, sess.session_id, self.ttl.as_secs());
        Ok(sess)
    }

    /// Live session for a token; expired entries are dropped on sight.
    pub fn validate(&self, token: &str) -> Option<Session> {
        let now = Utc::now();
        let expired = {
            let map = self.sessions.read();
            match map.get(token) {
                Some(s) if s.expires_at > now => return Some(s.clone()),
                Some(_) => true,
                None => false,
            }
        };
        if expired {
            self.sessions.write().remove(token);
        }
        None
    }

    pub fn revoke(&self, token: &str) -> bool {
        let removed = self.sessions.write().remove(token);
        if let Some(s) = &removed {
            debug!(target: "atlas::session", "session.revoke email={} sid={}", s.email, s.session_id);
        }
        removed.is_some()
    }

    pub fn purge_expired(&self) -> usize {
        let now = Utc::now();
        let mut map = self.sessions.write();
        let before = map.len();
        map.retain(|_, s| s.expires_at > now);
        before - map.len()
    }

    pub fn len(&self) -> usize { self.sessions.read().len() }

    pub fn is_empty(&self) -> bool { self.len() == 0 }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issue_then_validate() {
        let store = SessionStore::default();
        let s = store.issue(" editor@atlas.test ", Some("jwt-1".into())).unwrap();
        assert_eq!(s.email, "editor@atlas.test");
        let v = store.validate(&s.token).expect("live session");
        assert_eq!(v.session_id, s.session_id);
        assert_eq!(v.state(), SessionState::authenticated("editor@atlas.test", Some("jwt-1".into())));
    }

    #[test]
    fn tokens_are_full_width_random() {
        let store = SessionStore::default();
        let s = store.issue("a@x.com", None).unwrap();
        let raw = base64::engine::general_purpose::URL_SAFE_NO_PAD.decode(&s.token).unwrap();
        assert_eq!(raw.len(), 32);
        assert!(raw.iter().any(|b| *b != 0));
        assert_ne!(s.token, s.session_id);
    }

    #[test]
    fn tokens_are_unique() {
        let store = SessionStore::default();
        let a = store.issue("a@x.com", None).unwrap();
        let b = store.issue("a@x.com", None).unwrap();
        assert_ne!(a.token, b.token);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn expired_sessions_are_rejected_and_purged() {
        let store = SessionStore::new(Duration::from_secs(0));
        let s = store.issue("a@x.com", None).unwrap();
        assert!(store.validate(&s.token).is_none());
        assert!(store.is_empty());

        let s2 = store.issue("b@x.com", None).unwrap();
        assert_eq!(store.purge_expired(), 1);
        assert!(store.validate(&s2.token).is_none());
    }

    #[test]
    fn revoke_removes() {
        let store = SessionStore::default();
        let s = store.issue("a@x.com", None).unwrap();
        assert!(store.revoke(&s.token));
        assert!(!store.revoke(&s.token));
        assert!(store.validate(&s.token).is_none());
    }

    #[test]
    fn payload_shape() {
        let v = serde_json::to_value(SessionState::authenticated("a@x.com", Some("t".into())).to_payload()).unwrap();
        assert_eq!(v, serde_json::json!({"status":"authenticated","user":{"email":"a@x.com"},"strapiJwt":"t"}));
        let v = serde_json::to_value(SessionState::Unauthenticated.to_payload()).unwrap();
        assert_eq!(v, serde_json::json!({"status":"unauthenticated","user":null}));
    }
}
