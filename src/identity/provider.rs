use axum::http::{HeaderMap, HeaderValue};

use super::session::{SessionState, SessionStore};

pub const SESSION_COOKIE: &str = "atlas_session";

/// Supplies the session state of a request. The gate only ever sees the result.
pub trait SessionProvider: Send + Sync {
    fn session_state(&self, headers: &HeaderMap) -> SessionState;
}

impl SessionProvider for SessionStore {
    fn session_state(&self, headers: &HeaderMap) -> SessionState {
        let Some(token) = parse_cookie(headers, SESSION_COOKIE) else { return SessionState::Unauthenticated; };
        match self.validate(&token) {
            Some(s) => s.state(),
            None => SessionState::Unauthenticated,
        }
    }
}

/// Value of cookie `name`, looking through every `Cookie` header.
pub fn parse_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    for cookie in headers.get_all("cookie").iter() {
        let Ok(s) = cookie.to_str() else { continue; };
        for part in s.split(';') {
            let p = part.trim();
            if let Some((k, v)) = p.split_once('=') {
                if k.trim() == name { return Some(v.trim().to_string()); }
            }
        }
    }
    None
}

pub fn session_cookie(token: &str, max_age_secs: u64, secure: bool) -> HeaderValue {
    let attr = if secure { "; Secure" } else { "" };
    // Tokens are base64url so the header value is always valid
    HeaderValue::from_str(&format!("{}={}; HttpOnly; SameSite=Lax; Path=/; Max-Age={}{}", SESSION_COOKIE, token, max_age_secs, attr))
        .unwrap_or_else(|_| clear_session_cookie(secure))
}

pub fn clear_session_cookie(secure: bool) -> HeaderValue {
    let v = if secure {
        format!("{}=deleted; Expires=Thu, 01 Jan 1970 00:00:00 GMT; HttpOnly; SameSite=Lax; Path=/; Secure", SESSION_COOKIE)
    } else {
        format!("{}=deleted; Expires=Thu, 01 Jan 1970 00:00:00 GMT; HttpOnly; SameSite=Lax; Path=/", SESSION_COOKIE)
    };
    HeaderValue::from_str(&v).unwrap_or(HeaderValue::from_static(""))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers_with(cookie: &str) -> HeaderMap {
        let mut h = HeaderMap::new();
        h.insert("cookie", HeaderValue::from_str(cookie).unwrap());
        h
    }

    #[test]
    fn parse_cookie_finds_named_value() {
        let h = headers_with("NEXT_LOCALE=de; atlas_session=abc123; other=1");
        assert_eq!(parse_cookie(&h, SESSION_COOKIE), Some("abc123".into()));
        assert_eq!(parse_cookie(&h, "NEXT_LOCALE"), Some("de".into()));
        assert_eq!(parse_cookie(&h, "missing"), None);
    }

    #[test]
    fn store_resolves_cookie_to_state() {
        let store = SessionStore::default();
        let s = store.issue("a@x.com", Some("jwt".into())).unwrap();
        let h = headers_with(&format!("{}={}", SESSION_COOKIE, s.token));
        assert_eq!(store.session_state(&h), SessionState::authenticated("a@x.com", Some("jwt".into())));
        assert_eq!(store.session_state(&headers_with("atlas_session=bogus")), SessionState::Unauthenticated);
        assert_eq!(store.session_state(&HeaderMap::new()), SessionState::Unauthenticated);
    }

    #[test]
    fn cookie_attributes() {
        let v = session_cookie("tok", 60, true);
        let s = v.to_str().unwrap();
        assert!(s.starts_with("atlas_session=tok;"));
        assert!(s.contains("HttpOnly"));
        assert!(s.contains("Max-Age=60"));
        assert!(s.ends_with("Secure"));
        assert!(!clear_session_cookie(false).to_str().unwrap().contains("Secure"));
    }
}
