use std::sync::Arc;

use tracing::debug;

use super::session::SessionState;
use crate::locale::Locale;

/// Environment variable holding a comma-separated list of admin emails.
pub const ADMIN_EMAILS_ENV: &str = "ADMIN_EMAILS";

/// Used when no override is configured.
pub const DEFAULT_ADMIN_EMAIL: &str = "admin@serviceatlas.io";

/// Trim and lower-case an email for comparison.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Emails allowed into the admin UI. Entries are normalized, unique and keep their
/// configured order. Never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminAllowList {
    entries: Vec<String>,
}

impl Default for AdminAllowList {
    fn default() -> Self {
        Self { entries: vec![DEFAULT_ADMIN_EMAIL.to_string()] }
    }
}

impl AdminAllowList {
    /// Build from an optional override string. Entries are split on commas, trimmed and
    /// lower-cased; empty entries are dropped. An absent override, or one that yields no
    /// entries, gives the built-in default.
    pub fn from_override(raw: Option<&str>) -> Self {
        let Some(raw) = raw else { return Self::default(); };
        let mut entries: Vec<String> = Vec::new();
        for part in raw.split(',') {
            let e = normalize_email(part);
            if e.is_empty() || entries.contains(&e) { continue; }
            entries.push(e);
        }
        if entries.is_empty() { return Self::default(); }
        Self { entries }
    }

    /// Read `ADMIN_EMAILS` from the process environment.
    pub fn from_env() -> Self {
        Self::from_override(std::env::var(ADMIN_EMAILS_ENV).ok().as_deref())
    }

    pub fn contains(&self, email: &str) -> bool {
        let e = normalize_email(email);
        !e.is_empty() && self.entries.iter().any(|a| *a == e)
    }

    pub fn entries(&self) -> &[String] { &self.entries }
}

/// Outcome of the admin route guard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    Permit,
    /// Session not settled yet; neither render admin content nor redirect.
    Pending,
    RedirectTo(String),
}

/// Locale-scoped sign-in page.
pub fn sign_in_path(locale: Locale) -> String {
    format!("/{}/auth/signin", locale)
}

/// Only same-site absolute paths are accepted as post-login destinations. Browsers drop
/// tabs and newlines from URLs, so control characters are rejected along with `//` and `\`.
pub fn safe_callback(url: Option<&str>) -> Option<&str> {
    url.map(str::trim).filter(|u| {
        u.starts_with('/') && !u.starts_with("//") && !u.contains('\\') && !u.chars().any(char::is_control)
    })
}

/// Decides admin access from already-resolved session state.
#[derive(Debug, Clone)]
pub struct AdminGate {
    allow_list: Arc<AdminAllowList>,
}

impl AdminGate {
    pub fn new(allow_list: Arc<AdminAllowList>) -> Self { Self { allow_list } }

    pub fn is_authorized(&self, session: &SessionState) -> bool {
        let ok = match session {
            SessionState::Loading | SessionState::Unauthenticated => false,
            SessionState::Authenticated { email, .. } => self.allow_list.contains(email),
        };
        debug!(target: "atlas::gate", "admin.is_authorized email={:?} -> {}", session.email(), ok);
        ok
    }

    /// Route-level check: only session presence matters here. An authenticated caller who is
    /// not on the allow-list is permitted through and denied by the page via `is_authorized`.
    /// `return_to` is carried to the sign-in page as `callbackUrl`.
    pub fn guard(&self, session: &SessionState, locale: Locale, return_to: Option<&str>) -> GuardDecision {
        match session {
            SessionState::Authenticated { .. } => GuardDecision::Permit,
            SessionState::Loading => GuardDecision::Pending,
            SessionState::Unauthenticated => {
                let mut to = sign_in_path(locale);
                if let Some(back) = safe_callback(return_to) {
                    to.push_str("?callbackUrl=");
                    to.push_str(&urlencoding::encode(back));
                }
                GuardDecision::RedirectTo(to)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gate(list: &str) -> AdminGate {
        AdminGate::new(Arc::new(AdminAllowList::from_override(Some(list))))
    }

    #[test]
    fn override_is_trimmed_and_filtered() {
        let l = AdminAllowList::from_override(Some("a@x.com, b@y.com ,"));
        assert_eq!(l.entries(), &["a@x.com".to_string(), "b@y.com".to_string()]);
    }

    #[test]
    fn missing_or_empty_override_uses_default() {
        assert_eq!(AdminAllowList::from_override(None).entries(), &[DEFAULT_ADMIN_EMAIL.to_string()]);
        assert_eq!(AdminAllowList::from_override(Some("")).entries(), &[DEFAULT_ADMIN_EMAIL.to_string()]);
        assert_eq!(AdminAllowList::from_override(Some(" , ,")).entries(), &[DEFAULT_ADMIN_EMAIL.to_string()]);
    }

    #[test]
    fn override_entries_are_normalized_and_unique() {
        let l = AdminAllowList::from_override(Some("Ops@Atlas.IO,ops@atlas.io, b@y.com"));
        assert_eq!(l.entries(), &["ops@atlas.io".to_string(), "b@y.com".to_string()]);
        assert!(l.contains("OPS@atlas.io"));
    }

    #[test]
    fn loading_and_unauthenticated_are_never_authorized() {
        let g = gate("a@x.com");
        assert!(!g.is_authorized(&SessionState::Loading));
        assert!(!g.is_authorized(&SessionState::Unauthenticated));
    }

    #[test]
    fn membership_is_case_insensitive() {
        let g = gate("a@x.com");
        assert!(g.is_authorized(&SessionState::authenticated("A@X.com", None)));
        assert!(g.is_authorized(&SessionState::authenticated(" a@x.com ", Some("jwt".into()))));
        assert!(!g.is_authorized(&SessionState::authenticated("b@x.com", None)));
        assert!(!g.is_authorized(&SessionState::authenticated("", None)));
    }

    #[test]
    fn guard_redirects_only_without_session() {
        let g = gate("a@x.com");
        assert_eq!(g.guard(&SessionState::Unauthenticated, Locale::De, None), GuardDecision::RedirectTo("/de/auth/signin".into()));
        assert_eq!(g.guard(&SessionState::Loading, Locale::En, None), GuardDecision::Pending);
        assert_eq!(g.guard(&SessionState::authenticated("nobody@x.com", None), Locale::En, None), GuardDecision::Permit);
    }

    #[test]
    fn guard_carries_local_callback_only() {
        let g = gate("a@x.com");
        assert_eq!(
            g.guard(&SessionState::Unauthenticated, Locale::En, Some("/en/admin/tags")),
            GuardDecision::RedirectTo("/en/auth/signin?callbackUrl=%2Fen%2Fadmin%2Ftags".into())
        );
        assert_eq!(
            g.guard(&SessionState::Unauthenticated, Locale::En, Some("//evil.example")),
            GuardDecision::RedirectTo("/en/auth/signin".into())
        );
        for bad in ["/\\evil.example", "/\t/evil.example"] {
            assert_eq!(
                g.guard(&SessionState::Unauthenticated, Locale::En, Some(bad)),
                GuardDecision::RedirectTo("/en/auth/signin".into()),
                "{:?}", bad
            );
        }
    }

    #[test]
    fn callback_must_be_local_path() {
        assert_eq!(safe_callback(Some("/en/admin/tags")), Some("/en/admin/tags"));
        assert_eq!(safe_callback(Some("/de/admin?x=1")), Some("/de/admin?x=1"));
        assert_eq!(safe_callback(Some("//evil.example/x")), None);
        assert_eq!(safe_callback(Some("https://evil.example")), None);
        assert_eq!(safe_callback(Some("/\\evil")), None);
        assert_eq!(safe_callback(Some("/\t/evil.example")), None);
        assert_eq!(safe_callback(Some("/\n/evil.example")), None);
        assert_eq!(safe_callback(Some("/\r\n/evil.example")), None);
        assert_eq!(safe_callback(None), None);
    }
}
