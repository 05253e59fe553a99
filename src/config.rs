//! Process configuration read from environment variables.
//! CLI flags in the binary override the values loaded here.

use std::time::Duration;

use crate::content::{ContentConfig, DEFAULT_PUBLIC_URL};
use crate::identity::{AdminAllowList, ADMIN_EMAILS_ENV};

pub const HTTP_PORT_ENV: &str = "ATLAS_HTTP_PORT";
pub const BIND_ENV: &str = "ATLAS_BIND";
pub const STRAPI_INTERNAL_URL_ENV: &str = "STRAPI_INTERNAL_URL";
pub const STRAPI_PUBLIC_URL_ENV: &str = "NEXT_PUBLIC_STRAPI_URL";
pub const SESSION_TTL_ENV: &str = "ATLAS_SESSION_TTL_SECS";
pub const SECURE_COOKIES_ENV: &str = "ATLAS_SECURE_COOKIES";

pub const DEFAULT_HTTP_PORT: u16 = 3000;
pub const DEFAULT_BIND: &str = "0.0.0.0";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub http_port: u16,
    pub bind: String,
    pub admin_allow_list: AdminAllowList,
    pub content: ContentConfig,
    pub session_ttl: Duration,
    pub secure_cookies: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            http_port: DEFAULT_HTTP_PORT,
            bind: DEFAULT_BIND.to_string(),
            admin_allow_list: AdminAllowList::default(),
            content: ContentConfig::default(),
            session_ttl: Duration::from_secs(60 * 60),
            secure_cookies: false,
        }
    }
}

pub fn parse_bool(v: &str) -> Option<bool> {
    match v.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    /// Build from an arbitrary key lookup. Unparseable values fall back to defaults.
    pub fn from_lookup<F: Fn(&str) -> Option<String>>(get: F) -> Self {
        let d = AppConfig::default();
        let http_port = get(HTTP_PORT_ENV).and_then(|v| v.trim().parse::<u16>().ok()).unwrap_or(d.http_port);
        let bind = get(BIND_ENV).filter(|v| !v.trim().is_empty()).unwrap_or(d.bind);
        let admin_allow_list = AdminAllowList::from_override(get(ADMIN_EMAILS_ENV).as_deref());
        let content = ContentConfig {
            internal_url: get(STRAPI_INTERNAL_URL_ENV).filter(|v| !v.trim().is_empty()),
            public_url: get(STRAPI_PUBLIC_URL_ENV)
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_PUBLIC_URL.to_string()),
            ..d.content
        };
        let session_ttl = get(SESSION_TTL_ENV)
            .and_then(|v| v.trim().parse::<u64>().ok())
            .filter(|s| *s > 0)
            .map(Duration::from_secs)
            .unwrap_or(d.session_ttl);
        let secure_cookies = get(SECURE_COOKIES_ENV).and_then(|v| parse_bool(&v)).unwrap_or(d.secure_cookies);
        Self { http_port, bind, admin_allow_list, content, session_ttl, secure_cookies }
    }
}
