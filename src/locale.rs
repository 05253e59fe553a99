//!
//! Locale resolution
//! -----------------
//! Every page request is served under an explicit locale prefix (`/en/...`, `/de/...`).
//! `LocaleResolver::resolve` decides, for a request path and an optional candidate locale,
//! which locale to serve and whether the client has to be redirected to the prefixed path.
//! API routes, framework assets and anything that looks like a static file bypass the
//! resolver entirely.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Cookie remembering the last locale a visitor was served.
pub const LOCALE_COOKIE: &str = "NEXT_LOCALE";

/// Paths matching this pattern are never rewritten.
static EXCLUDED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^/(api|_next|_vercel|.*\..*)").expect("static exclusion pattern")
});

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    En,
    De,
}

/// All supported locales, default first.
pub const LOCALES: &[Locale] = &[Locale::En, Locale::De];

impl Locale {
    pub const fn as_str(self) -> &'static str {
        match self {
            Locale::En => "en",
            Locale::De => "de",
        }
    }

    /// Parse a locale tag, case-insensitive and tolerant of region subtags (`de-AT`, `en_GB`).
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        if value.is_empty() { return None; }
        let lang = value.split(['-', '_']).next().unwrap_or("").to_ascii_lowercase();
        match lang.as_str() {
            "en" => Some(Locale::En),
            "de" => Some(Locale::De),
            _ => None,
        }
    }

    /// Exact match of a path segment against a supported locale.
    /// Unlike `parse`, `/de-at/...` is not treated as locale-prefixed.
    pub fn from_segment(segment: &str) -> Option<Self> {
        LOCALES.iter().copied().find(|l| l.as_str() == segment)
    }
}

impl Display for Locale {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// True when the path is an API route, a framework asset or a static file.
pub fn is_excluded(path: &str) -> bool {
    EXCLUDED.is_match(path)
}

/// Split a path into its locale prefix (if it carries a supported one) and the remainder.
/// `/de/admin/tags` → `(Some(De), "/admin/tags")`, `/de` → `(Some(De), "/")`.
pub fn split_locale_prefix(path: &str) -> (Option<Locale>, &str) {
    let trimmed = path.strip_prefix('/').unwrap_or(path);
    let (first, rest) = match trimmed.find('/') {
        Some(i) => (&trimmed[..i], &trimmed[i..]),
        None => (trimmed, "/"),
    };
    match Locale::from_segment(first) {
        Some(l) => (Some(l), rest),
        None => (None, path),
    }
}

/// Pick a candidate locale from the sources a request offers, highest priority first:
/// the path prefix, the locale cookie, then the `Accept-Language` header.
/// The cookie is only honoured when it holds an exact locale code (it is written by this
/// server). Header tags may carry region subtags and are returned as canonical codes.
pub fn candidate_locale(path: &str, cookie: Option<&str>, accept_language: Option<&str>) -> Option<String> {
    if let (Some(l), _) = split_locale_prefix(path) {
        return Some(l.as_str().to_string());
    }
    if let Some(l) = cookie.map(str::trim).and_then(Locale::from_segment) {
        return Some(l.as_str().to_string());
    }
    accept_language.and_then(preferred_from_accept_language).map(|l| l.as_str().to_string())
}

/// First supported language of an `Accept-Language` header, honouring q-values.
/// Entries with `q=0` are never selected.
pub fn preferred_from_accept_language(header: &str) -> Option<Locale> {
    let mut ranked: Vec<(f32, usize, Locale)> = Vec::new();
    for (idx, part) in header.split(',').enumerate() {
        let mut pieces = part.split(';');
        let tag = pieces.next().unwrap_or("").trim();
        let mut q = 1.0f32;
        for p in pieces {
            if let Some(v) = p.trim().strip_prefix("q=") {
                q = v.trim().parse::<f32>().unwrap_or(0.0);
            }
        }
        if q <= 0.0 { continue; }
        if let Some(l) = Locale::parse(tag) {
            ranked.push((q, idx, l));
        }
    }
    // Highest q wins; ties keep header order
    ranked.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal).then(a.1.cmp(&b.1)));
    ranked.first().map(|(_, _, l)| *l)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    pub locale: Locale,
    /// Path carrying an explicit locale prefix as its first segment.
    pub rewritten_path: String,
    /// True when the client must be sent to `rewritten_path`.
    pub redirect: bool,
}

/// Stateless locale routing policy ("always prefix").
#[derive(Debug, Clone, Copy, Default)]
pub struct LocaleResolver {
    pub default_locale: Locale,
}

impl LocaleResolver {
    pub fn new(default_locale: Locale) -> Self { Self { default_locale } }

    /// Returns `None` for excluded paths (the resolver is bypassed).
    ///
    /// A path already prefixed with a supported locale is served as is with that locale.
    /// Otherwise the candidate is used when it is exactly one of the supported codes, the
    /// default locale when it is not, and the resolved locale is prepended to the path.
    pub fn resolve(&self, path: &str, candidate: Option<&str>) -> Option<Resolved> {
        if is_excluded(path) { return None; }
        let path = if path.starts_with('/') { path.to_string() } else { format!("/{}", path) };

        if let (Some(locale), _) = split_locale_prefix(&path) {
            return Some(Resolved { locale, rewritten_path: path, redirect: false });
        }

        let locale = candidate.and_then(Locale::from_segment).unwrap_or(self.default_locale);
        let rewritten_path = if path == "/" {
            format!("/{}", locale)
        } else {
            format!("/{}{}", locale, path)
        };
        Some(Resolved { locale, rewritten_path, redirect: true })
    }
}
