//! Message catalog for the rendered pages.
//! Keys use dot notation (`page.admin.denied`). Missing German entries fall back to English,
//! missing English entries fall back to the key itself.

use std::collections::HashMap;
use once_cell::sync::Lazy;

use crate::locale::Locale;

const EN: &[(&str, &str)] = &[
    ("site.title", "Service Atlas"),
    ("nav.home", "Home"),
    ("nav.admin", "Admin"),
    ("nav.signin", "Sign in"),
    ("nav.signout", "Sign out"),
    ("page.home.heading", "Services"),
    ("page.home.empty", "No services are published yet."),
    ("page.service.video", "Video"),
    ("page.service.tags", "Tags"),
    ("page.not_found.heading", "Page not found"),
    ("page.not_found.body", "The page you are looking for does not exist."),
    ("page.signin.heading", "Sign in"),
    ("page.signin.identifier", "Email"),
    ("page.signin.password", "Password"),
    ("page.signin.submit", "Sign in"),
    ("page.signin.failed", "Sign-in failed. Check your email and password."),
    ("page.admin.heading", "Administration"),
    ("page.admin.loading", "Checking your session…"),
    ("page.admin.denied", "You are signed in but not allowed to manage this site."),
    ("page.admin.signed_in_as", "Signed in as"),
    ("page.admin.tags", "Tags"),
    ("page.admin.tags.empty", "No tags found."),
    ("error.fetch", "Failed to fetch content."),
];

const DE: &[(&str, &str)] = &[
    ("site.title", "Service-Atlas"),
    ("nav.home", "Startseite"),
    ("nav.admin", "Verwaltung"),
    ("nav.signin", "Anmelden"),
    ("nav.signout", "Abmelden"),
    ("page.home.heading", "Leistungen"),
    ("page.home.empty", "Es sind noch keine Leistungen veröffentlicht."),
    ("page.service.video", "Video"),
    ("page.service.tags", "Schlagwörter"),
    ("page.not_found.heading", "Seite nicht gefunden"),
    ("page.not_found.body", "Die gesuchte Seite existiert nicht."),
    ("page.signin.heading", "Anmelden"),
    ("page.signin.identifier", "E-Mail"),
    ("page.signin.password", "Passwort"),
    ("page.signin.submit", "Anmelden"),
    ("page.signin.failed", "Anmeldung fehlgeschlagen. Bitte E-Mail und Passwort prüfen."),
    ("page.admin.heading", "Verwaltung"),
    ("page.admin.loading", "Sitzung wird geprüft…"),
    ("page.admin.denied", "Sie sind angemeldet, haben aber keine Verwaltungsrechte."),
    ("page.admin.signed_in_as", "Angemeldet als"),
    ("page.admin.tags", "Schlagwörter"),
    ("page.admin.tags.empty", "Keine Schlagwörter gefunden."),
    ("error.fetch", "Inhalte konnten nicht geladen werden."),
];

static CATALOG: Lazy<HashMap<Locale, HashMap<&'static str, &'static str>>> = Lazy::new(|| {
    let mut m = HashMap::new();
    m.insert(Locale::En, EN.iter().copied().collect());
    m.insert(Locale::De, DE.iter().copied().collect());
    m
});

/// Translate `key` for `locale`.
pub fn t(locale: Locale, key: &'static str) -> &'static str {
    lookup(locale, key)
        .or_else(|| lookup(Locale::En, key))
        .unwrap_or(key)
}

fn lookup(locale: Locale, key: &str) -> Option<&'static str> {
    CATALOG.get(&locale).and_then(|m| m.get(key)).copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn translates_per_locale() {
        assert_eq!(t(Locale::En, "nav.signin"), "Sign in");
        assert_eq!(t(Locale::De, "nav.signin"), "Anmelden");
    }

    #[test]
    fn missing_key_falls_back_to_key() {
        assert_eq!(t(Locale::De, "does.not.exist"), "does.not.exist");
    }

    #[test]
    fn catalogs_cover_the_same_keys() {
        let en: Vec<&str> = EN.iter().map(|(k, _)| *k).collect();
        for (k, _) in DE {
            assert!(en.contains(k), "german key {} missing in english", k);
        }
        assert_eq!(EN.len(), DE.len());
    }
}
