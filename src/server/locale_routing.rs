use axum::extract::{Request, State};
use axum::http::{header, HeaderValue};
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};
use tracing::debug;

use super::AppState;
use crate::identity::parse_cookie;
use crate::locale::{candidate_locale, Locale, LOCALE_COOKIE};

const LOCALE_COOKIE_MAX_AGE: u64 = 60 * 60 * 24 * 365;

fn locale_cookie(locale: Locale) -> Option<HeaderValue> {
    HeaderValue::from_str(&format!("{}={}; Path=/; Max-Age={}; SameSite=Lax", LOCALE_COOKIE, locale, LOCALE_COOKIE_MAX_AGE)).ok()
}

/// Redirect locale-less page requests to their prefixed form; pass everything else through.
/// Served requests carry the resolved `Locale` as a request extension.
pub async fn locale_routing(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    let path = req.uri().path().to_string();
    let candidate = {
        let headers = req.headers();
        let cookie = parse_cookie(headers, LOCALE_COOKIE);
        let accept = headers.get(header::ACCEPT_LANGUAGE).and_then(|v| v.to_str().ok());
        candidate_locale(&path, cookie.as_deref(), accept)
    };

    let Some(resolved) = state.resolver.resolve(&path, candidate.as_deref()) else {
        return next.run(req).await;
    };

    if resolved.redirect {
        let mut location = resolved.rewritten_path;
        if let Some(q) = req.uri().query() {
            location.push('?');
            location.push_str(q);
        }
        debug!(target: "atlas::locale", "redirect {} -> {} (candidate={:?})", path, location, candidate);
        let mut resp = Redirect::temporary(&location).into_response();
        if let Some(c) = locale_cookie(resolved.locale) {
            resp.headers_mut().append(header::SET_COOKIE, c);
        }
        return resp;
    }

    req.extensions_mut().insert(resolved.locale);
    next.run(req).await
}
