//! Server-rendered HTML pages. Markup is intentionally plain; every string shown to the
//! visitor goes through the `i18n` catalog and every value from the backend is escaped.

use axum::extract::{Path, Query, Request, State};
use axum::http::{HeaderMap, StatusCode, Uri};
use axum::response::{Html, IntoResponse, Response};
use axum::{Extension, Json};
use serde::Deserialize;
use tracing::warn;

use super::AppState;
use crate::content::{embed_url, ServiceRecord, Tag};
use crate::i18n::t;
use crate::identity::{safe_callback, SessionState};
use crate::locale::{split_locale_prefix, Locale, LOCALES};

pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Same page in another locale.
fn switch_locale(path: &str, to: Locale) -> String {
    let (_, rest) = split_locale_prefix(path);
    if rest == "/" { format!("/{}", to) } else { format!("/{}{}", to, rest) }
}

fn layout(locale: Locale, title: &str, session: &SessionState, current_path: &str, body: &str) -> String {
    let mut nav = format!(
        r#"<a href="/{l}">{home}</a> <a href="/{l}/admin">{admin}</a> "#,
        l = locale,
        home = t(locale, "nav.home"),
        admin = t(locale, "nav.admin"),
    );
    match session {
        SessionState::Authenticated { email, .. } => nav.push_str(&format!(
            r#"<span class="user">{email}</span> <form method="post" action="/api/auth/signout?callbackUrl=/{l}" class="inline"><button type="submit">{label}</button></form> "#,
            email = escape_html(email),
            l = locale,
            label = t(locale, "nav.signout"),
        )),
        _ => nav.push_str(&format!(r#"<a href="/{}/auth/signin">{}</a> "#, locale, t(locale, "nav.signin"))),
    }
    for other in LOCALES.iter().copied().filter(|l| *l != locale) {
        nav.push_str(&format!(
            r#"<a hreflang="{l}" href="{href}">{l}</a> "#,
            l = other,
            href = escape_html(&switch_locale(current_path, other)),
        ));
    }
    format!(
        "<!doctype html>\n<html lang=\"{l}\">\n<head><meta charset=\"utf-8\"><title>{title} | {site}</title></head>\n<body>\n<nav>{nav}</nav>\n<main>\n{body}\n</main>\n</body>\n</html>\n",
        l = locale,
        title = escape_html(title),
        site = t(locale, "site.title"),
        nav = nav.trim_end(),
        body = body,
    )
}

fn not_found_page(locale: Locale, session: &SessionState, path: &str) -> Response {
    let body = format!("<h1>{}</h1>\n<p>{}</p>", t(locale, "page.not_found.heading"), t(locale, "page.not_found.body"));
    (StatusCode::NOT_FOUND, Html(layout(locale, t(locale, "page.not_found.heading"), session, path, &body))).into_response()
}

pub async fn home(State(state): State<AppState>, Path(raw): Path<String>, headers: HeaderMap) -> Response {
    let session = state.provider.session_state(&headers);
    let Some(locale) = Locale::from_segment(&raw) else {
        return not_found_page(state.resolver.default_locale, &session, &format!("/{}", raw));
    };
    let mut body = format!("<h1>{}</h1>\n", t(locale, "page.home.heading"));
    match state.content.try_services(locale).await {
        Err(e) => {
            warn!(target: "atlas::pages", "home locale={} content fetch failed: {}", locale, e);
            body.push_str(&fetch_error(locale));
        }
        Ok(services) if services.is_empty() => body.push_str(&format!("<p>{}</p>", t(locale, "page.home.empty"))),
        Ok(services) => {
            body.push_str("<ul>\n");
            for s in &services {
                body.push_str(&service_list_item(locale, s));
            }
            body.push_str("</ul>");
        }
    }
    Html(layout(locale, t(locale, "page.home.heading"), &session, &format!("/{}", locale), &body)).into_response()
}

/// Shown instead of an empty state when the content backend could not be reached.
fn fetch_error(locale: Locale) -> String {
    format!("<p class=\"error\">{}</p>", t(locale, "error.fetch"))
}

fn service_list_item(locale: Locale, s: &ServiceRecord) -> String {
    let summary = s.summary.as_deref().map(|x| format!(" – {}", escape_html(x))).unwrap_or_default();
    format!(
        "<li><a href=\"/{}/services/{}\">{}</a>{}</li>\n",
        locale,
        urlencoding::encode(&s.slug),
        escape_html(&s.title),
        summary
    )
}

pub async fn service(State(state): State<AppState>, Path((raw, slug)): Path<(String, String)>, headers: HeaderMap) -> Response {
    let session = state.provider.session_state(&headers);
    let path = format!("/{}/services/{}", raw, slug);
    let Some(locale) = Locale::from_segment(&raw) else {
        return not_found_page(state.resolver.default_locale, &session, &path);
    };
    let Some(rec) = state.content.service_by_slug(&slug, locale).await else {
        return not_found_page(locale, &session, &path);
    };

    let mut body = format!("<article>\n<h1>{}</h1>\n", escape_html(&rec.title));
    if let Some(summary) = &rec.summary {
        body.push_str(&format!("<p class=\"summary\">{}</p>\n", escape_html(summary)));
    }
    if let Some(text) = &rec.body {
        for para in text.split("\n\n").filter(|p| !p.trim().is_empty()) {
            body.push_str(&format!("<p>{}</p>\n", escape_html(para.trim())));
        }
    }
    if let Some(video) = &rec.video_url {
        body.push_str(&format!("<section class=\"video\"><h2>{}</h2>\n", t(locale, "page.service.video")));
        match embed_url(video) {
            Some(src) => body.push_str(&format!(
                "<iframe src=\"{}\" title=\"{}\" allowfullscreen loading=\"lazy\"></iframe>\n",
                escape_html(&src),
                escape_html(&rec.title)
            )),
            None => body.push_str(&format!(
                "<video controls src=\"{}\"></video>\n",
                escape_html(&state.content.config().media_url(video))
            )),
        }
        body.push_str("</section>\n");
    }
    if !rec.tags.is_empty() {
        let tags: Vec<String> = rec.tags.iter().map(|tag| escape_html(tag)).collect();
        body.push_str(&format!("<p class=\"tags\">{}: {}</p>\n", t(locale, "page.service.tags"), tags.join(", ")));
    }
    body.push_str("</article>");
    Html(layout(locale, &rec.title, &session, &path, &body)).into_response()
}

#[derive(Debug, Deserialize)]
pub struct SignInPageQuery {
    #[serde(rename = "callbackUrl", default)]
    pub callback_url: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

pub async fn sign_in(
    State(state): State<AppState>,
    Path(raw): Path<String>,
    Query(q): Query<SignInPageQuery>,
    headers: HeaderMap,
) -> Response {
    let session = state.provider.session_state(&headers);
    let Some(locale) = Locale::from_segment(&raw) else {
        return not_found_page(state.resolver.default_locale, &session, &format!("/{}/auth/signin", raw));
    };
    let callback = safe_callback(q.callback_url.as_deref()).map(str::to_string).unwrap_or_else(|| format!("/{}/admin", locale));
    let mut body = format!("<h1>{}</h1>\n", t(locale, "page.signin.heading"));
    if q.error.is_some() {
        body.push_str(&format!("<p class=\"error\">{}</p>\n", t(locale, "page.signin.failed")));
    }
    body.push_str(&format!(
        concat!(
            "<form method=\"post\" action=\"/api/auth/signin\">\n",
            "<input type=\"hidden\" name=\"locale\" value=\"{l}\">\n",
            "<input type=\"hidden\" name=\"callbackUrl\" value=\"{cb}\">\n",
            "<label>{id_label} <input type=\"email\" name=\"identifier\" required></label>\n",
            "<label>{pw_label} <input type=\"password\" name=\"password\" required></label>\n",
            "<button type=\"submit\">{submit}</button>\n",
            "</form>"
        ),
        l = locale,
        cb = escape_html(&callback),
        id_label = t(locale, "page.signin.identifier"),
        pw_label = t(locale, "page.signin.password"),
        submit = t(locale, "page.signin.submit"),
    ));
    let path = format!("/{}/auth/signin", locale);
    Html(layout(locale, t(locale, "page.signin.heading"), &session, &path, &body)).into_response()
}

/// Admin pages. The route guard has already ensured a session is present (or pending);
/// this handler applies the allow-list.
pub async fn admin(State(state): State<AppState>, Extension(session): Extension<SessionState>, uri: Uri) -> Response {
    let (prefix, rest) = split_locale_prefix(uri.path());
    let Some(locale) = prefix else {
        return not_found_page(state.resolver.default_locale, &session, uri.path());
    };
    let section = rest.strip_prefix("/admin").unwrap_or("").trim_matches('/');
    let heading = t(locale, "page.admin.heading");

    if session == SessionState::Loading {
        let body = format!("<h1>{}</h1>\n<p>{}</p>", heading, t(locale, "page.admin.loading"));
        return Html(layout(locale, heading, &session, uri.path(), &body)).into_response();
    }
    if !state.gate.is_authorized(&session) {
        let body = format!(
            "<h1>{}</h1>\n<p class=\"denied\">{}</p>\n<p>{} {}</p>",
            heading,
            t(locale, "page.admin.denied"),
            t(locale, "page.admin.signed_in_as"),
            escape_html(session.email().unwrap_or("")),
        );
        return Html(layout(locale, heading, &session, uri.path(), &body)).into_response();
    }

    let body = match section {
        "" => format!(
            "<h1>{}</h1>\n<p>{} {}</p>\n<ul>\n<li><a href=\"/{}/admin/tags\">{}</a></li>\n</ul>",
            heading,
            t(locale, "page.admin.signed_in_as"),
            escape_html(session.email().unwrap_or("")),
            locale,
            t(locale, "page.admin.tags"),
        ),
        "tags" => match state.content.try_tags(locale, session.strapi_jwt()).await {
            Ok(tags) => tag_list(locale, &tags),
            Err(e) => {
                warn!(target: "atlas::pages", "admin tags locale={} content fetch failed: {}", locale, e);
                format!("<h1>{}</h1>\n{}", t(locale, "page.admin.tags"), fetch_error(locale))
            }
        },
        _ => return not_found_page(locale, &session, uri.path()),
    };
    Html(layout(locale, heading, &session, uri.path(), &body)).into_response()
}

fn tag_list(locale: Locale, tags: &[Tag]) -> String {
    let mut body = format!("<h1>{}</h1>\n", t(locale, "page.admin.tags"));
    if tags.is_empty() {
        body.push_str(&format!("<p>{}</p>", t(locale, "page.admin.tags.empty")));
        return body;
    }
    body.push_str("<table>\n<tr><th>#</th><th>Name</th><th>Slug</th></tr>\n");
    for tag in tags {
        body.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td>{}</td></tr>\n",
            tag.id,
            escape_html(&tag.name),
            escape_html(tag.slug.as_deref().unwrap_or("")),
        ));
    }
    body.push_str("</table>");
    body
}

/// Fallback: JSON for unknown API routes, a localized page for everything else.
pub async fn not_found(State(state): State<AppState>, req: Request) -> Response {
    let path = req.uri().path().to_string();
    if path == "/api" || path.starts_with("/api/") {
        return (StatusCode::NOT_FOUND, Json(serde_json::json!({"status":"error","code":"not_found","message": format!("no route for {}", path)}))).into_response();
    }
    let locale = req
        .extensions()
        .get::<Locale>()
        .copied()
        .or_else(|| split_locale_prefix(&path).0)
        .unwrap_or(state.resolver.default_locale);
    let session = state.provider.session_state(req.headers());
    not_found_page(locale, &session, &path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_markup() {
        assert_eq!(escape_html(r#"<a href="x">Tom & 'Jerry'</a>"#), "&lt;a href=&quot;x&quot;&gt;Tom &amp; &#39;Jerry&#39;&lt;/a&gt;");
    }

    #[test]
    fn language_switch_keeps_rest_of_path() {
        assert_eq!(switch_locale("/en/services/plumbing", Locale::De), "/de/services/plumbing");
        assert_eq!(switch_locale("/de", Locale::En), "/en");
    }

    #[test]
    fn layout_shows_sign_in_for_anonymous_and_email_for_users() {
        let anon = layout(Locale::De, "T", &SessionState::Unauthenticated, "/de", "<p>x</p>");
        assert!(anon.contains("<html lang=\"de\">"));
        assert!(anon.contains("/de/auth/signin"));
        assert!(anon.contains("href=\"/en\""));

        let user = layout(Locale::En, "T", &SessionState::authenticated("a<b>@x.com", None), "/en", "");
        assert!(user.contains("a&lt;b&gt;@x.com"));
        assert!(user.contains("/api/auth/signout"));
    }

    #[test]
    fn fetch_error_is_localized() {
        assert_eq!(fetch_error(Locale::En), "<p class=\"error\">Failed to fetch content.</p>");
        assert!(fetch_error(Locale::De).contains("Inhalte konnten nicht geladen werden."));
    }

    #[test]
    fn tag_table_and_empty_state() {
        assert!(tag_list(Locale::En, &[]).contains("No tags found."));
        let html = tag_list(Locale::De, &[Tag { id: 1, name: "Garten & Haus".into(), slug: None }]);
        assert!(html.contains("Garten &amp; Haus"));
        assert!(html.starts_with("<h1>Schlagwörter</h1>"));
    }
}
