//!
//! atlas HTTP server
//! -----------------
//! This module defines the Axum-based HTTP surface of the service atlas front end.
//!
//! Responsibilities:
//! - Locale routing: every page request is redirected to a locale-prefixed path.
//! - Admin guard: `/{locale}/admin/*` requires a session, the page checks the allow-list.
//! - Sign-in/sign-out endpoints backed by the content backend's local auth.
//! - JSON proxies for a few content read queries.
//! - Localized HTML pages (home, service, sign-in, admin, not found).

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::extract::{FromRequest, Path, Query, Request, State};
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::{middleware, Form, Json, Router};
use serde::Deserialize;
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::content::{ServiceRecord, StrapiClient};
use crate::error::{AppError, AppResult};
use crate::identity::{
    clear_session_cookie, parse_cookie, safe_callback, session_cookie, AdminGate, SessionProvider,
    SessionStore, SESSION_COOKIE,
};
use crate::locale::{Locale, LocaleResolver};

pub mod locale_routing;
pub mod admin_guard;
pub mod pages;

/// Shared server state injected into all handlers.
#[derive(Clone)]
pub struct AppState {
    pub resolver: LocaleResolver,
    pub gate: AdminGate,
    /// Issues and revokes sessions on sign-in/sign-out.
    pub sessions: Arc<SessionStore>,
    /// Answers "who is this request" for the gate and the pages.
    pub provider: Arc<dyn SessionProvider>,
    pub content: Arc<StrapiClient>,
    pub secure_cookies: bool,
}

impl AppState {
    pub fn new(config: &AppConfig) -> anyhow::Result<Self> {
        let sessions = Arc::new(SessionStore::new(config.session_ttl));
        let content = StrapiClient::new(config.content.clone()).context("While building content backend client")?;
        Ok(Self {
            resolver: LocaleResolver::new(Locale::default()),
            gate: AdminGate::new(Arc::new(config.admin_allow_list.clone())),
            provider: sessions.clone(),
            sessions,
            content: Arc::new(content),
            secure_cookies: config.secure_cookies,
        })
    }

    /// Replace the session provider (the store still handles sign-in/out).
    pub fn with_session_provider(mut self, provider: Arc<dyn SessionProvider>) -> Self {
        self.provider = provider;
        self
    }
}

/// Build the full router with all routes and middleware.
pub fn router(state: AppState) -> Router {
    let admin = Router::new()
        .route("/{locale}/admin", get(pages::admin))
        .route("/{locale}/admin/{*rest}", get(pages::admin))
        .route_layer(middleware::from_fn_with_state(state.clone(), admin_guard::admin_guard));

    Router::new()
        .route("/api/health", get(|| async { "ok" }))
        .route("/api/auth/session", get(session_handler))
        .route("/api/auth/signin", post(sign_in))
        .route("/api/auth/signout", post(sign_out))
        .route("/api/services", get(api_services))
        .route("/api/services/{slug}", get(api_service))
        .route("/{locale}", get(pages::home))
        .route("/{locale}/services/{slug}", get(pages::service))
        .route("/{locale}/auth/signin", get(pages::sign_in))
        .merge(admin)
        .fallback(pages::not_found)
        .layer(middleware::from_fn_with_state(state.clone(), locale_routing::locale_routing))
        .with_state(state)
}

/// Start the HTTP server with the given configuration.
pub async fn run(config: AppConfig) -> anyhow::Result<()> {
    info!(
        target: "startup",
        "atlas starting: bind={}, http_port={}, strapi_server={}, strapi_public={}, admins={}, session_ttl_secs={}",
        config.bind,
        config.http_port,
        config.content.base_url(crate::content::ExecutionContext::Server),
        config.content.base_url(crate::content::ExecutionContext::Client),
        config.admin_allow_list.entries().len(),
        config.session_ttl.as_secs()
    );

    let state = AppState::new(&config)?;

    // Background sweeper for expired sessions
    {
        let sessions = state.sessions.clone();
        tokio::spawn(async move {
            use std::time::Duration;
            loop {
                tokio::time::sleep(Duration::from_secs(60)).await;
                let removed = sessions.purge_expired();
                if removed > 0 { tracing::debug!(removed = removed, "session_sweep"); }
            }
        });
    }

    let app = router(state);
    let addr: SocketAddr = format!("{}:{}", config.bind, config.http_port)
        .parse()
        .with_context(|| format!("Invalid bind address {}:{}", config.bind, config.http_port))?;
    info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

#[derive(Debug, Deserialize)]
pub struct SignInPayload {
    pub identifier: String,
    pub password: String,
    #[serde(rename = "callbackUrl", default)]
    pub callback_url: Option<String>,
    #[serde(default)]
    pub locale: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LocaleQuery {
    #[serde(default)]
    pub locale: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SignOutQuery {
    #[serde(rename = "callbackUrl", default)]
    pub callback_url: Option<String>,
}

fn is_form(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|ct| ct.starts_with("application/x-www-form-urlencoded"))
        .unwrap_or(false)
}

fn with_cookie(mut resp: Response, cookie: HeaderValue) -> Response {
    resp.headers_mut().append(header::SET_COOKIE, cookie);
    resp
}

async fn session_handler(State(state): State<AppState>, headers: HeaderMap) -> impl IntoResponse {
    Json(state.provider.session_state(&headers).to_payload())
}

/// Form posts (the sign-in page) are answered with redirects, JSON posts with JSON.
async fn sign_in(State(state): State<AppState>, req: Request) -> Response {
    let form = is_form(req.headers());
    let payload = if form {
        Form::<SignInPayload>::from_request(req, &state).await.map(|f| f.0).map_err(|e| e.body_text())
    } else {
        Json::<SignInPayload>::from_request(req, &state).await.map(|j| j.0).map_err(|e| e.body_text())
    };
    let payload = match payload {
        Ok(p) => p,
        Err(msg) => return AppError::user("bad_request".to_string(), msg).into_response(),
    };
    let locale = payload.locale.as_deref().and_then(Locale::parse).unwrap_or(state.resolver.default_locale);
    let callback = safe_callback(payload.callback_url.as_deref()).map(str::to_string);

    let outcome: AppResult<_> = if payload.identifier.trim().is_empty() || payload.password.is_empty() {
        Err(AppError::user("missing_credentials", "identifier and password are required"))
    } else {
        state
            .content
            .authenticate(payload.identifier.trim(), &payload.password)
            .await
            .map_err(AppError::from)
            .and_then(|auth| {
                state
                    .sessions
                    .issue(&auth.email, Some(auth.jwt))
                    .map_err(|e| AppError::internal("session_error".to_string(), e.to_string()))
            })
    };

    match outcome {
        Ok(session) => {
            info!(target: "atlas::auth", "sign-in email={} sid={}", session.email, session.session_id);
            let cookie = session_cookie(&session.token, state.sessions.ttl.as_secs(), state.secure_cookies);
            let resp = if form {
                let to = callback.unwrap_or_else(|| format!("/{}/admin", locale));
                Redirect::to(&to).into_response()
            } else {
                (StatusCode::OK, Json(serde_json::json!({"status":"ok","user":{"email": session.email}}))).into_response()
            };
            with_cookie(resp, cookie)
        }
        Err(e) => {
            warn!(target: "atlas::auth", "sign-in failed identifier={}: {}", payload.identifier.trim(), e);
            if form {
                let mut to = format!("{}?error={}", crate::identity::sign_in_path(locale), e.code_str());
                if let Some(cb) = callback {
                    to.push_str("&callbackUrl=");
                    to.push_str(&urlencoding::encode(&cb));
                }
                Redirect::to(&to).into_response()
            } else {
                e.into_response()
            }
        }
    }
}

async fn sign_out(State(state): State<AppState>, headers: HeaderMap, Query(q): Query<SignOutQuery>) -> Response {
    if let Some(token) = parse_cookie(&headers, SESSION_COOKIE) {
        state.sessions.revoke(&token);
    }
    let resp = match safe_callback(q.callback_url.as_deref()) {
        Some(to) => Redirect::to(to).into_response(),
        None => Json(serde_json::json!({"status":"ok"})).into_response(),
    };
    with_cookie(resp, clear_session_cookie(state.secure_cookies))
}

fn query_locale(state: &AppState, q: &LocaleQuery) -> Locale {
    q.locale.as_deref().and_then(Locale::parse).unwrap_or(state.resolver.default_locale)
}

async fn api_services(State(state): State<AppState>, Query(q): Query<LocaleQuery>) -> Json<Vec<ServiceRecord>> {
    let locale = query_locale(&state, &q);
    Json(state.content.services(locale).await)
}

async fn api_service(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Query(q): Query<LocaleQuery>,
) -> AppResult<Json<ServiceRecord>> {
    let locale = query_locale(&state, &q);
    match state.content.service_by_slug(&slug, locale).await {
        Some(rec) => Ok(Json(rec)),
        None => Err(AppError::not_found("service_not_found".to_string(), format!("no service '{}'", slug))),
    }
}
