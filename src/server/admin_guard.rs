use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};
use tracing::debug;

use super::AppState;
use crate::identity::GuardDecision;
use crate::locale::split_locale_prefix;

/// Route layer for `/{locale}/admin/*`. Requests without a session go to the sign-in page;
/// everything else reaches the page with the resolved `SessionState` as an extension.
pub async fn admin_guard(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    let locale = split_locale_prefix(req.uri().path()).0.unwrap_or(state.resolver.default_locale);
    let session = state.provider.session_state(req.headers());
    let return_to = req.uri().path_and_query().map(|pq| pq.as_str().to_string());

    match state.gate.guard(&session, locale, return_to.as_deref()) {
        GuardDecision::RedirectTo(to) => {
            debug!(target: "atlas::gate", "admin guard redirect {:?} -> {}", return_to, to);
            Redirect::temporary(&to).into_response()
        }
        GuardDecision::Permit | GuardDecision::Pending => {
            req.extensions_mut().insert(session);
            next.run(req).await
        }
    }
}
