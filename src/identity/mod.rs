//! Session state and admin authorization.
//! Keep the public surface thin and split implementation across sub-modules.

mod session;
mod provider;
mod authorizer;

pub use session::{Session, SessionToken, SessionStore, SessionState, SessionPayload, SessionUser};
pub use provider::{SessionProvider, SESSION_COOKIE, parse_cookie, session_cookie, clear_session_cookie};
pub use authorizer::{
    AdminAllowList, AdminGate, GuardDecision, normalize_email, safe_callback, sign_in_path,
    ADMIN_EMAILS_ENV, DEFAULT_ADMIN_EMAIL,
};
