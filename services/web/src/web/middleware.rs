//! services/web/src/web/middleware.rs
//!
//! Authentication middleware for protecting routes.

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use nebulearn_core::domain::User;
use std::sync::Arc;
use tracing::warn;

use crate::web::state::AppState;

/// Name of the cookie carrying the session id.
pub const SESSION_COOKIE: &str = "session";

/// Finds the session id in the request's `Cookie` header.
pub fn session_cookie(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())?
        .split(';')
        .find_map(|c| c.trim().strip_prefix(SESSION_COOKIE)?.strip_prefix('='))
        .filter(|id| !id.is_empty())
}

/// Whether the request's cookie names the held session. Leaves the session untouched.
pub async fn holds_session(state: &AppState, headers: &HeaderMap) -> bool {
    match (session_cookie(headers), state.sessions.current_session().await) {
        (Some(cookie_id), Some(session)) => session.session_id == cookie_id,
        _ => false,
    }
}

/// The logged-in user, if the request's cookie names the live session.
///
/// Only a matching cookie refreshes the session's activity stamp.
pub async fn authenticate(state: &AppState, headers: &HeaderMap) -> Option<User> {
    if !holds_session(state, headers).await {
        if session_cookie(headers).is_some() {
            warn!("Request carried a session cookie that is not the current session");
        }
        return None;
    }
    if !state.sessions.is_authenticated().await {
        return None;
    }
    state.sessions.current_user().await
}

/// Middleware for JSON routes: inserts the `User` into request extensions, or
/// answers 401 Unauthorized.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let user = authenticate(&state, req.headers())
        .await
        .ok_or(StatusCode::UNAUTHORIZED)?;
    req.extensions_mut().insert(user);
    Ok(next.run(req).await)
}

/// Middleware for screens: like [`require_auth`] but sends the browser to the login page.
pub async fn require_page_auth(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Response {
    match authenticate(&state, req.headers()).await {
        Some(user) => {
            req.extensions_mut().insert(user);
            next.run(req).await
        }
        None => Redirect::to("/login").into_response(),
    }
}

/// `Set-Cookie` value starting a browser session for `session_id`.
pub fn session_cookie_header(session_id: &str, max_age_seconds: i64) -> String {
    format!(
        "{}={}; HttpOnly; SameSite=Lax; Path=/; Max-Age={}",
        SESSION_COOKIE, session_id, max_age_seconds
    )
}

/// `Set-Cookie` value clearing the session cookie.
pub fn clear_session_cookie_header() -> String {
    format!("{}=; HttpOnly; SameSite=Lax; Path=/; Max-Age=0", SESSION_COOKIE)
}
