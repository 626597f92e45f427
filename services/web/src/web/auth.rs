//! services/web/src/web/auth.rs
//!
//! JSON authentication endpoints for login and logout.

use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use nebulearn_core::domain::{Page, User};
use nebulearn_core::ports::PortError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, warn};
use utoipa::ToSchema;

use crate::web::middleware::{
    clear_session_cookie_header, holds_session, session_cookie_header,
};
use crate::web::state::AppState;

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub user: User,
    pub expires_at: DateTime<Utc>,
    /// Where the user left off, so a client can resume there.
    pub last_page: Page,
}

/// Maps a login failure to the status and message shown to the user.
pub fn login_error(e: PortError) -> (StatusCode, String) {
    match e {
        PortError::Unauthorized => (StatusCode::UNAUTHORIZED, e.to_string()),
        other => {
            error!("Login failed: {:?}", other);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Login failed. Please try again.".to_string(),
            )
        }
    }
}

/// Drops the held session when the request's cookie names it. Other requests
/// leave it alone; their cookie is cleared either way.
pub async fn end_session(state: &AppState, headers: &HeaderMap) {
    if holds_session(state, headers).await {
        state.sessions.logout().await;
    } else {
        warn!("Logout without the current session cookie; keeping the session");
    }
}

//=========================================================================================
// Handlers
//=========================================================================================

/// POST /auth/login - Login with a username and password
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 401, description = "Invalid username or password"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let session = state
        .sessions
        .login(&req.username, &req.password)
        .await
        .map_err(login_error)?;

    let cookie = session_cookie_header(
        &session.session_id,
        (session.expires_at - Utc::now()).num_seconds().max(0),
    );
    let response = AuthResponse {
        last_page: state.cache.get_last_page().await.unwrap_or_default(),
        expires_at: session.expires_at,
        user: session.user,
    };

    Ok((StatusCode::OK, [(header::SET_COOKIE, cookie)], Json(response)))
}

/// POST /auth/logout - Logout and drop the session
#[utoipa::path(
    post,
    path = "/auth/logout",
    responses(
        (status = 200, description = "Session cookie cleared; the session ends if the cookie named it")
    )
)]
pub async fn logout_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> impl IntoResponse {
    end_session(&state, &headers).await;
    (
        StatusCode::OK,
        [(header::SET_COOKIE, clear_session_cookie_header())],
    )
}
