//! services/web/src/web/pages.rs
//!
//! Handlers for the HTML screens and their form actions.

use axum::{
    extract::{Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
    Extension, Form,
};
use chrono::{NaiveDate, Utc};
use nebulearn_core::domain::{Page, User};
use nebulearn_core::ports::PortError;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{error, warn};

use crate::web::auth::{end_session, login_error};
use crate::web::middleware::{clear_session_cookie_header, session_cookie_header};
use crate::web::state::AppState;
use crate::web::study::{load_or_empty, recompute_statuses, toggle_study_cell};
use crate::web::views;

//=========================================================================================
// Form and Query Types
//=========================================================================================

#[derive(Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct DecksQuery {
    pub notice: Option<String>,
    pub deck: Option<String>,
}

#[derive(Deserialize)]
pub struct ToggleForm {
    pub deck_id: String,
    pub date: NaiveDate,
}

//=========================================================================================
// Login and Logout
//=========================================================================================

/// GET /login
pub async fn login_page_handler() -> Html<String> {
    Html(views::login_page(None, ""))
}

/// POST /login - on success, resumes on the last visited screen.
pub async fn login_form_handler(
    State(state): State<Arc<AppState>>,
    Form(form): Form<LoginForm>,
) -> Response {
    match state.sessions.login(&form.username, &form.password).await {
        Ok(session) => {
            let destination = state.cache.get_last_page().await.unwrap_or_default();
            let cookie = session_cookie_header(
                &session.session_id,
                (session.expires_at - Utc::now()).num_seconds().max(0),
            );
            (
                [(header::SET_COOKIE, cookie)],
                Redirect::to(destination.path()),
            )
                .into_response()
        }
        Err(e) => {
            let (status, message) = login_error(e);
            (status, Html(views::login_page(Some(&message), &form.username))).into_response()
        }
    }
}

/// POST /logout - ends the session only for the browser holding it.
pub async fn logout_form_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> impl IntoResponse {
    end_session(&state, &headers).await;
    (
        [(header::SET_COOKIE, clear_session_cookie_header())],
        Redirect::to("/login"),
    )
}

//=========================================================================================
// Screens
//=========================================================================================

/// GET /
pub async fn home_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
) -> Html<String> {
    state.cache.save_last_page(Page::Home).await;
    Html(views::home_page(&user))
}

/// GET /decks
pub async fn decks_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
    Query(query): Query<DecksQuery>,
) -> Html<String> {
    state.cache.save_last_page(Page::Decks).await;
    let data = load_or_empty(&state, &user).await;
    let statuses = state.cache.get_deck_statuses(&user.id).await;
    let notice = query
        .notice
        .as_deref()
        .and_then(|kind| views::deck_notice(kind, query.deck.as_deref()));
    Html(views::decks_page(&user, &data.decks, &statuses, notice.as_deref()))
}

/// POST /decks/statuses - explicit recompute of every deck's status.
pub async fn refresh_statuses_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
) -> Redirect {
    recompute_statuses(&state, &user).await;
    Redirect::to(Page::Decks.path())
}

/// GET /progress
pub async fn progress_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
) -> Html<String> {
    state.cache.save_last_page(Page::Progress).await;
    let data = load_or_empty(&state, &user).await;
    Html(views::progress_page(
        &user,
        &data.decks,
        &data.study_sessions,
        &state.config.calendar,
    ))
}

/// POST /progress/toggle - activates one calendar cell.
pub async fn toggle_form_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
    Form(form): Form<ToggleForm>,
) -> Result<Redirect, (StatusCode, String)> {
    match toggle_study_cell(&state, &user, &form.deck_id, form.date).await {
        Ok(_) => Ok(Redirect::to(Page::Progress.path())),
        Err(PortError::NotFound(message)) => {
            warn!("Calendar toggle rejected: {}", message);
            Err((StatusCode::NOT_FOUND, message))
        }
        Err(PortError::InvalidInput(message)) => {
            warn!("Calendar toggle rejected: {}", message);
            Err((StatusCode::BAD_REQUEST, message))
        }
        Err(e) => {
            error!("Failed to toggle calendar cell: {:?}", e);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to update study session".to_string(),
            ))
        }
    }
}
