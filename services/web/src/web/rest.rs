//! services/web/src/web/rest.rs
//!
//! Contains the Axum handlers for the JSON API and the master definition for the
//! OpenAPI specification.

use crate::web::auth::{AuthResponse, LoginRequest};
use crate::web::state::AppState;
use crate::web::study::{load_or_empty, recompute_statuses, toggle_study_cell};
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use chrono::NaiveDate;
use nebulearn_core::domain::{
    CachedData, Card, Deck, DeckStatus, Difficulty, Page, StatusLevel, StudySession, User,
};
use nebulearn_core::ports::PortError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::error;
use utoipa::{OpenApi, ToSchema};

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::web::auth::login_handler,
        crate::web::auth::logout_handler,
        me_handler,
        user_data_handler,
        save_last_page_handler,
        toggle_cell_handler,
        deck_statuses_handler,
        recompute_statuses_handler,
        study_sessions_handler,
        reset_handler,
    ),
    components(
        schemas(
            LoginRequest, AuthResponse, User, CachedData, Deck, Card, Difficulty, Page,
            StudySession, DeckStatus, StatusLevel, LastPageRequest, ToggleRequest, ToggleResponse
        )
    ),
    tags(
        (name = "NebuLearn API", description = "Study data behind the home, deck and progress screens.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// API Payload Structs
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct LastPageRequest {
    pub page: Page,
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ToggleRequest {
    pub deck_id: String,
    /// Calendar day, `YYYY-MM-DD`.
    pub date: NaiveDate,
}

/// The cell after the toggle, and the new aggregate success rate.
#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ToggleResponse {
    /// `None` when the toggle removed the session.
    pub session: Option<StudySession>,
    pub average_success_rate: u32,
    pub total_sessions: usize,
}

fn internal(context: &str, e: PortError) -> (StatusCode, String) {
    error!("{}: {:?}", context, e);
    (StatusCode::INTERNAL_SERVER_ERROR, context.to_string())
}

//=========================================================================================
// REST API Handlers
//=========================================================================================

/// The logged-in user.
#[utoipa::path(
    get,
    path = "/api/me",
    responses(
        (status = 200, description = "Current user", body = User),
        (status = 401, description = "Not logged in")
    )
)]
pub async fn me_handler(Extension(user): Extension<User>) -> Json<User> {
    Json(user)
}

/// The user's decks and study sessions, from cache or the database.
#[utoipa::path(
    get,
    path = "/api/data",
    responses(
        (status = 200, description = "User snapshot", body = CachedData),
        (status = 401, description = "Not logged in"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn user_data_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
) -> Result<Json<CachedData>, (StatusCode, String)> {
    state
        .cache
        .load_user_data(&user.id)
        .await
        .map(Json)
        .map_err(|e| internal("Failed to load study data", e))
}

/// Records the screen the user is on.
#[utoipa::path(
    put,
    path = "/api/last-page",
    request_body = LastPageRequest,
    responses(
        (status = 204, description = "Saved"),
        (status = 401, description = "Not logged in")
    )
)]
pub async fn save_last_page_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LastPageRequest>,
) -> StatusCode {
    state.cache.save_last_page(req.page).await;
    StatusCode::NO_CONTENT
}

/// Advances one progress calendar cell through `hard -> medium -> easy -> none`.
#[utoipa::path(
    post,
    path = "/api/calendar/toggle",
    request_body = ToggleRequest,
    responses(
        (status = 200, description = "Cell updated", body = ToggleResponse),
        (status = 401, description = "Not logged in"),
        (status = 400, description = "Day outside the calendar"),
        (status = 404, description = "Unknown deck"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn toggle_cell_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
    Json(req): Json<ToggleRequest>,
) -> Result<Json<ToggleResponse>, (StatusCode, String)> {
    match toggle_study_cell(&state, &user, &req.deck_id, req.date).await {
        Ok(outcome) => Ok(Json(ToggleResponse {
            session: outcome.change.current().cloned(),
            average_success_rate: outcome.average_success_rate,
            total_sessions: outcome.data.study_sessions.len(),
        })),
        Err(PortError::NotFound(message)) => Err((StatusCode::NOT_FOUND, message)),
        Err(PortError::InvalidInput(message)) => Err((StatusCode::BAD_REQUEST, message)),
        Err(e) => Err(internal("Failed to update study session", e)),
    }
}

/// The deck statuses from the last recompute.
#[utoipa::path(
    get,
    path = "/api/deck-statuses",
    responses(
        (status = 200, description = "Stored statuses", body = [DeckStatus]),
        (status = 401, description = "Not logged in")
    )
)]
pub async fn deck_statuses_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
) -> Json<Vec<DeckStatus>> {
    Json(state.cache.get_deck_statuses(&user.id).await)
}

/// Recomputes and stores every deck's status.
#[utoipa::path(
    post,
    path = "/api/deck-statuses/recompute",
    responses(
        (status = 200, description = "Fresh statuses", body = [DeckStatus]),
        (status = 401, description = "Not logged in")
    )
)]
pub async fn recompute_statuses_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
) -> Json<Vec<DeckStatus>> {
    Json(recompute_statuses(&state, &user).await)
}

/// The study-session list last written by the progress calendar.
#[utoipa::path(
    get,
    path = "/api/study-sessions",
    responses(
        (status = 200, description = "Stored sessions, or the current snapshot's when none were saved", body = [StudySession]),
        (status = 401, description = "Not logged in")
    )
)]
pub async fn study_sessions_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
) -> Json<Vec<StudySession>> {
    match state.progress.load().await {
        Some(sessions) => Json(sessions),
        None => Json(load_or_empty(&state, &user).await.study_sessions),
    }
}

/// Clears the session, cache, deck statuses and last page.
#[utoipa::path(
    post,
    path = "/api/reset",
    responses(
        (status = 200, description = "All user data cleared; the session is over"),
        (status = 401, description = "Not logged in")
    )
)]
pub async fn reset_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
) -> impl IntoResponse {
    state.sessions.logout().await;
    state.cache.clear_all_user_data(&user.id).await;
    (
        StatusCode::OK,
        [(
            axum::http::header::SET_COOKIE,
            crate::web::middleware::clear_session_cookie_header(),
        )],
    )
}
