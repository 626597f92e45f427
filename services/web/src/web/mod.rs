pub mod auth;
pub mod middleware;
pub mod pages;
pub mod rest;
pub mod state;
pub mod study;
pub mod views;

use axum::{
    middleware as axum_middleware,
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub use middleware::{require_auth, require_page_auth};
pub use state::AppState;

/// Builds the full application: screens, JSON API and Swagger UI.
pub fn router(app_state: Arc<AppState>) -> Router {
    // Public routes (no auth required)
    let public_routes = Router::new()
        .route(
            "/login",
            get(pages::login_page_handler).post(pages::login_form_handler),
        )
        .route("/logout", post(pages::logout_form_handler))
        .route("/auth/login", post(auth::login_handler))
        .route("/auth/logout", post(auth::logout_handler));

    // Screens; an unauthenticated browser is sent to the login page
    let page_routes = Router::new()
        .route("/", get(pages::home_handler))
        .route("/decks", get(pages::decks_handler))
        .route("/decks/statuses", post(pages::refresh_statuses_handler))
        .route("/progress", get(pages::progress_handler))
        .route("/progress/toggle", post(pages::toggle_form_handler))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            require_page_auth,
        ));

    // JSON API (auth required)
    let api_routes = Router::new()
        .route("/api/me", get(rest::me_handler))
        .route("/api/data", get(rest::user_data_handler))
        .route("/api/last-page", put(rest::save_last_page_handler))
        .route("/api/calendar/toggle", post(rest::toggle_cell_handler))
        .route("/api/deck-statuses", get(rest::deck_statuses_handler))
        .route(
            "/api/deck-statuses/recompute",
            post(rest::recompute_statuses_handler),
        )
        .route("/api/study-sessions", get(rest::study_sessions_handler))
        .route("/api/reset", post(rest::reset_handler))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            require_auth,
        ));

    let app_router = Router::new()
        .merge(public_routes)
        .merge(page_routes)
        .merge(api_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(app_state);

    Router::new()
        .merge(app_router)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", rest::ApiDoc::openapi()))
}
