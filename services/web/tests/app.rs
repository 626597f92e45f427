//! End-to-end tests driving the full router with in-memory storage.

use axum::{
    body::Body,
    http::{header, HeaderMap, HeaderValue, Request, Response, StatusCode},
    Router,
};
use nebulearn_core::CalendarWindow;
use nebulearn_web::{
    adapters::MemoryStore,
    config::{Config, DEFAULT_STORAGE_QUOTA_BYTES},
    web::{middleware::authenticate, router, state::AppState},
};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

fn test_config() -> Config {
    Config {
        bind_address: "127.0.0.1:0".parse().unwrap(),
        log_level: tracing::Level::INFO,
        storage_path: None,
        storage_quota_bytes: DEFAULT_STORAGE_QUOTA_BYTES,
        login_delay: Duration::ZERO,
        fetch_delay: Duration::ZERO,
        calendar: CalendarWindow::default(),
    }
}

async fn app_with(kv: Arc<MemoryStore>) -> Router {
    let state = AppState::with_store(Arc::new(test_config()), kv).await.unwrap();
    router(Arc::new(state))
}

async fn app() -> Router {
    app_with(Arc::new(MemoryStore::new())).await
}

async fn send(app: &Router, req: Request<Body>) -> Response<Body> {
    app.clone().oneshot(req).await.unwrap()
}

async fn body_text(res: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::get(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

fn form(uri: &str, cookie: Option<&str>, body: &str) -> Request<Body> {
    let mut builder = Request::post(uri).header(
        header::CONTENT_TYPE,
        "application/x-www-form-urlencoded",
    );
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn json_req(method: &str, uri: &str, cookie: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

/// The `session=...` pair from a response's `Set-Cookie` header.
fn session_pair(res: &Response<Body>) -> String {
    let set_cookie = res
        .headers()
        .get(header::SET_COOKIE)
        .expect("Set-Cookie header")
        .to_str()
        .unwrap();
    set_cookie.split(';').next().unwrap().to_string()
}

fn location(res: &Response<Body>) -> &str {
    res.headers()
        .get(header::LOCATION)
        .expect("Location header")
        .to_str()
        .unwrap()
}

async fn login(app: &Router) -> String {
    let res = send(app, form("/login", None, "username=demo_user&password=demo123")).await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    session_pair(&res)
}

#[tokio::test]
async fn screens_redirect_to_login_without_a_session() {
    let app = app().await;
    for uri in ["/", "/decks", "/progress"] {
        let res = send(&app, get(uri, None)).await;
        assert_eq!(res.status(), StatusCode::SEE_OTHER, "{}", uri);
        assert_eq!(location(&res), "/login");
    }
}

#[tokio::test]
async fn api_rejects_requests_without_a_session() {
    let app = app().await;
    let res = send(&app, get("/api/me", None)).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = send(&app, get("/api/data", Some("session=session_forged"))).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn form_login_sets_cookie_and_opens_home() {
    let app = app().await;
    let res = send(&app, form("/login", None, "username=demo_user&password=demo123")).await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&res), "/");
    let cookie = session_pair(&res);
    assert!(cookie.starts_with("session=session_"));

    let res = send(&app, get("/", Some(&cookie))).await;
    assert_eq!(res.status(), StatusCode::OK);
    let html = body_text(res).await;
    assert!(html.contains("Expand your mind"));
    assert!(html.contains("demo_user"));
}

#[tokio::test]
async fn wrong_password_renders_login_error() {
    let app = app().await;
    let res = send(&app, form("/login", None, "username=demo_user&password=nope")).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert!(res.headers().get(header::SET_COOKIE).is_none());
    let html = body_text(res).await;
    assert!(html.contains("Invalid username or password"));
    assert!(html.contains("demo_user"));
}

#[tokio::test]
async fn login_resumes_on_the_last_visited_screen() {
    let app = app().await;
    let cookie = login(&app).await;
    assert_eq!(send(&app, get("/progress", Some(&cookie))).await.status(), StatusCode::OK);

    let res = send(&app, form("/logout", Some(&cookie), "")).await;
    assert_eq!(location(&res), "/login");
    assert_eq!(send(&app, get("/progress", Some(&cookie))).await.status(), StatusCode::SEE_OTHER);

    let res = send(&app, form("/login", None, "username=demo_user&password=demo123")).await;
    assert_eq!(location(&res), "/progress");
}

#[tokio::test]
async fn decks_screen_lists_seed_decks_and_statuses() {
    let app = app().await;
    let cookie = login(&app).await;

    let html = body_text(send(&app, get("/decks", Some(&cookie))).await).await;
    assert!(html.contains("TypeScript Basics"));
    assert!(html.contains("React Hooks"));
    assert!(!html.contains("status status-"));

    let res = send(&app, form("/decks/statuses", Some(&cookie), "")).await;
    assert_eq!(location(&res), "/decks");

    let html = body_text(send(&app, get("/decks", Some(&cookie))).await).await;
    assert!(html.contains("status status-"));

    let html = body_text(send(&app, get("/decks?notice=study&deck=deck2", Some(&cookie))).await).await;
    assert!(html.contains("class=\"notice\""));
}

#[tokio::test]
async fn calendar_toggle_shows_on_progress_screen() {
    let app = app().await;
    let cookie = login(&app).await;

    let html = body_text(send(&app, get("/progress", Some(&cookie))).await).await;
    assert!(html.contains("<div class=\"figure-value\">3</div><div class=\"figure-label\">Total Sessions"));

    let res = send(
        &app,
        form("/progress/toggle", Some(&cookie), "deck_id=deck2&date=2025-06-02"),
    )
    .await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&res), "/progress");

    let html = body_text(send(&app, get("/progress", Some(&cookie))).await).await;
    assert!(html.contains("<div class=\"figure-value\">4</div><div class=\"figure-label\">Total Sessions"));
    assert!(html.contains("<div class=\"figure-value\">2</div><div class=\"figure-label\">Active Decks"));
    assert!(html.contains("2025-06-02 - HARD session"));
}

#[tokio::test]
async fn toggle_for_unknown_deck_is_not_found() {
    let app = app().await;
    let cookie = login(&app).await;
    let res = send(
        &app,
        form("/progress/toggle", Some(&cookie), "deck_id=deck_missing&date=2025-06-02"),
    )
    .await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn json_api_cycles_a_cell_through_every_difficulty() {
    let app = app().await;
    let res = send(
        &app,
        json_req(
            "POST",
            "/auth/login",
            None,
            json!({"username": "student1", "password": "demo123"}),
        ),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);
    let cookie = session_pair(&res);
    let body: Value = serde_json::from_str(&body_text(res).await).unwrap();
    assert_eq!(body["user"]["username"], "student1");
    assert_eq!(body["lastPage"], "home");

    let toggle = json!({"deckId": "deck2", "date": "2025-06-10"});
    let mut seen = Vec::new();
    for _ in 0..4 {
        let res = send(&app, json_req("POST", "/api/calendar/toggle", Some(&cookie), toggle.clone())).await;
        assert_eq!(res.status(), StatusCode::OK);
        let body: Value = serde_json::from_str(&body_text(res).await).unwrap();
        seen.push(body["session"]["difficulty"].clone());
    }
    assert_eq!(seen, vec![json!("hard"), json!("medium"), json!("easy"), Value::Null]);

    let res = send(&app, get("/api/study-sessions", Some(&cookie))).await;
    let sessions: Value = serde_json::from_str(&body_text(res).await).unwrap();
    assert_eq!(sessions.as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn toggled_session_keeps_cards_and_rate_when_cycled() {
    let app = app().await;
    let cookie = login(&app).await;
    let toggle = json!({"deckId": "deck_1", "date": "2025-06-01"});

    let res = send(&app, json_req("POST", "/api/calendar/toggle", Some(&cookie), toggle)).await;
    let body: Value = serde_json::from_str(&body_text(res).await).unwrap();
    assert_eq!(body["session"]["difficulty"], "medium");
    assert_eq!(body["session"]["cardsStudied"], 10);
    assert_eq!(body["session"]["successRate"], 60);
    assert_eq!(body["averageSuccessRate"], 67);
    assert_eq!(body["totalSessions"], 3);
}

#[tokio::test]
async fn last_page_and_statuses_via_json_api() {
    let app = app().await;
    let cookie = login(&app).await;
    let data: Value = serde_json::from_str(&body_text(send(&app, get("/api/data", Some(&cookie))).await).await).unwrap();
    assert_eq!(data["lastPage"], "home");

    let res = send(&app, json_req("PUT", "/api/last-page", Some(&cookie), json!({"page": "decks"}))).await;
    assert_eq!(res.status(), StatusCode::NO_CONTENT);
    let data: Value = serde_json::from_str(&body_text(send(&app, get("/api/data", Some(&cookie))).await).await).unwrap();
    assert_eq!(data["lastPage"], "decks");
    assert_eq!(data["decks"].as_array().unwrap().len(), 2);

    let stored: Value = serde_json::from_str(&body_text(send(&app, get("/api/deck-statuses", Some(&cookie))).await).await).unwrap();
    assert_eq!(stored, json!([]));

    let res = send(&app, json_req("POST", "/api/deck-statuses/recompute", Some(&cookie), json!({}))).await;
    let fresh: Value = serde_json::from_str(&body_text(res).await).unwrap();
    assert_eq!(fresh.as_array().unwrap().len(), 2);
    let stored: Value = serde_json::from_str(&body_text(send(&app, get("/api/deck-statuses", Some(&cookie))).await).await).unwrap();
    assert_eq!(stored, fresh);
}

#[tokio::test]
async fn reset_clears_session_and_user_data() {
    let kv = Arc::new(MemoryStore::new());
    let app = app_with(kv.clone()).await;
    let cookie = login(&app).await;
    send(&app, get("/progress", Some(&cookie))).await;
    send(&app, form("/decks/statuses", Some(&cookie), "")).await;
    assert!(!kv.is_empty());

    let res = send(&app, json_req("POST", "/api/reset", Some(&cookie), json!({}))).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert!(session_pair(&res).ends_with("session="));
    assert!(kv.is_empty());

    let res = send(&app, get("/api/me", Some(&cookie))).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn saved_session_survives_a_restart() {
    let kv = Arc::new(MemoryStore::new());
    let cookie = login(&app_with(kv.clone()).await).await;

    let restarted = app_with(kv).await;
    let res = send(&restarted, get("/api/me", Some(&cookie))).await;
    assert_eq!(res.status(), StatusCode::OK);
    let me: Value = serde_json::from_str(&body_text(res).await).unwrap();
    assert_eq!(me["username"], "demo_user");
}

#[tokio::test]
async fn openapi_document_is_served() {
    let app = app().await;
    let res = send(&app, get("/api-docs/openapi.json", None)).await;
    assert_eq!(res.status(), StatusCode::OK);
    let doc: Value = serde_json::from_str(&body_text(res).await).unwrap();
    assert!(doc["paths"]["/api/calendar/toggle"].is_object());
}

#[tokio::test]
async fn logout_without_the_session_cookie_keeps_the_session() {
    let app = app().await;
    let cookie = login(&app).await;

    let res = send(&app, form("/logout", None, "")).await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&res), "/login");
    send(&app, form("/logout", Some("session=session_forged"), "")).await;
    let res = send(&app, json_req("POST", "/auth/logout", None, json!({}))).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert!(session_pair(&res).ends_with("session="));

    let res = send(&app, get("/api/me", Some(&cookie))).await;
    assert_eq!(res.status(), StatusCode::OK);

    let res = send(&app, json_req("POST", "/auth/logout", Some(&cookie), json!({}))).await;
    assert_eq!(res.status(), StatusCode::OK);
    let res = send(&app, get("/api/me", Some(&cookie))).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn foreign_cookie_does_not_refresh_session_activity() {
    let state = AppState::with_store(Arc::new(test_config()), Arc::new(MemoryStore::new()))
        .await
        .unwrap();
    let session = state.sessions.login("demo_user", "demo123").await.unwrap();

    let mut headers = HeaderMap::new();
    headers.insert(header::COOKIE, HeaderValue::from_static("session=session_forged"));
    tokio::time::sleep(Duration::from_millis(5)).await;
    assert!(authenticate(&state, &headers).await.is_none());

    let held = state.sessions.current_session().await.unwrap();
    assert_eq!(held.last_activity, session.last_activity);

    let cookie = format!("session={}", session.session_id);
    headers.insert(header::COOKIE, HeaderValue::from_str(&cookie).unwrap());
    assert!(authenticate(&state, &headers).await.is_some());
    let held = state.sessions.current_session().await.unwrap();
    assert!(held.last_activity > session.last_activity);
}

#[tokio::test]
async fn toggle_outside_the_calendar_window_is_rejected() {
    let app = app().await;
    let cookie = login(&app).await;

    let res = send(
        &app,
        json_req(
            "POST",
            "/api/calendar/toggle",
            Some(&cookie),
            json!({"deckId": "deck2", "date": "2025-06-16"}),
        ),
    )
    .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = send(
        &app,
        form("/progress/toggle", Some(&cookie), "deck_id=deck2&date=2025-05-31"),
    )
    .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = send(&app, get("/api/data", Some(&cookie))).await;
    let data: Value = serde_json::from_str(&body_text(res).await).unwrap();
    assert_eq!(data["studySessions"].as_array().unwrap().len(), 3);
}
