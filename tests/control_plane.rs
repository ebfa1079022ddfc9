use std::sync::Arc;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode},
};
use pugbot::{
    backend::RecordingBackend,
    config::AppConfig,
    routes,
    state::{AppState, SharedState},
};
use serde_json::{Value, json};
use tower::ServiceExt;

const BOT: u64 = 900;
const OWNER: u64 = 1;

fn app_with(config: AppConfig) -> (Router, SharedState, RecordingBackend) {
    let backend = RecordingBackend::new(BOT);
    let state = AppState::new(Arc::new(backend.clone()), config);
    (routes::router(state.clone()), state, backend)
}

fn app() -> (Router, SharedState, RecordingBackend) {
    app_with(AppConfig {
        owner_id: Some(OWNER),
        ..AppConfig::default()
    })
}

fn post(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn healthcheck_reports_sessions() {
    let (router, _, _) = app();
    let response = router
        .oneshot(Request::get("/healthcheck").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["sessions"], 0);
}

#[tokio::test]
async fn start_twice_conflicts() {
    let (router, _, backend) = app();
    let command = json!({ "channel_id": 10, "user_id": 5 });

    let response = router
        .clone()
        .oneshot(post("/commands/start", command.clone()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["phase"], "idle");
    assert_eq!(backend.count("send"), 1);

    let response = router
        .oneshot(post("/commands/start", command))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn stop_without_pug_conflicts() {
    let (router, _, _) = app();
    let response = router
        .oneshot(post("/commands/stop", json!({ "channel_id": 10, "user_id": OWNER })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn poke_is_owner_only() {
    let (router, _, _) = app();
    router
        .clone()
        .oneshot(post("/commands/start", json!({ "channel_id": 10, "user_id": 5 })))
        .await
        .unwrap();

    let response = router
        .clone()
        .oneshot(post("/commands/poke", json!({ "channel_id": 10, "user_id": 5 })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = router
        .oneshot(post("/commands/poke", json!({ "channel_id": 10, "user_id": OWNER })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn invalid_payloads_are_rejected() {
    let (router, _, _) = app();
    let response = router
        .clone()
        .oneshot(post("/commands/start", json!({ "channel_id": 0, "user_id": 5 })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = router
        .oneshot(post(
            "/events/reaction",
            json!({ "channel_id": 10, "message_id": 1, "user_id": 5, "emoji": "", "kind": "add" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn reactions_from_the_bot_are_not_accepted() {
    let (router, state, _) = app();
    router
        .clone()
        .oneshot(post("/commands/start", json!({ "channel_id": 10, "user_id": 5 })))
        .await
        .unwrap();
    let main = state
        .session(10)
        .unwrap()
        .lock()
        .await
        .main_message_id()
        .unwrap();

    let event = |user_id: u64| {
        json!({ "channel_id": 10, "message_id": main, "user_id": user_id, "emoji": "x", "kind": "add" })
    };
    let response = router
        .clone()
        .oneshot(post("/events/reaction", event(BOT)))
        .await
        .unwrap();
    assert_eq!(json_body(response).await["accepted"], false);

    let response = router
        .oneshot(post("/events/reaction", event(7)))
        .await
        .unwrap();
    assert_eq!(json_body(response).await["accepted"], true);
}

#[tokio::test]
async fn control_token_is_enforced_when_configured() {
    let (router, _, _) = app_with(AppConfig {
        owner_id: Some(OWNER),
        control_token: Some("hunter2".into()),
        ..AppConfig::default()
    });

    let response = router
        .clone()
        .oneshot(Request::get("/status").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = router
        .oneshot(
            Request::get("/status")
                .header("x-control-token", "hunter2")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        json_body(response).await["summary"],
        "Not active in any channels."
    );
}

#[tokio::test]
async fn openapi_document_is_served() {
    let (router, _, _) = app();
    let response = router
        .oneshot(
            Request::get(routes::docs::OPENAPI_PATH)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert!(body["paths"]["/commands/start"].is_object());
}
