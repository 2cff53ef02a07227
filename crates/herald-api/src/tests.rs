use std::collections::HashSet;
use std::sync::Arc;

use argon2::{
    Algorithm, Argon2, Params, PasswordHasher, Version,
    password_hash::{SaltString, rand_core::OsRng},
};
use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use chrono::Utc;
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use herald_broadcast::{
    DeliveryChannel, DeliveryError, Dispatcher, HandlerError, IngressAdapter, NoPacing,
    UpdateHandler,
};
use herald_db::Database;
use herald_telegram::BotApi;
use herald_types::models::RecipientId;
use herald_types::telegram::Update;

use crate::auth::create_test_token;
use crate::state::{AppStateInner, AuthSettings, WebhookSettings};
use crate::webhook::SECRET_TOKEN_HEADER;
use crate::{AppState, router};

const PASSWORD: &str = "letmein";
const JWT_SECRET: &str = "test-secret";

struct NoopHandler;

#[async_trait]
impl UpdateHandler for NoopHandler {
    async fn handle(&self, _update: &Update) -> Result<(), HandlerError> {
        Ok(())
    }
}

struct FakeChannel {
    failing: HashSet<RecipientId>,
}

#[async_trait]
impl DeliveryChannel for FakeChannel {
    async fn deliver(&self, recipient: RecipientId, _text: &str) -> Result<(), DeliveryError> {
        if self.failing.contains(&recipient) {
            Err(DeliveryError::RecipientBlocked)
        } else {
            Ok(())
        }
    }
}

fn cheap_hash(password: &str) -> String {
    let argon = Argon2::new(
        Algorithm::Argon2id,
        Version::V0x13,
        Params::new(8, 1, 1, None).unwrap(),
    );
    argon
        .hash_password(password.as_bytes(), &SaltString::generate(&mut OsRng))
        .unwrap()
        .to_string()
}

fn test_state(failing: &[i64], webhook: WebhookSettings) -> AppState {
    let db = Arc::new(Database::open_in_memory().unwrap());
    let channel = Arc::new(FakeChannel {
        failing: failing.iter().copied().map(RecipientId).collect(),
    });
    let dispatcher = Dispatcher::new(db.clone(), db.clone(), channel, Arc::new(NoPacing));
    let ingress = IngressAdapter::new(db.clone(), Arc::new(NoopHandler));
    let bot = Arc::new(BotApi::new("http://127.0.0.1:9", "0:test").unwrap());

    Arc::new(AppStateInner {
        db,
        dispatcher,
        ingress,
        bot,
        auth: AuthSettings {
            password_hash: cheap_hash(PASSWORD),
            jwt_secret: JWT_SECRET.into(),
            token_ttl: chrono::Duration::hours(1),
        },
        webhook,
    })
}

fn token() -> String {
    create_test_token(JWT_SECRET, chrono::Duration::hours(1))
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    let body = serde_json::from_slice(&bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));
    (status, body)
}

fn authed(method: &str, uri: &str, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token()));
    match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

fn webhook_request(user_id: i64, name: &str, secret: Option<&str>) -> Request<Body> {
    let update = json!({
        "update_id": 1,
        "message": {
            "message_id": 1,
            "from": {"id": user_id, "is_bot": false, "first_name": name},
            "chat": {"id": user_id, "type": "private"},
            "date": 1_700_000_000,
            "text": "/start"
        }
    });
    let mut builder = Request::builder()
        .method("POST")
        .uri("/webhook")
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(secret) = secret {
        builder = builder.header(SECRET_TOKEN_HEADER, secret);
    }
    builder.body(Body::from(update.to_string())).unwrap()
}

#[tokio::test]
async fn root_is_public() {
    let app = router(test_state(&[], WebhookSettings::default()));
    let (status, body) = send(&app, Request::get("/").body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Value::String("Bot Running".into()));
}

#[tokio::test]
async fn protected_routes_require_token() {
    let app = router(test_state(&[], WebhookSettings::default()));

    let (status, _) = send(&app, Request::get("/dashboard").body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let bad = Request::get("/recipients")
        .header(header::AUTHORIZATION, "Bearer not-a-jwt")
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&app, bad).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn expired_token_is_rejected() {
    let app = router(test_state(&[], WebhookSettings::default()));
    let expired = create_test_token(JWT_SECRET, chrono::Duration::minutes(-10));
    let req = Request::get("/dashboard")
        .header(header::AUTHORIZATION, format!("Bearer {}", expired))
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&app, req).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn login_issues_working_token() {
    let state = test_state(&[], WebhookSettings::default());
    let app = router(state.clone());

    let login = |password: &str| {
        Request::post("/auth/login")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json!({ "password": password }).to_string()))
            .unwrap()
    };

    let (status, _) = send(&app, login("wrong")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = send(&app, login(PASSWORD)).await;
    assert_eq!(status, StatusCode::OK);
    let token = body["token"].as_str().unwrap().to_string();

    let req = Request::get("/dashboard")
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["recipients"], 0);

    let actions = state.db.recent_actions(10).unwrap();
    assert_eq!(actions[0].action, "operator login");
}

#[tokio::test]
async fn webhook_registers_sender() {
    let app = router(test_state(&[], WebhookSettings::default()));

    let (status, body) = send(&app, webhook_request(42, "Huda", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Value::String("OK".into()));

    let (status, body) = send(&app, authed("GET", "/recipients", None)).await;
    assert_eq!(status, StatusCode::OK);
    let list = body.as_array().unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0]["id"], 42);
    assert_eq!(list[0]["display_name"], "Huda");
    assert_eq!(list[0]["blocked"], false);
}

#[tokio::test]
async fn webhook_secret_is_enforced() {
    let state = test_state(
        &[],
        WebhookSettings {
            public_url: None,
            secret: Some("hook-secret".into()),
        },
    );
    let app = router(state.clone());

    let (status, _) = send(&app, webhook_request(1, "a", None)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = send(&app, webhook_request(1, "a", Some("wrong"))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(state.db.count_recipients().unwrap(), 0);

    let (status, _) = send(&app, webhook_request(1, "a", Some("hook-secret"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(state.db.count_recipients().unwrap(), 1);
}

#[tokio::test]
async fn broadcast_reports_counts_and_is_logged() {
    let state = test_state(&[2], WebhookSettings::default());
    for id in [1, 2, 3] {
        state
            .db
            .insert_recipient_if_absent(RecipientId(id), "r", Utc::now())
            .unwrap();
    }
    let app = router(state.clone());

    let (status, run) = send(
        &app,
        authed("POST", "/broadcasts", Some(json!({ "message": "hello" }))),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(run["success_count"], 2);
    assert_eq!(run["failed_count"], 1);
    assert_eq!(run["message"], "hello");

    let (status, recent) = send(&app, authed("GET", "/broadcasts?limit=5", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(recent.as_array().unwrap().len(), 1);
    assert_eq!(recent[0]["id"], run["id"]);

    let (_, logs) = send(&app, authed("GET", "/logs", None)).await;
    let action = logs[0]["action"].as_str().unwrap();
    assert!(action.starts_with("broadcast #"), "got {}", action);

    let (_, stats) = send(&app, authed("GET", "/dashboard", None)).await;
    assert_eq!(stats["broadcasts"], 1);
    assert_eq!(stats["total_success"], 2);
    assert_eq!(stats["total_failed"], 1);
}

#[tokio::test]
async fn empty_broadcast_is_rejected() {
    let state = test_state(&[], WebhookSettings::default());
    let app = router(state.clone());

    let (status, body) = send(
        &app,
        authed("POST", "/broadcasts", Some(json!({ "message": "   " }))),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("empty"));
    assert!(state.db.recent_broadcasts(10).unwrap().is_empty());
}

#[tokio::test]
async fn blocked_recipients_are_skipped_by_broadcast() {
    let state = test_state(&[], WebhookSettings::default());
    for id in [1, 2] {
        state
            .db
            .insert_recipient_if_absent(RecipientId(id), "r", Utc::now())
            .unwrap();
    }
    let app = router(state);

    let (status, body) = send(&app, authed("POST", "/recipients/2/block", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["blocked"], true);

    let (_, run) = send(
        &app,
        authed("POST", "/broadcasts", Some(json!({ "message": "m" }))),
    )
    .await;
    assert_eq!(run["success_count"], 1);
    assert_eq!(run["failed_count"], 0);

    let (status, _) = send(&app, authed("POST", "/recipients/2/unblock", None)).await;
    assert_eq!(status, StatusCode::OK);
    let (_, run) = send(
        &app,
        authed("POST", "/broadcasts", Some(json!({ "message": "m" }))),
    )
    .await;
    assert_eq!(run["success_count"], 2);
}

#[tokio::test]
async fn block_unknown_recipient_is_not_found() {
    let app = router(test_state(&[], WebhookSettings::default()));
    let (status, _) = send(&app, authed("POST", "/recipients/999/block", None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn remove_recipient_is_idempotent() {
    let state = test_state(&[], WebhookSettings::default());
    state
        .db
        .insert_recipient_if_absent(RecipientId(5), "r", Utc::now())
        .unwrap();
    let app = router(state.clone());

    let (status, _) = send(&app, authed("DELETE", "/recipients/5", None)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send(&app, authed("DELETE", "/recipients/5", None)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(state.db.count_recipients().unwrap(), 0);
}

#[tokio::test]
async fn set_webhook_requires_public_url() {
    let app = router(test_state(&[], WebhookSettings::default()));
    let (status, _) = send(&app, authed("POST", "/webhook/set", None)).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[test]
fn webhook_endpoint_joins_path() {
    let settings = WebhookSettings {
        public_url: Some("https://bot.example.org/".into()),
        secret: None,
    };
    assert_eq!(
        settings.endpoint().as_deref(),
        Some("https://bot.example.org/webhook")
    );
}
