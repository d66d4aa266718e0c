use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{HeaderMap, Method, Request, StatusCode, header},
};
use serde_json::{Value, json};
use tower::ServiceExt;

use super::{AppState, SharedUserRepository, http_handlers};
use crate::application::user_service::UserService;
use crate::data::repositories::memory::user_repository::InMemoryUserRepository;
use crate::infrastructure::jwt::JwtService;

const SECRET: &str = "0123456789abcdef0123456789abcdef";

struct TestResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Value,
}

impl TestResponse {
    fn etag(&self) -> String {
        self.headers
            .get(header::ETAG)
            .expect("ETag header must be present")
            .to_str()
            .expect("ETag must be ascii")
            .to_string()
    }

    fn token(&self) -> String {
        self.body["user"]["token"]
            .as_str()
            .expect("token must be present")
            .to_string()
    }
}

fn test_app() -> Router {
    let repo: SharedUserRepository = Arc::new(InMemoryUserRepository::new());
    let state = AppState::new(
        Arc::new(UserService::new(repo)),
        Arc::new(JwtService::new(SECRET, 3600)),
    );
    http_handlers::routes(state)
}

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    headers: &[(header::HeaderName, &str)],
    body: Option<Value>,
) -> TestResponse {
    let mut builder = Request::builder().method(method).uri(uri);
    for (name, value) in headers {
        builder = builder.header(name, *value);
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string())),
        None => builder.body(Body::empty()),
    }
    .expect("request must build");

    let response = app
        .clone()
        .oneshot(request)
        .await
        .expect("router is infallible");
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body must be readable");
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("body must be json")
    };

    TestResponse {
        status,
        headers,
        body,
    }
}

async fn register(app: &Router, username: &str, email: &str) -> TestResponse {
    send(
        app,
        Method::POST,
        "/api/users",
        &[],
        Some(json!({
            "user": { "username": username, "email": email, "password": "correct-password" }
        })),
    )
    .await
}

fn bearer(token: &str) -> String {
    format!("Bearer {token}")
}

#[tokio::test]
async fn healthz_is_ok() {
    let app = test_app();
    let res = send(&app, Method::GET, "/healthz", &[], None).await;

    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["status"], "ok");
    assert_eq!(res.body["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn unknown_routes_get_the_error_envelope() {
    let app = test_app();
    let res = send(&app, Method::GET, "/api/articles", &[], None).await;

    assert_eq!(res.status, StatusCode::NOT_FOUND);
    assert_eq!(res.body, json!({ "errors": { "body": ["not found"] } }));
}

#[tokio::test]
async fn register_returns_created_user_with_token_and_etag() {
    let app = test_app();
    let res = register(&app, "jake", "jake@jake.jake").await;

    assert_eq!(res.status, StatusCode::CREATED);
    assert_eq!(res.body["user"]["username"], "jake");
    assert_eq!(res.body["user"]["email"], "jake@jake.jake");
    assert_eq!(res.body["user"]["bio"], Value::Null);
    assert_eq!(res.body["user"]["image"], Value::Null);
    assert!(!res.token().is_empty());
    assert!(res.etag().starts_with('"'));
}

#[tokio::test]
async fn register_reports_every_invalid_field() {
    let app = test_app();
    let res = send(
        &app,
        Method::POST,
        "/api/users",
        &[],
        Some(json!({
            "user": { "username": "valid_user", "email": "not-an-email", "password": "short" }
        })),
    )
    .await;

    assert_eq!(res.status, StatusCode::UNPROCESSABLE_ENTITY);
    let errors = res.body["errors"]
        .as_object()
        .expect("errors must be an object");
    assert_eq!(errors.len(), 2);
    assert!(errors.contains_key("email"));
    assert!(errors.contains_key("password"));
}

#[tokio::test]
async fn register_rejects_duplicate_username() {
    let app = test_app();
    register(&app, "jake", "jake@jake.jake").await;

    let res = register(&app, "jake", "other@jake.jake").await;

    assert_eq!(res.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(res.body["errors"]["username"], json!(["has already been taken"]));
}

#[tokio::test]
async fn register_reports_both_taken_fields() {
    let app = test_app();
    register(&app, "jake", "jake@jake.jake").await;

    let res = register(&app, "jake", "jake@jake.jake").await;

    assert_eq!(res.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(
        res.body,
        json!({
            "errors": {
                "username": ["has already been taken"],
                "email": ["has already been taken"]
            }
        })
    );
}

#[tokio::test]
async fn malformed_body_gets_the_error_envelope() {
    let app = test_app();
    let res = send(
        &app,
        Method::POST,
        "/api/users",
        &[],
        Some(json!({ "user": { "username": "jake" } })),
    )
    .await;

    assert!(res.status.is_client_error());
    let messages = res.body["errors"]["body"]
        .as_array()
        .expect("errors.body must be an array");
    assert_eq!(messages.len(), 1);
}

#[tokio::test]
async fn login_with_unknown_email_is_unauthorized() {
    let app = test_app();
    let res = send(
        &app,
        Method::POST,
        "/api/users/login",
        &[],
        Some(json!({ "user": { "email": "ghost@example.com", "password": "whatever-pw" } })),
    )
    .await;

    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    assert_eq!(res.body, json!({ "errors": { "body": ["unauthorized"] } }));
}

#[tokio::test]
async fn login_returns_user_for_valid_credentials() {
    let app = test_app();
    register(&app, "jake", "jake@jake.jake").await;

    let res = send(
        &app,
        Method::POST,
        "/api/users/login",
        &[],
        Some(json!({ "user": { "email": "jake@jake.jake", "password": "correct-password" } })),
    )
    .await;

    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["user"]["username"], "jake");
    assert!(!res.token().is_empty());
}

#[tokio::test]
async fn current_user_requires_a_valid_token() {
    let app = test_app();

    let missing = send(&app, Method::GET, "/api/user", &[], None).await;
    assert_eq!(missing.status, StatusCode::UNAUTHORIZED);

    let forged = send(
        &app,
        Method::GET,
        "/api/user",
        &[(header::AUTHORIZATION, "Bearer not.a.jwt")],
        None,
    )
    .await;
    assert_eq!(forged.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn current_user_echoes_the_latest_etag() {
    let app = test_app();
    let registered = register(&app, "jake", "jake@jake.jake").await;
    let auth = bearer(&registered.token());

    let res = send(
        &app,
        Method::GET,
        "/api/user",
        &[(header::AUTHORIZATION, &auth)],
        None,
    )
    .await;

    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["user"]["username"], "jake");
    assert_eq!(res.etag(), registered.etag());
}

#[tokio::test]
async fn update_requires_if_match() {
    let app = test_app();
    let registered = register(&app, "jake", "jake@jake.jake").await;
    let auth = bearer(&registered.token());

    let res = send(
        &app,
        Method::PUT,
        "/api/user",
        &[(header::AUTHORIZATION, &auth)],
        Some(json!({ "user": { "bio": "hi" } })),
    )
    .await;

    assert_eq!(res.status, StatusCode::PRECONDITION_REQUIRED);
}

#[tokio::test]
async fn update_rejects_malformed_if_match() {
    let app = test_app();
    let registered = register(&app, "jake", "jake@jake.jake").await;
    let auth = bearer(&registered.token());

    let res = send(
        &app,
        Method::PUT,
        "/api/user",
        &[(header::AUTHORIZATION, &auth), (header::IF_MATCH, "\"garbage\"")],
        Some(json!({ "user": { "bio": "hi" } })),
    )
    .await;

    assert_eq!(res.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn update_with_stale_etag_fails_and_changes_nothing() {
    let app = test_app();
    let registered = register(&app, "jake", "jake@jake.jake").await;
    let auth = bearer(&registered.token());
    let first_etag = registered.etag();

    let first = send(
        &app,
        Method::PUT,
        "/api/user",
        &[(header::AUTHORIZATION, &auth), (header::IF_MATCH, &first_etag)],
        Some(json!({ "user": { "bio": "first", "image": "https://example.com/jake.png" } })),
    )
    .await;
    assert_eq!(first.status, StatusCode::OK);
    assert_eq!(first.body["user"]["bio"], "first");
    assert_eq!(first.body["user"]["image"], "https://example.com/jake.png");
    assert_ne!(first.etag(), first_etag);

    let stale = send(
        &app,
        Method::PUT,
        "/api/user",
        &[(header::AUTHORIZATION, &auth), (header::IF_MATCH, &first_etag)],
        Some(json!({ "user": { "bio": "second" } })),
    )
    .await;
    assert_eq!(stale.status, StatusCode::PRECONDITION_FAILED);

    let current = send(
        &app,
        Method::GET,
        "/api/user",
        &[(header::AUTHORIZATION, &auth)],
        None,
    )
    .await;
    assert_eq!(current.body["user"]["bio"], "first");
    assert_eq!(current.etag(), first.etag());
}

#[tokio::test]
async fn update_validates_changed_fields() {
    let app = test_app();
    let registered = register(&app, "jake", "jake@jake.jake").await;
    let auth = bearer(&registered.token());
    let etag = registered.etag();

    let res = send(
        &app,
        Method::PUT,
        "/api/user",
        &[(header::AUTHORIZATION, &auth), (header::IF_MATCH, &etag)],
        Some(json!({ "user": { "email": "nope", "image": "not a url", "bio": null } })),
    )
    .await;

    assert_eq!(res.status, StatusCode::UNPROCESSABLE_ENTITY);
    let errors = res.body["errors"]
        .as_object()
        .expect("errors must be an object");
    assert!(errors.contains_key("email"));
    assert!(errors.contains_key("image"));
}

#[tokio::test]
async fn empty_update_leaves_the_etag_alone() {
    let app = test_app();
    let registered = register(&app, "jake", "jake@jake.jake").await;
    let auth = bearer(&registered.token());
    let etag = registered.etag();

    let res = send(
        &app,
        Method::PUT,
        "/api/user",
        &[(header::AUTHORIZATION, &auth), (header::IF_MATCH, &etag)],
        Some(json!({ "user": {} })),
    )
    .await;

    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.etag(), etag);
}

#[tokio::test]
async fn wildcard_if_match_updates_the_current_version() {
    let app = test_app();
    let registered = register(&app, "jake", "jake@jake.jake").await;
    let auth = bearer(&registered.token());

    let res = send(
        &app,
        Method::PUT,
        "/api/user",
        &[(header::AUTHORIZATION, &auth), (header::IF_MATCH, "*")],
        Some(json!({ "user": { "bio": "any version" } })),
    )
    .await;

    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["user"]["bio"], "any version");
    assert_ne!(res.etag(), registered.etag());
}
