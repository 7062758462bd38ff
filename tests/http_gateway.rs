use anyhow::{Context, Result};
use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Method, Request, StatusCode, header},
    response::Response,
};
use enirejo::{
    api,
    backend::{DocumentStore, MemoryDocumentStore, MemoryIdentityProvider},
    gateway::AccountGateway,
};
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt;

const ORIGIN: &str = "http://localhost:3000";

struct TestApp {
    router: Router,
    store: Arc<MemoryDocumentStore>,
}

fn test_app() -> Result<TestApp> {
    let store = Arc::new(MemoryDocumentStore::new());
    let gateway = AccountGateway::new(Arc::new(MemoryIdentityProvider::new()), store.clone());
    let router = api::app(Arc::new(gateway), ORIGIN)?;
    Ok(TestApp { router, store })
}

async fn send(router: &Router, request: Request<Body>) -> Result<Response> {
    Ok(router.clone().oneshot(request).await?)
}

async fn post_json(router: &Router, path: &str, body: &Value) -> Result<(StatusCode, Value)> {
    let request = Request::builder()
        .method(Method::POST)
        .uri(path)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))?;
    let response = send(router, request).await?;
    let status = response.status();
    Ok((status, json_body(response).await?))
}

async fn json_body(response: Response) -> Result<Value> {
    let bytes = to_bytes(response.into_body(), usize::MAX).await?;
    serde_json::from_slice(&bytes).context("response body is not JSON")
}

async fn signup(router: &Router, email: &str, role: &str) -> Result<String> {
    let (status, body) = post_json(
        router,
        "/signup",
        &json!({ "email": email, "password": "secret123", "role": role }),
    )
    .await?;
    assert_eq!(status, StatusCode::CREATED, "unexpected body: {body}");
    body["uid"]
        .as_str()
        .map(str::to_string)
        .context("signup response without uid")
}

#[tokio::test]
async fn signup_creates_record_under_uid() -> Result<()> {
    let app = test_app()?;

    let (status, body) = post_json(
        &app.router,
        "/signup",
        &json!({ "email": "ana@example.com", "password": "secret123", "role": "admin" }),
    )
    .await?;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["message"], "User created");
    let uid = body["uid"].as_str().context("uid")?;

    let document = app
        .store
        .get("users", uid)
        .await?
        .context("record stored under uid")?;
    assert_eq!(document.get_str("email"), Some("ana@example.com"));
    assert_eq!(document.get_str("role"), Some("admin"));
    assert!(document.get_str("createdAt").is_some());
    assert!(document.data.get("password").is_none());
    Ok(())
}

#[tokio::test]
async fn signup_rejects_missing_fields_and_none_role() -> Result<()> {
    let app = test_app()?;

    for body in [
        json!({ "password": "secret123", "role": "admin" }),
        json!({ "email": "ana@example.com", "role": "admin" }),
        json!({ "email": "ana@example.com", "password": "secret123" }),
        json!({ "email": "ana@example.com", "password": "secret123", "role": "none" }),
        json!({ "email": "", "password": "secret123", "role": "admin" }),
    ] {
        let (status, response) = post_json(&app.router, "/signup", &body).await?;
        assert_eq!(status, StatusCode::BAD_REQUEST, "body: {body}");
        assert_eq!(response, json!({ "error": "Invalid input data" }));
    }

    assert_eq!(app.store.count("users").await, 0);
    Ok(())
}

#[tokio::test]
async fn signup_with_unreadable_body_is_invalid_input() -> Result<()> {
    let app = test_app()?;

    let request = Request::builder()
        .method(Method::POST)
        .uri("/signup")
        .header(header::CONTENT_TYPE, "text/plain")
        .body(Body::from("email=ana@example.com"))?;
    let response = send(&app.router, request).await?;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        json_body(response).await?,
        json!({ "error": "Invalid input data" })
    );
    Ok(())
}

#[tokio::test]
async fn signup_duplicate_email_is_rejected() -> Result<()> {
    let app = test_app()?;
    signup(&app.router, "ana@example.com", "admin").await?;

    let (status, body) = post_json(
        &app.router,
        "/signup",
        &json!({ "email": "ana@example.com", "password": "other-secret", "role": "viewer" }),
    )
    .await?;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "error": "User already exists" }));
    assert_eq!(app.store.count("users").await, 1);
    Ok(())
}

#[tokio::test]
async fn signup_surfaces_identity_provider_message() -> Result<()> {
    let app = test_app()?;

    let (status, body) = post_json(
        &app.router,
        "/signup",
        &json!({ "email": "ana@example.com", "password": "123", "role": "admin" }),
    )
    .await?;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let message = body["error"].as_str().context("error message")?;
    assert!(message.starts_with("WEAK_PASSWORD"), "message: {message}");
    assert_eq!(app.store.count("users").await, 0);
    Ok(())
}

#[tokio::test]
async fn login_returns_stored_role() -> Result<()> {
    let app = test_app()?;
    signup(&app.router, "ana@example.com", "editor").await?;

    let (status, body) = post_json(
        &app.router,
        "/login",
        &json!({ "email": "ana@example.com", "password": "anything" }),
    )
    .await?;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({ "message": "Login successful", "role": "editor" })
    );
    Ok(())
}

#[tokio::test]
async fn login_unknown_email_is_unauthorized() -> Result<()> {
    let app = test_app()?;

    let (status, body) =
        post_json(&app.router, "/login", &json!({ "email": "ghost@example.com" })).await?;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, json!({ "error": "User not found" }));
    Ok(())
}

#[tokio::test]
async fn login_without_email_is_bad_request() -> Result<()> {
    let app = test_app()?;

    let (status, body) = post_json(&app.router, "/login", &json!({ "password": "x" })).await?;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "error": "Missing email" }));
    Ok(())
}

#[tokio::test]
async fn health_reports_store_status() -> Result<()> {
    let app = test_app()?;

    let request = Request::builder()
        .method(Method::GET)
        .uri("/health")
        .body(Body::empty())?;
    let response = send(&app.router, request).await?;

    assert_eq!(response.status(), StatusCode::OK);
    let x_app = response
        .headers()
        .get("x-app")
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
        .context("x-app header")?;
    assert!(x_app.starts_with(&format!("enirejo:{}:", env!("CARGO_PKG_VERSION"))));

    let body = json_body(response).await?;
    assert_eq!(body["name"], "enirejo");
    assert_eq!(body["store"], "ok");
    Ok(())
}

#[tokio::test]
async fn health_options_has_empty_body() -> Result<()> {
    let app = test_app()?;

    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri("/health")
        .body(Body::empty())?;
    let response = send(&app.router, request).await?;

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await?;
    assert!(bytes.is_empty());
    Ok(())
}

#[tokio::test]
async fn cors_allows_configured_origin_with_credentials() -> Result<()> {
    let app = test_app()?;

    let request = Request::builder()
        .method(Method::POST)
        .uri("/login")
        .header(header::ORIGIN, ORIGIN)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(json!({ "email": "ghost@example.com" }).to_string()))?;
    let response = send(&app.router, request).await?;

    let headers = response.headers();
    assert_eq!(
        headers
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .and_then(|v| v.to_str().ok()),
        Some(ORIGIN)
    );
    assert_eq!(
        headers
            .get(header::ACCESS_CONTROL_ALLOW_CREDENTIALS)
            .and_then(|v| v.to_str().ok()),
        Some("true")
    );
    Ok(())
}

#[tokio::test]
async fn cors_ignores_other_origins() -> Result<()> {
    let app = test_app()?;

    let request = Request::builder()
        .method(Method::POST)
        .uri("/login")
        .header(header::ORIGIN, "https://evil.example.com")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(json!({ "email": "ghost@example.com" }).to_string()))?;
    let response = send(&app.router, request).await?;

    assert!(
        response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .is_none()
    );
    Ok(())
}

#[tokio::test]
async fn request_id_is_propagated() -> Result<()> {
    let app = test_app()?;

    let request = Request::builder()
        .method(Method::GET)
        .uri("/health")
        .header("x-request-id", "req-123")
        .body(Body::empty())?;
    let response = send(&app.router, request).await?;

    assert_eq!(
        response
            .headers()
            .get("x-request-id")
            .and_then(|v| v.to_str().ok()),
        Some("req-123")
    );

    let request = Request::builder()
        .method(Method::GET)
        .uri("/health")
        .body(Body::empty())?;
    let response = send(&app.router, request).await?;
    assert!(response.headers().get("x-request-id").is_some());
    Ok(())
}

#[test]
fn invalid_allowed_origin_is_rejected() {
    let gateway = AccountGateway::new(
        Arc::new(MemoryIdentityProvider::new()),
        Arc::new(MemoryDocumentStore::new()),
    );
    assert!(api::app(Arc::new(gateway), "not a url").is_err());
}
