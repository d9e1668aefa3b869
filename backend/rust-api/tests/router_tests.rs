use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
};
use std::sync::Arc;
use tower::ServiceExt;

use quizdeck_api::middlewares::auth::{JwtClaims, JwtService};
use quizdeck_api::{config::Config, create_router, services::AppState};

const TEST_JWT_SECRET: &str = "router-test-secret";

/// Builds the real router against a Mongo client that is never contacted:
/// every asserted behavior resolves before any store access. The URI
/// points at the discard port so an accidental query fails fast.
async fn create_test_app() -> axum::Router {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();

    let config = Config {
        mongo_uri: "mongodb://127.0.0.1:9/?serverSelectionTimeoutMS=200&connectTimeoutMS=200"
            .to_string(),
        mongo_database: "quizdeck_test".to_string(),
        jwt_secret: TEST_JWT_SECRET.to_string(),
        bind_addr: "127.0.0.1:0".to_string(),
        cookie_secure: false,
        session_ttl_seconds: 3600,
    };

    let mongo_client = mongodb::Client::with_uri_str(&config.mongo_uri)
        .await
        .expect("Mongo client construction is lazy and must not fail");

    let app_state = Arc::new(AppState::new(config, mongo_client));
    create_router(app_state)
}

fn bearer_token(secret: &str, exp_offset_seconds: i64) -> String {
    let now = chrono::Utc::now().timestamp();
    let claims = JwtClaims {
        sub: "665f2f9e8b3e4c1d2a0f9b7c".to_string(),
        exp: (now + exp_offset_seconds) as usize,
        iat: now as usize,
    };
    JwtService::new(secret).generate_token(claims).unwrap()
}

#[tokio::test]
async fn protected_routes_reject_missing_token() {
    let app = create_test_app().await;

    for (method, uri) in [
        ("GET", "/api/v1/quizzes/"),
        ("POST", "/api/v1/quizzes/"),
        ("POST", "/api/v1/sessions/"),
        ("GET", "/api/v1/auth/me"),
        ("POST", "/api/v1/auth/logout"),
    ] {
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method(method)
                    .uri(uri)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(
            response.status(),
            StatusCode::UNAUTHORIZED,
            "{} {} must require auth",
            method,
            uri
        );
    }
}

#[tokio::test]
async fn garbage_token_is_rejected() {
    let app = create_test_app().await;

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/api/v1/quizzes/")
                .header("authorization", "Bearer not-a-jwt")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn expired_token_is_rejected() {
    let app = create_test_app().await;
    let token = bearer_token(TEST_JWT_SECRET, -7200);

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/api/v1/quizzes/")
                .header("authorization", format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn token_signed_with_wrong_secret_is_rejected() {
    let app = create_test_app().await;
    let token = bearer_token("some-other-secret", 3600);

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/api/v1/quizzes/")
                .header("authorization", format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn valid_token_with_malformed_body_fails_in_the_extractor() {
    let app = create_test_app().await;
    let token = bearer_token(TEST_JWT_SECRET, 3600);

    // Auth passes, JSON extraction fails before any handler logic runs.
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/quizzes/")
                .header("authorization", format!("Bearer {}", token))
                .header("content-type", "application/json")
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert!(
        response.status().is_client_error(),
        "unexpected status {}",
        response.status()
    );
}

#[tokio::test]
async fn metrics_endpoint_requires_basic_auth() {
    let app = create_test_app().await;

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/metrics")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn health_reports_degraded_without_a_database() {
    let app = create_test_app().await;

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["status"], "degraded");
    assert_eq!(json["service"], "quizdeck-api");
}
