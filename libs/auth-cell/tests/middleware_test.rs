use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use auth_cell::router::auth_routes;
use shared_utils::test_utils::{JwtTestUtils, MockRows, TestConfig, TestUser};

fn get_profile_request(auth_header: Option<String>) -> Request<Body> {
    let mut builder = Request::builder().uri("/profile").method("GET");
    if let Some(header) = auth_header {
        builder = builder.header("Authorization", header);
    }
    builder.body(Body::empty()).unwrap()
}

#[tokio::test]
async fn test_protected_route_without_token_is_unauthorized() {
    let app = auth_routes(Arc::new(TestConfig::default().to_app_config()));

    let response = app.oneshot(get_profile_request(None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_malformed_token_is_unauthorized() {
    let app = auth_routes(Arc::new(TestConfig::default().to_app_config()));

    let token = JwtTestUtils::create_malformed_token();
    let response = app
        .oneshot(get_profile_request(Some(format!("Bearer {}", token))))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_expired_token_is_unauthorized() {
    let config = TestConfig::default();
    let app = auth_routes(Arc::new(config.to_app_config()));

    let user = TestUser::patient("pat@example.com");
    let token = JwtTestUtils::create_expired_token(&user, &config.jwt_secret);
    let response = app
        .oneshot(get_profile_request(Some(format!("Bearer {}", token))))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_wrongly_signed_token_is_unauthorized() {
    let app = auth_routes(Arc::new(TestConfig::default().to_app_config()));

    let user = TestUser::patient("pat@example.com");
    let token = JwtTestUtils::create_invalid_signature_token(&user);
    let response = app
        .oneshot(get_profile_request(Some(format!("Bearer {}", token))))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_valid_token_reaches_the_handler() {
    let mock_server = MockServer::start().await;
    let config = TestConfig {
        supabase_url: mock_server.uri(),
        ..TestConfig::default()
    };

    let user = TestUser::patient("pat@example.com");
    Mock::given(method("GET"))
        .and(path("/rest/v1/users"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([MockRows::user(
            &user.id,
            "pat@example.com",
            "patient"
        )])))
        .mount(&mock_server)
        .await;

    let app = auth_routes(Arc::new(config.to_app_config()));
    let token = JwtTestUtils::create_test_token(&user, &config.jwt_secret, None);
    let response = app
        .oneshot(get_profile_request(Some(format!("Bearer {}", token))))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["id"], json!(user.id));
}

#[tokio::test]
async fn test_validate_endpoint_reports_claims() {
    let config = TestConfig::default();
    let app = auth_routes(Arc::new(config.to_app_config()));

    let user = TestUser::doctor("doc@example.com");
    let token = JwtTestUtils::create_test_token(&user, &config.jwt_secret, Some(1));
    let request = Request::builder()
        .uri("/validate")
        .method("POST")
        .header("Authorization", format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["valid"], json!(true));
    assert_eq!(body["user_id"], json!(user.id));
    assert_eq!(body["role"], json!("doctor"));
}
