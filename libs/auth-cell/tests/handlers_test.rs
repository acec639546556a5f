use std::sync::Arc;

use axum::extract::{Extension, Json, State};
use axum::http::StatusCode;
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use auth_cell::handlers;
use auth_cell::models::{LoginRequest, SignupRequest, UpdateProfileRequest};
use auth_cell::services::password::hash_password;
use shared_models::auth::UserRole;
use shared_models::error::AppError;
use shared_utils::test_utils::{MockRows, TestConfig, TestUser};

fn signup_request(role: UserRole, email: &str) -> SignupRequest {
    SignupRequest {
        full_name: "Casey Morgan".to_string(),
        email: email.to_string(),
        password: "a-long-enough-password".to_string(),
        role,
        phone: Some("555-0100".to_string()),
        specialty: Some("Dermatology".to_string()),
        department: Some("Triage".to_string()),
        shift: Some("night".to_string()),
        supervising_doctor_id: None,
    }
}

#[tokio::test]
async fn test_signup_creates_account() {
    let mock_server = MockServer::start().await;
    let config = Arc::new(TestConfig::with_url(&mock_server.uri()));

    Mock::given(method("GET"))
        .and(path("/rest/v1/users"))
        .and(query_param("email", "eq.casey@example.com"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/users"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([MockRows::user(
            "user-1",
            "casey@example.com",
            "patient"
        )])))
        .mount(&mock_server)
        .await;

    let result = handlers::signup(
        State(config),
        Json(signup_request(UserRole::Patient, "casey@example.com")),
    )
    .await;

    let (status, Json(profile)) = result.expect("signup should succeed");
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(profile.email, "casey@example.com");
    assert_eq!(profile.role, UserRole::Patient);
}

#[tokio::test]
async fn test_doctor_signup_seeds_default_schedule() {
    let mock_server = MockServer::start().await;
    let config = Arc::new(TestConfig::with_url(&mock_server.uri()));

    Mock::given(method("GET"))
        .and(path("/rest/v1/users"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/users"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([MockRows::user(
            "doc-1",
            "casey@example.com",
            "doctor"
        )])))
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/availability_slots"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([
            MockRows::availability_slot("slot-1", "doc-1", "2026-09-01", "09:00:00", "09:30:00")
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let result = handlers::signup(
        State(config),
        Json(signup_request(UserRole::Doctor, "casey@example.com")),
    )
    .await;

    let (status, Json(profile)) = result.expect("signup should succeed");
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(profile.role, UserRole::Doctor);
}

#[tokio::test]
async fn test_signup_rejects_duplicate_email() {
    let mock_server = MockServer::start().await;
    let config = Arc::new(TestConfig::with_url(&mock_server.uri()));

    Mock::given(method("GET"))
        .and(path("/rest/v1/users"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([{ "id": "existing-user" }])),
        )
        .mount(&mock_server)
        .await;

    let result = handlers::signup(
        State(config),
        Json(signup_request(UserRole::Patient, "casey@example.com")),
    )
    .await;

    assert!(matches!(result, Err(AppError::Conflict(_))));
}

#[tokio::test]
async fn test_signup_rejects_invalid_email() {
    let config = Arc::new(TestConfig::default().to_app_config());

    let result = handlers::signup(
        State(config),
        Json(signup_request(UserRole::Patient, "not-an-email")),
    )
    .await;

    assert!(matches!(result, Err(AppError::ValidationError(_))));
}

#[tokio::test]
async fn test_signup_rejects_short_password() {
    let config = Arc::new(TestConfig::default().to_app_config());

    let mut request = signup_request(UserRole::Patient, "casey@example.com");
    request.password = "short".to_string();

    let result = handlers::signup(State(config), Json(request)).await;
    assert!(matches!(result, Err(AppError::ValidationError(_))));
}

#[tokio::test]
async fn test_signup_doctor_without_specialty_rejected() {
    let config = Arc::new(TestConfig::default().to_app_config());

    let mut request = signup_request(UserRole::Doctor, "doc@example.com");
    request.specialty = None;

    let result = handlers::signup(State(config), Json(request)).await;
    assert!(matches!(result, Err(AppError::ValidationError(_))));
}

#[tokio::test]
async fn test_login_returns_token_and_profile() {
    let mock_server = MockServer::start().await;
    let config = Arc::new(TestConfig::with_url(&mock_server.uri()));

    let mut row = MockRows::user("user-1", "casey@example.com", "patient");
    row["password_hash"] = json!(hash_password("a-long-enough-password").unwrap());

    Mock::given(method("GET"))
        .and(path("/rest/v1/users"))
        .and(query_param("email", "eq.casey@example.com"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([row])))
        .mount(&mock_server)
        .await;

    let result = handlers::login(
        State(config.clone()),
        Json(LoginRequest {
            email: "casey@example.com".to_string(),
            password: "a-long-enough-password".to_string(),
        }),
    )
    .await;

    let Json(response) = result.expect("login should succeed");
    assert!(!response.token.is_empty());
    assert_eq!(response.token.split('.').count(), 3);
    assert_eq!(response.user.id, "user-1");

    let validated =
        shared_utils::jwt::validate_token(&response.token, &config.supabase_jwt_secret).unwrap();
    assert_eq!(validated.id, "user-1");
    assert_eq!(validated.role, Some(UserRole::Patient));
}

#[tokio::test]
async fn test_login_rejects_wrong_password() {
    let mock_server = MockServer::start().await;
    let config = Arc::new(TestConfig::with_url(&mock_server.uri()));

    let mut row = MockRows::user("user-1", "casey@example.com", "patient");
    row["password_hash"] = json!(hash_password("the-real-password").unwrap());

    Mock::given(method("GET"))
        .and(path("/rest/v1/users"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([row])))
        .mount(&mock_server)
        .await;

    let result = handlers::login(
        State(config),
        Json(LoginRequest {
            email: "casey@example.com".to_string(),
            password: "a-wrong-password".to_string(),
        }),
    )
    .await;

    assert!(matches!(result, Err(AppError::Auth(_))));
}

#[tokio::test]
async fn test_login_rejects_unknown_email() {
    let mock_server = MockServer::start().await;
    let config = Arc::new(TestConfig::with_url(&mock_server.uri()));

    Mock::given(method("GET"))
        .and(path("/rest/v1/users"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let result = handlers::login(
        State(config),
        Json(LoginRequest {
            email: "nobody@example.com".to_string(),
            password: "whatever-password".to_string(),
        }),
    )
    .await;

    assert!(matches!(result, Err(AppError::Auth(_))));
}

#[tokio::test]
async fn test_login_rejects_deactivated_account() {
    let mock_server = MockServer::start().await;
    let config = Arc::new(TestConfig::with_url(&mock_server.uri()));

    let mut row = MockRows::user("user-1", "casey@example.com", "patient");
    row["password_hash"] = json!(hash_password("a-long-enough-password").unwrap());
    row["is_active"] = json!(false);

    Mock::given(method("GET"))
        .and(path("/rest/v1/users"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([row])))
        .mount(&mock_server)
        .await;

    let result = handlers::login(
        State(config),
        Json(LoginRequest {
            email: "casey@example.com".to_string(),
            password: "a-long-enough-password".to_string(),
        }),
    )
    .await;

    assert!(matches!(result, Err(AppError::Auth(_))));
}

#[tokio::test]
async fn test_get_profile_returns_own_row() {
    let mock_server = MockServer::start().await;
    let config = Arc::new(TestConfig::with_url(&mock_server.uri()));
    let user = TestUser::doctor("doc@example.com");

    Mock::given(method("GET"))
        .and(path("/rest/v1/users"))
        .and(query_param("id", format!("eq.{}", user.id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([MockRows::user(
            &user.id,
            "doc@example.com",
            "doctor"
        )])))
        .mount(&mock_server)
        .await;

    let result = handlers::get_profile(State(config), Extension(user.to_auth_user())).await;

    let Json(profile) = result.expect("profile lookup should succeed");
    assert_eq!(profile.id, user.id);
    assert_eq!(profile.specialty.as_deref(), Some("General Practice"));
}

#[tokio::test]
async fn test_update_profile_patches_fields() {
    let mock_server = MockServer::start().await;
    let config = Arc::new(TestConfig::with_url(&mock_server.uri()));
    let user = TestUser::patient("pat@example.com");

    let mut updated = MockRows::user(&user.id, "pat@example.com", "patient");
    updated["full_name"] = json!("Casey Updated");

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/users"))
        .and(body_partial_json(json!({ "full_name": "Casey Updated" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([updated])))
        .mount(&mock_server)
        .await;

    let result = handlers::update_profile(
        State(config),
        Extension(user.to_auth_user()),
        Json(UpdateProfileRequest {
            full_name: Some("Casey Updated".to_string()),
            phone: None,
            specialty: None,
            department: None,
            shift: None,
        }),
    )
    .await;

    let Json(profile) = result.expect("update should succeed");
    assert_eq!(profile.full_name, "Casey Updated");
}

#[tokio::test]
async fn test_update_profile_with_no_fields_rejected() {
    let config = Arc::new(TestConfig::default().to_app_config());
    let user = TestUser::patient("pat@example.com");

    let result = handlers::update_profile(
        State(config),
        Extension(user.to_auth_user()),
        Json(UpdateProfileRequest {
            full_name: None,
            phone: None,
            specialty: None,
            department: None,
            shift: None,
        }),
    )
    .await;

    assert!(matches!(result, Err(AppError::BadRequest(_))));
}
