use std::sync::Arc;

use axum::extract::{Extension, Json, Path, State};
use axum::http::StatusCode;
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use record_cell::handlers;
use record_cell::models::CreateRecordRequest;
use shared_models::error::AppError;
use shared_utils::test_utils::{MockRows, TestConfig, TestUser};

fn record_request(patient_id: &str) -> CreateRecordRequest {
    CreateRecordRequest {
        patient_id: patient_id.to_string(),
        diagnosis: "Seasonal allergies".to_string(),
        treatment: Some("Antihistamines".to_string()),
        notes: None,
        appointment_id: Some("appt-1".to_string()),
    }
}

#[tokio::test]
async fn test_doctor_creates_record_and_patient_is_notified() {
    let mock_server = MockServer::start().await;
    let config = Arc::new(TestConfig::with_url(&mock_server.uri()));
    let doctor = TestUser::doctor("doc@example.com");

    Mock::given(method("GET"))
        .and(path("/rest/v1/users"))
        .and(query_param("role", "eq.patient"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "id": "pat-1" }])))
        .mount(&mock_server)
        .await;

    let mut row = MockRows::medical_record("rec-1", "pat-1", &doctor.id);
    row["appointment_id"] = json!("appt-1");
    Mock::given(method("POST"))
        .and(path("/rest/v1/medical_records"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([row])))
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/notifications"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([
            MockRows::notification("n-1", "pat-1", "A new medical record was added.", false)
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let result = handlers::create_record(
        State(config),
        Extension(doctor.to_auth_user()),
        Json(record_request("pat-1")),
    )
    .await;

    let (status, Json(record)) = result.expect("record creation should succeed");
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(record.patient_id, "pat-1");
    assert_eq!(record.author_id, doctor.id);
}

#[tokio::test]
async fn test_patient_cannot_create_records() {
    let config = Arc::new(TestConfig::default().to_app_config());
    let patient = TestUser::patient("pat@example.com");

    let result = handlers::create_record(
        State(config),
        Extension(patient.to_auth_user()),
        Json(record_request("pat-1")),
    )
    .await;

    assert!(matches!(result, Err(AppError::Forbidden(_))));
}

#[tokio::test]
async fn test_empty_diagnosis_rejected() {
    let config = Arc::new(TestConfig::default().to_app_config());
    let doctor = TestUser::doctor("doc@example.com");

    let mut request = record_request("pat-1");
    request.diagnosis = "   ".to_string();

    let result = handlers::create_record(
        State(config),
        Extension(doctor.to_auth_user()),
        Json(request),
    )
    .await;

    assert!(matches!(result, Err(AppError::ValidationError(_))));
}

#[tokio::test]
async fn test_record_for_unknown_patient_rejected() {
    let mock_server = MockServer::start().await;
    let config = Arc::new(TestConfig::with_url(&mock_server.uri()));
    let nurse = TestUser::nurse("nurse@example.com");

    Mock::given(method("GET"))
        .and(path("/rest/v1/users"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let result = handlers::create_record(
        State(config),
        Extension(nurse.to_auth_user()),
        Json(record_request("ghost")),
    )
    .await;

    assert!(matches!(result, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn test_patient_reads_own_records() {
    let mock_server = MockServer::start().await;
    let config = Arc::new(TestConfig::with_url(&mock_server.uri()));
    let patient = TestUser::patient("pat@example.com");

    Mock::given(method("GET"))
        .and(path("/rest/v1/medical_records"))
        .and(query_param("patient_id", format!("eq.{}", patient.id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockRows::medical_record("rec-1", &patient.id, "doc-1")
        ])))
        .mount(&mock_server)
        .await;

    let result = handlers::list_own_records(State(config), Extension(patient.to_auth_user())).await;

    let Json(records) = result.expect("listing should succeed");
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].diagnosis, "Seasonal allergies");
}

#[tokio::test]
async fn test_patient_blocked_from_another_patients_records() {
    let config = Arc::new(TestConfig::default().to_app_config());
    let patient = TestUser::patient("pat@example.com");

    let result = handlers::list_patient_records(
        State(config),
        Extension(patient.to_auth_user()),
        Path("someone-else".to_string()),
    )
    .await;

    assert!(matches!(result, Err(AppError::Forbidden(_))));
}

#[tokio::test]
async fn test_doctor_reads_any_patients_records() {
    let mock_server = MockServer::start().await;
    let config = Arc::new(TestConfig::with_url(&mock_server.uri()));
    let doctor = TestUser::doctor("doc@example.com");

    Mock::given(method("GET"))
        .and(path("/rest/v1/medical_records"))
        .and(query_param("patient_id", "eq.pat-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockRows::medical_record("rec-1", "pat-1", &doctor.id)
        ])))
        .mount(&mock_server)
        .await;

    let result = handlers::list_patient_records(
        State(config),
        Extension(doctor.to_auth_user()),
        Path("pat-1".to_string()),
    )
    .await;

    let Json(records) = result.expect("listing should succeed");
    assert_eq!(records.len(), 1);
}
