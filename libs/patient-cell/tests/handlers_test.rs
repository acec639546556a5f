use std::sync::Arc;

use axum::extract::{Extension, Json, Path, State};
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use patient_cell::handlers;
use shared_models::error::AppError;
use shared_utils::test_utils::{MockRows, TestConfig, TestUser};

#[tokio::test]
async fn test_nurse_lists_patient_roster() {
    let mock_server = MockServer::start().await;
    let config = Arc::new(TestConfig::with_url(&mock_server.uri()));
    let nurse = TestUser::nurse("nurse@example.com");

    Mock::given(method("GET"))
        .and(path("/rest/v1/users"))
        .and(query_param("role", "eq.patient"))
        .and(query_param("is_active", "eq.true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {
                "id": "pat-1",
                "full_name": "Avery Stone",
                "email": "avery@example.com",
                "phone": "555-0101"
            },
            {
                "id": "pat-2",
                "full_name": "Blake Reed",
                "email": "blake@example.com",
                "phone": null
            }
        ])))
        .mount(&mock_server)
        .await;

    let result = handlers::list_patients(State(config), Extension(nurse.to_auth_user())).await;

    let Json(patients) = result.expect("roster listing should succeed");
    assert_eq!(patients.len(), 2);
    assert_eq!(patients[0].full_name, "Avery Stone");
    assert_eq!(patients[1].phone, None);
}

#[tokio::test]
async fn test_patient_roster_denied_for_patients() {
    let config = Arc::new(TestConfig::default().to_app_config());
    let patient = TestUser::patient("pat@example.com");

    let result = handlers::list_patients(State(config), Extension(patient.to_auth_user())).await;
    assert!(matches!(result, Err(AppError::Forbidden(_))));
}

#[tokio::test]
async fn test_patient_roster_denied_for_doctors() {
    let config = Arc::new(TestConfig::default().to_app_config());
    let doctor = TestUser::doctor("doc@example.com");

    let result = handlers::list_patients(State(config), Extension(doctor.to_auth_user())).await;
    assert!(matches!(result, Err(AppError::Forbidden(_))));
}

#[tokio::test]
async fn test_patient_details_aggregates_chart() {
    let mock_server = MockServer::start().await;
    let config = Arc::new(TestConfig::with_url(&mock_server.uri()));
    let nurse = TestUser::nurse("nurse@example.com");

    Mock::given(method("GET"))
        .and(path("/rest/v1/users"))
        .and(query_param("id", "eq.pat-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "id": "pat-1",
            "full_name": "Avery Stone",
            "email": "avery@example.com",
            "phone": "555-0101"
        }])))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("patient_id", "eq.pat-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockRows::appointment("appt-1", "pat-1", "doc-1", "slot-1", "confirmed")
        ])))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/medical_records"))
        .and(query_param("patient_id", "eq.pat-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockRows::medical_record("rec-1", "pat-1", "doc-1")
        ])))
        .mount(&mock_server)
        .await;

    let result = handlers::patient_details(
        State(config),
        Extension(nurse.to_auth_user()),
        Path("pat-1".to_string()),
    )
    .await;

    let Json(details) = result.expect("chart lookup should succeed");
    assert_eq!(details.patient.id, "pat-1");
    assert_eq!(details.appointments.len(), 1);
    assert_eq!(details.appointments[0].id, "appt-1");
    assert_eq!(details.records.len(), 1);
    assert_eq!(details.records[0].id, "rec-1");
}

#[tokio::test]
async fn test_patient_details_unknown_patient_not_found() {
    let mock_server = MockServer::start().await;
    let config = Arc::new(TestConfig::with_url(&mock_server.uri()));
    let nurse = TestUser::nurse("nurse@example.com");

    Mock::given(method("GET"))
        .and(path("/rest/v1/users"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let result = handlers::patient_details(
        State(config),
        Extension(nurse.to_auth_user()),
        Path("nobody".to_string()),
    )
    .await;

    assert!(matches!(result, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn test_patient_details_denied_for_patients() {
    let config = Arc::new(TestConfig::default().to_app_config());
    let patient = TestUser::patient("pat@example.com");

    let result = handlers::patient_details(
        State(config),
        Extension(patient.to_auth_user()),
        Path("pat-2".to_string()),
    )
    .await;

    assert!(matches!(result, Err(AppError::Forbidden(_))));
}
