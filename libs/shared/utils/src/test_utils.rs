use chrono::Utc;
use serde_json::json;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::auth::{AuthUser, UserRole};

use crate::jwt::sign_token;

pub struct TestConfig {
    pub jwt_secret: String,
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub supabase_service_key: String,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "test-secret-key-for-jwt-validation-must-be-long-enough".to_string(),
            supabase_url: "http://localhost:54321".to_string(),
            supabase_anon_key: "test-anon-key".to_string(),
            supabase_service_key: "test-service-key".to_string(),
        }
    }
}

impl TestConfig {
    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            supabase_url: self.supabase_url.clone(),
            supabase_anon_key: self.supabase_anon_key.clone(),
            supabase_service_key: self.supabase_service_key.clone(),
            supabase_jwt_secret: self.jwt_secret.clone(),
            token_ttl_hours: 24,
        }
    }

    pub fn with_url(url: &str) -> AppConfig {
        let mut config = Self::default().to_app_config();
        config.supabase_url = url.to_string();
        config
    }
}

pub struct TestUser {
    pub id: String,
    pub email: String,
    pub role: UserRole,
    pub full_name: String,
}

impl TestUser {
    pub fn new(email: &str, role: UserRole) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            email: email.to_string(),
            role,
            full_name: format!("Test {}", role),
        }
    }

    pub fn doctor(email: &str) -> Self {
        Self::new(email, UserRole::Doctor)
    }

    pub fn patient(email: &str) -> Self {
        Self::new(email, UserRole::Patient)
    }

    pub fn nurse(email: &str) -> Self {
        Self::new(email, UserRole::Nurse)
    }

    pub fn to_auth_user(&self) -> AuthUser {
        AuthUser {
            id: self.id.clone(),
            email: Some(self.email.clone()),
            role: Some(self.role),
            full_name: Some(self.full_name.clone()),
            created_at: Some(Utc::now()),
        }
    }
}

pub struct JwtTestUtils;

impl JwtTestUtils {
    pub fn create_test_token(user: &TestUser, secret: &str, exp_hours: Option<i64>) -> String {
        sign_token(
            &user.id,
            &user.email,
            user.role,
            &user.full_name,
            secret,
            exp_hours.unwrap_or(24),
        )
        .expect("test token signing cannot fail with a non-empty secret")
    }

    pub fn create_expired_token(user: &TestUser, secret: &str) -> String {
        Self::create_test_token(user, secret, Some(-1))
    }

    pub fn create_invalid_signature_token(user: &TestUser) -> String {
        Self::create_test_token(user, "wrong-secret", Some(24))
    }

    pub fn create_malformed_token() -> String {
        "invalid.token.format".to_string()
    }
}

/// Canned PostgREST rows for wiremock-backed tests.
pub struct MockRows;

impl MockRows {
    pub fn user(id: &str, email: &str, role: &str) -> serde_json::Value {
        json!({
            "id": id,
            "full_name": "Test User",
            "email": email,
            "password_hash": "$argon2id$v=19$m=19456,t=2,p=1$c29tZXNhbHQ$hash",
            "role": role,
            "phone": null,
            "specialty": if role == "doctor" { json!("General Practice") } else { json!(null) },
            "department": null,
            "shift": null,
            "supervising_doctor_id": null,
            "is_active": true,
            "created_at": Utc::now().to_rfc3339()
        })
    }

    pub fn availability_slot(id: &str, doctor_id: &str, date: &str, start: &str, end: &str) -> serde_json::Value {
        json!({
            "id": id,
            "doctor_id": doctor_id,
            "slot_date": date,
            "start_time": start,
            "end_time": end,
            "is_available": true,
            "created_at": Utc::now().to_rfc3339()
        })
    }

    pub fn appointment(id: &str, patient_id: &str, doctor_id: &str, slot_id: &str, status: &str) -> serde_json::Value {
        json!({
            "id": id,
            "patient_id": patient_id,
            "doctor_id": doctor_id,
            "nurse_id": null,
            "slot_id": slot_id,
            "status": status,
            "reason": "Checkup",
            "notes": null,
            "checked_in": false,
            "checked_in_time": null,
            "created_at": Utc::now().to_rfc3339(),
            "updated_at": Utc::now().to_rfc3339()
        })
    }

    pub fn medical_record(id: &str, patient_id: &str, author_id: &str) -> serde_json::Value {
        json!({
            "id": id,
            "patient_id": patient_id,
            "author_id": author_id,
            "appointment_id": null,
            "diagnosis": "Seasonal allergies",
            "treatment": "Antihistamines",
            "notes": "Follow up in two weeks",
            "created_at": Utc::now().to_rfc3339()
        })
    }

    pub fn notification(id: &str, user_id: &str, message: &str, is_read: bool) -> serde_json::Value {
        json!({
            "id": id,
            "user_id": user_id,
            "appointment_id": null,
            "message": message,
            "is_read": is_read,
            "created_at": Utc::now().to_rfc3339()
        })
    }
}
