use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use shared_models::auth::UserRole;

#[derive(Debug, Clone, Deserialize)]
pub struct SignupRequest {
    pub full_name: String,
    pub email: String,
    pub password: String,
    pub role: UserRole,
    pub phone: Option<String>,
    /// Required when signing up as a doctor.
    pub specialty: Option<String>,
    /// Required when signing up as a nurse.
    pub department: Option<String>,
    pub shift: Option<String>,
    pub supervising_doctor_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: UserProfile,
}

/// Public view of a user row. Unknown columns (the password hash in
/// particular) are dropped on deserialization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub full_name: String,
    pub email: String,
    pub role: UserRole,
    pub phone: Option<String>,
    pub specialty: Option<String>,
    pub department: Option<String>,
    pub shift: Option<String>,
    pub supervising_doctor_id: Option<String>,
    pub is_active: bool,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub specialty: Option<String>,
    pub department: Option<String>,
    pub shift: Option<String>,
}
