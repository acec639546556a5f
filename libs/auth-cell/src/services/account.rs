use std::sync::OnceLock;

use regex::Regex;
use serde_json::{json, Map, Value};
use tracing::{debug, info, warn};

use doctor_cell::services::availability::AvailabilityService;
use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;
use shared_database::Method;
use shared_models::auth::UserRole;
use shared_models::error::AppError;
use shared_utils::jwt::sign_token;

use crate::models::{
    LoginRequest, LoginResponse, SignupRequest, UpdateProfileRequest, UserProfile,
};
use crate::services::password;

fn email_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$").unwrap()
    })
}

pub struct AccountService {
    client: SupabaseClient,
    scheduler: AvailabilityService,
    jwt_secret: String,
    token_ttl_hours: i64,
}

impl AccountService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: SupabaseClient::new(config),
            scheduler: AvailabilityService::new(config),
            jwt_secret: config.supabase_jwt_secret.clone(),
            token_ttl_hours: config.token_ttl_hours,
        }
    }

    pub async fn signup(&self, request: SignupRequest) -> Result<UserProfile, AppError> {
        validate_signup(&request)?;

        let email = request.email.trim().to_lowercase();

        let existing: Vec<Value> = self
            .client
            .request(
                Method::GET,
                &format!("/rest/v1/users?email=eq.{}&select=id", email),
                None,
                None,
            )
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        if !existing.is_empty() {
            return Err(AppError::Conflict(
                "An account with this email already exists".to_string(),
            ));
        }

        let password_hash = password::hash_password(&request.password)
            .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))?;

        let row = json!({
            "full_name": request.full_name.trim(),
            "email": email,
            "password_hash": password_hash,
            "role": request.role.to_string(),
            "phone": request.phone,
            "specialty": request.specialty,
            "department": request.department,
            "shift": request.shift,
            "supervising_doctor_id": request.supervising_doctor_id,
            "is_active": true
        });

        let created = self
            .client
            .insert_returning("users", json!([row]), None)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let created = created
            .into_iter()
            .next()
            .ok_or_else(|| AppError::Database("User insert returned no rows".to_string()))?;

        let profile: UserProfile = serde_json::from_value(created)
            .map_err(|e| AppError::Internal(format!("Failed to parse user row: {}", e)))?;

        info!("Created {} account for {}", profile.role, profile.email);

        // New doctors start with a standard weekday schedule. Seeding is
        // best-effort: a failure leaves the account usable and the doctor
        // opens slots manually.
        if profile.role == UserRole::Doctor {
            if let Err(e) = self.scheduler.seed_default_slots(&profile.id).await {
                warn!(
                    "Could not seed starter schedule for doctor {}: {}",
                    profile.id, e
                );
            }
        }

        Ok(profile)
    }

    pub async fn login(&self, request: LoginRequest) -> Result<LoginResponse, AppError> {
        let email = request.email.trim().to_lowercase();

        let rows: Vec<Value> = self
            .client
            .request(
                Method::GET,
                &format!("/rest/v1/users?email=eq.{}&select=*", email),
                None,
                None,
            )
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| AppError::Auth("Invalid email or password".to_string()))?;

        let stored_hash = row
            .get("password_hash")
            .and_then(Value::as_str)
            .ok_or_else(|| AppError::Internal("User row has no password hash".to_string()))?;

        let matches = password::verify_password(&request.password, stored_hash)
            .map_err(|e| AppError::Internal(format!("Failed to verify password: {}", e)))?;

        if !matches {
            debug!("Password mismatch for {}", email);
            return Err(AppError::Auth("Invalid email or password".to_string()));
        }

        let profile: UserProfile = serde_json::from_value(row)
            .map_err(|e| AppError::Internal(format!("Failed to parse user row: {}", e)))?;

        if !profile.is_active {
            return Err(AppError::Auth(
                "This account has been deactivated".to_string(),
            ));
        }

        let token = sign_token(
            &profile.id,
            &profile.email,
            profile.role,
            &profile.full_name,
            &self.jwt_secret,
            self.token_ttl_hours,
        )
        .map_err(AppError::Internal)?;

        info!("User {} logged in", profile.id);
        Ok(LoginResponse {
            token,
            user: profile,
        })
    }

    pub async fn get_profile(&self, user_id: &str) -> Result<UserProfile, AppError> {
        let rows: Vec<Value> = self
            .client
            .request(
                Method::GET,
                &format!("/rest/v1/users?id=eq.{}&select=*", user_id),
                None,
                None,
            )
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        serde_json::from_value(row)
            .map_err(|e| AppError::Internal(format!("Failed to parse user row: {}", e)))
    }

    pub async fn update_profile(
        &self,
        user_id: &str,
        request: UpdateProfileRequest,
    ) -> Result<UserProfile, AppError> {
        let mut patch = Map::new();

        if let Some(full_name) = request.full_name {
            let full_name = full_name.trim().to_string();
            if full_name.len() < 3 || full_name.len() > 100 {
                return Err(AppError::ValidationError(
                    "Full name must be between 3 and 100 characters".to_string(),
                ));
            }
            patch.insert("full_name".to_string(), json!(full_name));
        }
        if let Some(phone) = request.phone {
            patch.insert("phone".to_string(), json!(phone));
        }
        if let Some(specialty) = request.specialty {
            patch.insert("specialty".to_string(), json!(specialty));
        }
        if let Some(department) = request.department {
            patch.insert("department".to_string(), json!(department));
        }
        if let Some(shift) = request.shift {
            patch.insert("shift".to_string(), json!(shift));
        }

        if patch.is_empty() {
            return Err(AppError::BadRequest("No fields to update".to_string()));
        }

        let updated = self
            .client
            .update_returning(
                &format!("/rest/v1/users?id=eq.{}", user_id),
                Value::Object(patch),
                None,
            )
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let row = updated
            .into_iter()
            .next()
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        serde_json::from_value(row)
            .map_err(|e| AppError::Internal(format!("Failed to parse user row: {}", e)))
    }

    /// Soft delete. Login is refused for deactivated accounts but their
    /// rows stay referenced by past appointments and records.
    pub async fn deactivate(&self, user_id: &str) -> Result<(), AppError> {
        let updated = self
            .client
            .update_returning(
                &format!("/rest/v1/users?id=eq.{}", user_id),
                json!({ "is_active": false }),
                None,
            )
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        if updated.is_empty() {
            return Err(AppError::NotFound("User not found".to_string()));
        }

        info!("Deactivated account {}", user_id);
        Ok(())
    }
}

fn validate_signup(request: &SignupRequest) -> Result<(), AppError> {
    let name = request.full_name.trim();
    if name.len() < 3 || name.len() > 100 {
        return Err(AppError::ValidationError(
            "Full name must be between 3 and 100 characters".to_string(),
        ));
    }

    if !email_regex().is_match(request.email.trim()) {
        return Err(AppError::ValidationError(
            "Invalid email address".to_string(),
        ));
    }

    if request.password.len() < 8 {
        return Err(AppError::ValidationError(
            "Password must be at least 8 characters".to_string(),
        ));
    }

    match request.role {
        UserRole::Doctor => {
            if request.specialty.as_deref().unwrap_or("").trim().is_empty() {
                return Err(AppError::ValidationError(
                    "Specialty is required for doctors".to_string(),
                ));
            }
        }
        UserRole::Nurse => {
            if request.department.as_deref().unwrap_or("").trim().is_empty() {
                return Err(AppError::ValidationError(
                    "Department is required for nurses".to_string(),
                ));
            }
            if request.shift.as_deref().unwrap_or("").trim().is_empty() {
                return Err(AppError::ValidationError(
                    "Shift is required for nurses".to_string(),
                ));
            }
        }
        UserRole::Patient => {}
    }

    Ok(())
}
