use std::sync::Arc;

use axum::{
    extract::{Json, State},
    http::{HeaderMap, StatusCode},
    Extension,
};
use serde_json::json;
use tracing::debug;

use shared_config::AppConfig;
use shared_models::auth::{AuthUser, TokenResponse};
use shared_models::error::AppError;
use shared_utils::jwt::validate_token;

use crate::models::{LoginRequest, LoginResponse, SignupRequest, UpdateProfileRequest, UserProfile};
use crate::services::account::AccountService;

fn extract_bearer_token(headers: &HeaderMap) -> Result<String, AppError> {
    let auth_header = headers
        .get("Authorization")
        .ok_or_else(|| AppError::Auth("Missing authorization header".to_string()))?;

    let auth_value = auth_header
        .to_str()
        .map_err(|_| AppError::Auth("Invalid authorization header format".to_string()))?;

    if !auth_value.starts_with("Bearer ") {
        return Err(AppError::Auth(
            "Invalid authorization header format".to_string(),
        ));
    }

    Ok(auth_value[7..].to_string())
}

pub async fn signup(
    State(config): State<Arc<AppConfig>>,
    Json(request): Json<SignupRequest>,
) -> Result<(StatusCode, Json<UserProfile>), AppError> {
    debug!("Signup request for {}", request.email);

    let service = AccountService::new(&config);
    let profile = service.signup(request).await?;

    Ok((StatusCode::CREATED, Json(profile)))
}

pub async fn login(
    State(config): State<Arc<AppConfig>>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    debug!("Login request for {}", request.email);

    let service = AccountService::new(&config);
    let response = service.login(request).await?;

    Ok(Json(response))
}

pub async fn validate(
    State(config): State<Arc<AppConfig>>,
    headers: HeaderMap,
) -> Result<Json<TokenResponse>, AppError> {
    let token = extract_bearer_token(&headers)?;

    match validate_token(&token, &config.supabase_jwt_secret) {
        Ok(user) => Ok(Json(TokenResponse {
            valid: true,
            user_id: user.id,
            email: user.email,
            role: user.role,
        })),
        Err(err) => Err(AppError::Auth(err)),
    }
}

pub async fn get_profile(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<UserProfile>, AppError> {
    debug!("Getting profile for user {}", user.id);

    let service = AccountService::new(&config);
    let profile = service.get_profile(&user.id).await?;

    Ok(Json(profile))
}

pub async fn update_profile(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<AuthUser>,
    Json(request): Json<UpdateProfileRequest>,
) -> Result<Json<UserProfile>, AppError> {
    debug!("Updating profile for user {}", user.id);

    let service = AccountService::new(&config);
    let profile = service.update_profile(&user.id, request).await?;

    Ok(Json(profile))
}

pub async fn deactivate_account(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<serde_json::Value>, AppError> {
    let service = AccountService::new(&config);
    service.deactivate(&user.id).await?;

    Ok(Json(json!({ "deactivated": true })))
}
