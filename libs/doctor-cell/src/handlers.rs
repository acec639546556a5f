use std::sync::Arc;

use axum::{
    extract::{Json, Path, Query, State},
    http::StatusCode,
    Extension,
};
use serde_json::json;
use tracing::debug;

use shared_config::AppConfig;
use shared_models::auth::{AuthUser, UserRole};
use shared_models::error::AppError;
use shared_utils::extractor::require_role;

use crate::models::{AvailabilitySlot, CreateSlotsRequest, DoctorSummary, ScheduleDay};
use crate::services::availability::AvailabilityService;

pub async fn create_slots(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<AuthUser>,
    Json(request): Json<CreateSlotsRequest>,
) -> Result<(StatusCode, Json<Vec<AvailabilitySlot>>), AppError> {
    require_role(&user, &[UserRole::Doctor])?;
    debug!("Doctor {} creating slots on {}", user.id, request.slot_date);

    let service = AvailabilityService::new(&config);
    let slots = service.create_slots(&user.id, request).await?;

    Ok((StatusCode::CREATED, Json(slots)))
}

pub async fn list_own_slots(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<AvailabilitySlot>>, AppError> {
    require_role(&user, &[UserRole::Doctor])?;

    let service = AvailabilityService::new(&config);
    let slots = service.list_own_slots(&user.id).await?;

    Ok(Json(slots))
}

pub async fn toggle_slot(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<AuthUser>,
    Path(slot_id): Path<String>,
) -> Result<Json<AvailabilitySlot>, AppError> {
    require_role(&user, &[UserRole::Doctor])?;

    let service = AvailabilityService::new(&config);
    let slot = service.toggle_slot(&user.id, &slot_id).await?;

    Ok(Json(slot))
}

pub async fn delete_slot(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<AuthUser>,
    Path(slot_id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    require_role(&user, &[UserRole::Doctor])?;

    let service = AvailabilityService::new(&config);
    service.delete_slot(&user.id, &slot_id).await?;

    Ok(Json(json!({ "deleted": true })))
}

pub async fn get_schedule(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<ScheduleDay>>, AppError> {
    require_role(&user, &[UserRole::Doctor])?;

    let service = AvailabilityService::new(&config);
    let days = service.schedule(&user.id).await?;

    Ok(Json(days))
}

pub async fn list_doctors(
    State(config): State<Arc<AppConfig>>,
    Extension(_user): Extension<AuthUser>,
) -> Result<Json<Vec<DoctorSummary>>, AppError> {
    let service = AvailabilityService::new(&config);
    let doctors = service.list_doctors().await?;

    Ok(Json(doctors))
}

#[derive(Debug, serde::Deserialize)]
pub struct OpenSlotsQuery {
    pub date: Option<chrono::NaiveDate>,
}

pub async fn open_slots(
    State(config): State<Arc<AppConfig>>,
    Extension(_user): Extension<AuthUser>,
    Path(doctor_id): Path<String>,
    Query(query): Query<OpenSlotsQuery>,
) -> Result<Json<Vec<AvailabilitySlot>>, AppError> {
    let service = AvailabilityService::new(&config);
    let slots = service.open_slots(&doctor_id, query.date).await?;

    Ok(Json(slots))
}
