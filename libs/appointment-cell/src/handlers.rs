use std::sync::Arc;

use axum::{
    extract::{Json, Path, State},
    http::StatusCode,
    Extension,
};
use tracing::debug;

use shared_config::AppConfig;
use shared_models::auth::{AuthUser, UserRole};
use shared_models::error::AppError;
use shared_utils::extractor::require_role;

use crate::models::{
    Appointment, BookAppointmentRequest, RescheduleRequest, UpdateAppointmentRequest,
};
use crate::services::booking::BookingService;

pub async fn book_appointment(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<AuthUser>,
    Json(request): Json<BookAppointmentRequest>,
) -> Result<(StatusCode, Json<Appointment>), AppError> {
    require_role(&user, &[UserRole::Patient])?;
    debug!("Patient {} booking slot {}", user.id, request.slot_id);

    let service = BookingService::new(&config);
    let appointment = service.book(&user, request).await?;

    Ok((StatusCode::CREATED, Json(appointment)))
}

pub async fn list_appointments(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<Appointment>>, AppError> {
    let service = BookingService::new(&config);
    let appointments = service.list_for_user(&user).await?;

    Ok(Json(appointments))
}

pub async fn get_appointment(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<AuthUser>,
    Path(appointment_id): Path<String>,
) -> Result<Json<Appointment>, AppError> {
    let service = BookingService::new(&config);
    let appointment = service.get_for_user(&user, &appointment_id).await?;

    Ok(Json(appointment))
}

pub async fn update_appointment(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<AuthUser>,
    Path(appointment_id): Path<String>,
    Json(request): Json<UpdateAppointmentRequest>,
) -> Result<Json<Appointment>, AppError> {
    require_role(&user, &[UserRole::Doctor])?;

    let service = BookingService::new(&config);
    let appointment = service.update(&user, &appointment_id, request).await?;

    Ok(Json(appointment))
}

pub async fn cancel_appointment(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<AuthUser>,
    Path(appointment_id): Path<String>,
) -> Result<Json<Appointment>, AppError> {
    require_role(&user, &[UserRole::Patient, UserRole::Doctor])?;

    let service = BookingService::new(&config);
    let appointment = service.cancel(&user, &appointment_id).await?;

    Ok(Json(appointment))
}

pub async fn reschedule_appointment(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<AuthUser>,
    Path(appointment_id): Path<String>,
    Json(request): Json<RescheduleRequest>,
) -> Result<Json<Appointment>, AppError> {
    require_role(&user, &[UserRole::Patient])?;

    let service = BookingService::new(&config);
    let appointment = service
        .reschedule(&user, &appointment_id, &request.new_slot_id)
        .await?;

    Ok(Json(appointment))
}

pub async fn check_in_appointment(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<AuthUser>,
    Path(appointment_id): Path<String>,
) -> Result<Json<Appointment>, AppError> {
    require_role(&user, &[UserRole::Nurse])?;

    let service = BookingService::new(&config);
    let appointment = service.check_in(&user, &appointment_id).await?;

    Ok(Json(appointment))
}
