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

use crate::models::{Notification, SendNotificationRequest, UnreadCount};
use crate::services::notify::NotificationService;

pub async fn list_notifications(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<Notification>>, AppError> {
    debug!("Listing notifications for {}", user.id);

    let service = NotificationService::new(&config);
    let notifications = service.list_for_user(&user.id).await?;

    Ok(Json(notifications))
}

pub async fn unread_count(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<UnreadCount>, AppError> {
    let service = NotificationService::new(&config);
    let unread = service.unread_count(&user.id).await?;

    Ok(Json(UnreadCount { unread }))
}

pub async fn mark_read(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<AuthUser>,
    Path(notification_id): Path<String>,
) -> Result<Json<Notification>, AppError> {
    let service = NotificationService::new(&config);
    let notification = service.mark_read(&user.id, &notification_id).await?;

    Ok(Json(notification))
}

pub async fn send_notification(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<AuthUser>,
    Json(request): Json<SendNotificationRequest>,
) -> Result<(StatusCode, Json<Notification>), AppError> {
    require_role(&user, &[UserRole::Nurse])?;

    let sender_name = user.full_name.clone().unwrap_or_else(|| "a nurse".to_string());

    let service = NotificationService::new(&config);
    let notification = service.send_direct(&sender_name, request).await?;

    Ok((StatusCode::CREATED, Json(notification)))
}
