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

use crate::models::{CreateRecordRequest, MedicalRecord};
use crate::services::records::RecordService;

pub async fn list_own_records(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<MedicalRecord>>, AppError> {
    let service = RecordService::new(&config);
    let patient_id = user.id.clone();
    let records = service.list_for_patient(&user, &patient_id).await?;

    Ok(Json(records))
}

pub async fn list_patient_records(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<AuthUser>,
    Path(patient_id): Path<String>,
) -> Result<Json<Vec<MedicalRecord>>, AppError> {
    debug!("{} reading records of patient {}", user.id, patient_id);

    let service = RecordService::new(&config);
    let records = service.list_for_patient(&user, &patient_id).await?;

    Ok(Json(records))
}

pub async fn create_record(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<AuthUser>,
    Json(request): Json<CreateRecordRequest>,
) -> Result<(StatusCode, Json<MedicalRecord>), AppError> {
    require_role(&user, &[UserRole::Doctor, UserRole::Nurse])?;

    let service = RecordService::new(&config);
    let record = service.create(&user, request).await?;

    Ok((StatusCode::CREATED, Json(record)))
}
