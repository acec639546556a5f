use std::sync::Arc;

use axum::{
    extract::{Json, Path, State},
    Extension,
};
use tracing::debug;

use shared_config::AppConfig;
use shared_models::auth::{AuthUser, UserRole};
use shared_models::error::AppError;
use shared_utils::extractor::require_role;

use crate::models::{PatientDetails, PatientSummary};
use crate::services::directory::DirectoryService;

/// The roster nurses pick patients from when checking in, writing
/// records or sending notifications.
pub async fn list_patients(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<PatientSummary>>, AppError> {
    require_role(&user, &[UserRole::Nurse])?;

    let service = DirectoryService::new(&config);
    let patients = service.list_patients().await?;

    Ok(Json(patients))
}

pub async fn patient_details(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<AuthUser>,
    Path(patient_id): Path<String>,
) -> Result<Json<PatientDetails>, AppError> {
    require_role(&user, &[UserRole::Doctor, UserRole::Nurse])?;
    debug!("{} viewing chart of patient {}", user.id, patient_id);

    let service = DirectoryService::new(&config);
    let details = service.patient_details(&patient_id).await?;

    Ok(Json(details))
}
