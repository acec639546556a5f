use serde_json::{json, Value};
use tracing::info;

use notification_cell::services::notify::NotificationService;
use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;
use shared_database::Method;
use shared_models::auth::AuthUser;
use shared_models::error::AppError;

use crate::models::{CreateRecordRequest, MedicalRecord};

pub struct RecordService {
    client: SupabaseClient,
    notifier: NotificationService,
}

impl RecordService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: SupabaseClient::new(config),
            notifier: NotificationService::new(config),
        }
    }

    /// Patients read their own chart; doctors and nurses read any.
    pub async fn list_for_patient(
        &self,
        caller: &AuthUser,
        patient_id: &str,
    ) -> Result<Vec<MedicalRecord>, AppError> {
        let is_clinician = caller.role.map(|r| r.is_clinician()).unwrap_or(false);
        if !is_clinician && caller.id != patient_id {
            return Err(AppError::Forbidden(
                "You can only view your own medical records".to_string(),
            ));
        }

        let path = format!(
            "/rest/v1/medical_records?patient_id=eq.{}&select=*&order=created_at.desc",
            patient_id
        );

        let rows: Vec<Value> = self
            .client
            .request(Method::GET, &path, None, None)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        rows.into_iter().map(parse_record).collect()
    }

    pub async fn create(
        &self,
        author: &AuthUser,
        request: CreateRecordRequest,
    ) -> Result<MedicalRecord, AppError> {
        if request.diagnosis.trim().is_empty() {
            return Err(AppError::ValidationError(
                "Diagnosis cannot be empty".to_string(),
            ));
        }

        let patients: Vec<Value> = self
            .client
            .request(
                Method::GET,
                &format!(
                    "/rest/v1/users?id=eq.{}&role=eq.patient&select=id",
                    request.patient_id
                ),
                None,
                None,
            )
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        if patients.is_empty() {
            return Err(AppError::NotFound("Patient not found".to_string()));
        }

        let row = json!({
            "patient_id": request.patient_id,
            "author_id": author.id,
            "appointment_id": request.appointment_id,
            "diagnosis": request.diagnosis.trim(),
            "treatment": request.treatment,
            "notes": request.notes
        });

        let created = self
            .client
            .insert_returning("medical_records", json!([row]), None)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let row = created
            .into_iter()
            .next()
            .ok_or_else(|| AppError::Database("Record insert returned no rows".to_string()))?;
        let record = parse_record(row)?;

        let author_name = author
            .full_name
            .clone()
            .unwrap_or_else(|| "your clinician".to_string());
        self.notifier
            .notify(
                &record.patient_id,
                record.appointment_id.as_deref(),
                &format!("A new medical record was added by {}.", author_name),
            )
            .await;

        info!(
            "Clinician {} added record {} for patient {}",
            author.id, record.id, record.patient_id
        );
        Ok(record)
    }
}

fn parse_record(row: Value) -> Result<MedicalRecord, AppError> {
    serde_json::from_value(row)
        .map_err(|e| AppError::Internal(format!("Failed to parse record row: {}", e)))
}
