use serde_json::Value;
use tracing::debug;

use appointment_cell::models::Appointment;
use record_cell::models::MedicalRecord;
use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;
use shared_database::Method;
use shared_models::error::AppError;

use crate::models::{PatientDetails, PatientSummary};

pub struct DirectoryService {
    client: SupabaseClient,
}

impl DirectoryService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: SupabaseClient::new(config),
        }
    }

    pub async fn list_patients(&self) -> Result<Vec<PatientSummary>, AppError> {
        let path = "/rest/v1/users?role=eq.patient&is_active=eq.true&select=id,full_name,email,phone&order=full_name.asc";

        let rows: Vec<Value> = self
            .client
            .request(Method::GET, path, None, None)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        rows.into_iter()
            .map(|row| {
                serde_json::from_value(row)
                    .map_err(|e| AppError::Internal(format!("Failed to parse patient row: {}", e)))
            })
            .collect()
    }

    /// The full chart for one patient: profile, every appointment and
    /// every medical record, newest first.
    pub async fn patient_details(&self, patient_id: &str) -> Result<PatientDetails, AppError> {
        let rows: Vec<Value> = self
            .client
            .request(
                Method::GET,
                &format!(
                    "/rest/v1/users?id=eq.{}&role=eq.patient&select=id,full_name,email,phone",
                    patient_id
                ),
                None,
                None,
            )
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| AppError::NotFound("Patient not found".to_string()))?;

        let patient: PatientSummary = serde_json::from_value(row)
            .map_err(|e| AppError::Internal(format!("Failed to parse patient row: {}", e)))?;

        let appointment_rows: Vec<Value> = self
            .client
            .request(
                Method::GET,
                &format!(
                    "/rest/v1/appointments?patient_id=eq.{}&select=*&order=created_at.desc",
                    patient_id
                ),
                None,
                None,
            )
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let appointments: Vec<Appointment> = appointment_rows
            .into_iter()
            .map(|row| {
                serde_json::from_value(row).map_err(|e| {
                    AppError::Internal(format!("Failed to parse appointment row: {}", e))
                })
            })
            .collect::<Result<_, _>>()?;

        let record_rows: Vec<Value> = self
            .client
            .request(
                Method::GET,
                &format!(
                    "/rest/v1/medical_records?patient_id=eq.{}&select=*&order=created_at.desc",
                    patient_id
                ),
                None,
                None,
            )
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let records: Vec<MedicalRecord> = record_rows
            .into_iter()
            .map(|row| {
                serde_json::from_value(row)
                    .map_err(|e| AppError::Internal(format!("Failed to parse record row: {}", e)))
            })
            .collect::<Result<_, _>>()?;

        debug!(
            "Assembled chart for patient {}: {} appointments, {} records",
            patient_id,
            appointments.len(),
            records.len()
        );

        Ok(PatientDetails {
            patient,
            appointments,
            records,
        })
    }
}
