use serde::{Deserialize, Serialize};

use appointment_cell::models::Appointment;
use record_cell::models::MedicalRecord;

/// Roster entry a nurse works from when checking patients in or
/// writing records.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatientSummary {
    pub id: String,
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
}

/// A patient's chart at a glance: identity, visit history and records.
#[derive(Debug, Serialize)]
pub struct PatientDetails {
    pub patient: PatientSummary,
    pub appointments: Vec<Appointment>,
    pub records: Vec<MedicalRecord>,
}
