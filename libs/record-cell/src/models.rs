use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MedicalRecord {
    pub id: String,
    pub patient_id: String,
    /// The clinician who wrote the record.
    pub author_id: String,
    pub appointment_id: Option<String>,
    pub diagnosis: String,
    pub treatment: Option<String>,
    pub notes: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct CreateRecordRequest {
    pub patient_id: String,
    pub diagnosis: String,
    pub treatment: Option<String>,
    pub notes: Option<String>,
    pub appointment_id: Option<String>,
}
