use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

/// One bookable window in a doctor's calendar.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailabilitySlot {
    pub id: String,
    pub doctor_id: String,
    pub slot_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub is_available: bool,
    pub created_at: Option<DateTime<Utc>>,
}

/// A working window the doctor wants cut into bookable slots.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateSlotsRequest {
    pub slot_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub slot_minutes: u32,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DoctorSummary {
    pub id: String,
    pub full_name: String,
    pub email: String,
    pub specialty: Option<String>,
}

/// Appointment fields the schedule view needs. The full appointment
/// surface lives in the appointment cell.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookedAppointment {
    pub id: String,
    pub patient_id: String,
    pub slot_id: String,
    pub status: String,
    pub reason: Option<String>,
    pub checked_in: bool,
}

#[derive(Debug, Serialize)]
pub struct ScheduleEntry {
    pub slot: AvailabilitySlot,
    pub appointment: Option<BookedAppointment>,
}

#[derive(Debug, Serialize)]
pub struct ScheduleDay {
    pub date: NaiveDate,
    pub entries: Vec<ScheduleEntry>,
}
