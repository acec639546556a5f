use chrono::{Datelike, Duration, NaiveDate, NaiveTime, Utc, Weekday};
use serde_json::{json, Value};
use tracing::{debug, info};

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;
use shared_database::Method;
use shared_models::error::AppError;

use crate::models::{
    AvailabilitySlot, BookedAppointment, CreateSlotsRequest, DoctorSummary, ScheduleDay,
    ScheduleEntry,
};

const ALLOWED_SLOT_MINUTES: [u32; 4] = [15, 30, 45, 60];
const MAX_WINDOW_HOURS: i64 = 8;
const MAX_DAYS_AHEAD: i64 = 90;
const OPEN_SLOTS_WINDOW_DAYS: i64 = 14;
const SCHEDULE_WINDOW_DAYS: i64 = 7;
const DEFAULT_SCHEDULE_DAYS: i64 = 30;
const DEFAULT_SLOT_MINUTES: u32 = 30;

/// Statuses that keep a slot claimed.
const ACTIVE_STATUSES: &str = "in.(requested,confirmed)";

pub fn validate_slot_request(
    request: &CreateSlotsRequest,
    today: NaiveDate,
) -> Result<(), AppError> {
    if !ALLOWED_SLOT_MINUTES.contains(&request.slot_minutes) {
        return Err(AppError::ValidationError(
            "Slot length must be 15, 30, 45 or 60 minutes".to_string(),
        ));
    }

    if request.end_time <= request.start_time {
        return Err(AppError::ValidationError(
            "End time must be after start time".to_string(),
        ));
    }

    let window = request.end_time - request.start_time;
    if window > Duration::hours(MAX_WINDOW_HOURS) {
        return Err(AppError::ValidationError(format!(
            "Availability window cannot exceed {} hours",
            MAX_WINDOW_HOURS
        )));
    }

    if request.slot_date < today {
        return Err(AppError::ValidationError(
            "Cannot create slots in the past".to_string(),
        ));
    }

    if request.slot_date > today + Duration::days(MAX_DAYS_AHEAD) {
        return Err(AppError::ValidationError(format!(
            "Cannot create slots more than {} days ahead",
            MAX_DAYS_AHEAD
        )));
    }

    Ok(())
}

/// Cut a working window into back-to-back slots. A trailing remainder
/// shorter than `slot_minutes` is dropped.
pub fn expand_window(request: &CreateSlotsRequest) -> Vec<(NaiveTime, NaiveTime)> {
    let step = Duration::minutes(request.slot_minutes as i64);
    let mut slots = Vec::new();
    let mut start = request.start_time;

    loop {
        let (end, wrapped) = start.overflowing_add_signed(step);
        if wrapped != 0 || end > request.end_time {
            break;
        }
        slots.push((start, end));
        start = end;
    }

    slots
}

/// Weekdays within the next `DEFAULT_SCHEDULE_DAYS` days, starting tomorrow.
pub fn default_schedule_days(today: NaiveDate) -> Vec<NaiveDate> {
    (1..=DEFAULT_SCHEDULE_DAYS)
        .map(|offset| today + Duration::days(offset))
        .filter(|day| !matches!(day.weekday(), Weekday::Sat | Weekday::Sun))
        .collect()
}

pub fn windows_overlap(
    a_start: NaiveTime,
    a_end: NaiveTime,
    b_start: NaiveTime,
    b_end: NaiveTime,
) -> bool {
    a_start < b_end && b_start < a_end
}

pub struct AvailabilityService {
    client: SupabaseClient,
}

impl AvailabilityService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: SupabaseClient::new(config),
        }
    }

    pub async fn create_slots(
        &self,
        doctor_id: &str,
        request: CreateSlotsRequest,
    ) -> Result<Vec<AvailabilitySlot>, AppError> {
        let today = Utc::now().date_naive();
        validate_slot_request(&request, today)?;

        let windows = expand_window(&request);
        if windows.is_empty() {
            return Err(AppError::ValidationError(
                "Window is too short for the requested slot length".to_string(),
            ));
        }

        let existing = self.slots_for_date(doctor_id, request.slot_date).await?;
        for slot in &existing {
            if windows_overlap(
                request.start_time,
                request.end_time,
                slot.start_time,
                slot.end_time,
            ) {
                return Err(AppError::Conflict(format!(
                    "Window overlaps an existing slot at {}",
                    slot.start_time.format("%H:%M")
                )));
            }
        }

        let rows: Vec<Value> = windows
            .iter()
            .map(|(start, end)| {
                json!({
                    "doctor_id": doctor_id,
                    "slot_date": request.slot_date.to_string(),
                    "start_time": start.format("%H:%M:%S").to_string(),
                    "end_time": end.format("%H:%M:%S").to_string(),
                    "is_available": true
                })
            })
            .collect();

        let created = self
            .client
            .insert_returning("availability_slots", json!(rows), None)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        info!(
            "Doctor {} opened {} slots on {}",
            doctor_id,
            created.len(),
            request.slot_date
        );

        created
            .into_iter()
            .map(|row| {
                serde_json::from_value(row)
                    .map_err(|e| AppError::Internal(format!("Failed to parse slot row: {}", e)))
            })
            .collect()
    }

    /// Starter schedule for a freshly registered doctor: 30-minute slots,
    /// 09:00 to 17:00, weekdays over the next month. The doctor reshapes
    /// it through the regular slot endpoints afterwards.
    pub async fn seed_default_slots(&self, doctor_id: &str) -> Result<usize, AppError> {
        let today = Utc::now().date_naive();
        let day_start = NaiveTime::from_hms_opt(9, 0, 0)
            .ok_or_else(|| AppError::Internal("Invalid default window start".to_string()))?;
        let day_end = NaiveTime::from_hms_opt(17, 0, 0)
            .ok_or_else(|| AppError::Internal("Invalid default window end".to_string()))?;

        let mut rows: Vec<Value> = Vec::new();
        for day in default_schedule_days(today) {
            let window = CreateSlotsRequest {
                slot_date: day,
                start_time: day_start,
                end_time: day_end,
                slot_minutes: DEFAULT_SLOT_MINUTES,
            };
            for (start, end) in expand_window(&window) {
                rows.push(json!({
                    "doctor_id": doctor_id,
                    "slot_date": day.to_string(),
                    "start_time": start.format("%H:%M:%S").to_string(),
                    "end_time": end.format("%H:%M:%S").to_string(),
                    "is_available": true
                }));
            }
        }

        let created = self
            .client
            .insert_returning("availability_slots", json!(rows), None)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        info!(
            "Seeded {} starter slots for doctor {}",
            created.len(),
            doctor_id
        );
        Ok(created.len())
    }

    async fn slots_for_date(
        &self,
        doctor_id: &str,
        date: NaiveDate,
    ) -> Result<Vec<AvailabilitySlot>, AppError> {
        let path = format!(
            "/rest/v1/availability_slots?doctor_id=eq.{}&slot_date=eq.{}&select=*",
            doctor_id, date
        );

        let rows: Vec<Value> = self
            .client
            .request(Method::GET, &path, None, None)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        rows.into_iter()
            .map(|row| {
                serde_json::from_value(row)
                    .map_err(|e| AppError::Internal(format!("Failed to parse slot row: {}", e)))
            })
            .collect()
    }

    async fn get_owned_slot(
        &self,
        doctor_id: &str,
        slot_id: &str,
    ) -> Result<AvailabilitySlot, AppError> {
        let rows: Vec<Value> = self
            .client
            .request(
                Method::GET,
                &format!("/rest/v1/availability_slots?id=eq.{}&select=*", slot_id),
                None,
                None,
            )
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| AppError::NotFound("Slot not found".to_string()))?;

        let slot: AvailabilitySlot = serde_json::from_value(row)
            .map_err(|e| AppError::Internal(format!("Failed to parse slot row: {}", e)))?;

        if slot.doctor_id != doctor_id {
            return Err(AppError::Forbidden(
                "You can only manage your own slots".to_string(),
            ));
        }

        Ok(slot)
    }

    async fn slot_has_active_appointment(&self, slot_id: &str) -> Result<bool, AppError> {
        let path = format!(
            "/rest/v1/appointments?slot_id=eq.{}&status={}&select=id",
            slot_id, ACTIVE_STATUSES
        );

        let rows: Vec<Value> = self
            .client
            .request(Method::GET, &path, None, None)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(!rows.is_empty())
    }

    pub async fn toggle_slot(
        &self,
        doctor_id: &str,
        slot_id: &str,
    ) -> Result<AvailabilitySlot, AppError> {
        let slot = self.get_owned_slot(doctor_id, slot_id).await?;

        if self.slot_has_active_appointment(slot_id).await? {
            return Err(AppError::Conflict(
                "Slot has an active appointment".to_string(),
            ));
        }

        let updated = self
            .client
            .update_returning(
                &format!("/rest/v1/availability_slots?id=eq.{}", slot_id),
                json!({ "is_available": !slot.is_available }),
                None,
            )
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let row = updated
            .into_iter()
            .next()
            .ok_or_else(|| AppError::NotFound("Slot not found".to_string()))?;

        serde_json::from_value(row)
            .map_err(|e| AppError::Internal(format!("Failed to parse slot row: {}", e)))
    }

    pub async fn delete_slot(&self, doctor_id: &str, slot_id: &str) -> Result<(), AppError> {
        self.get_owned_slot(doctor_id, slot_id).await?;

        if self.slot_has_active_appointment(slot_id).await? {
            return Err(AppError::Conflict(
                "Slot has an active appointment".to_string(),
            ));
        }

        let deleted = self
            .client
            .delete_returning(
                &format!("/rest/v1/availability_slots?id=eq.{}", slot_id),
                None,
            )
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        if deleted.is_empty() {
            return Err(AppError::NotFound("Slot not found".to_string()));
        }

        debug!("Doctor {} deleted slot {}", doctor_id, slot_id);
        Ok(())
    }

    pub async fn list_own_slots(&self, doctor_id: &str) -> Result<Vec<AvailabilitySlot>, AppError> {
        let today = Utc::now().date_naive();
        let path = format!(
            "/rest/v1/availability_slots?doctor_id=eq.{}&slot_date=gte.{}&select=*&order=slot_date.asc,start_time.asc",
            doctor_id, today
        );

        let rows: Vec<Value> = self
            .client
            .request(Method::GET, &path, None, None)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        rows.into_iter()
            .map(|row| {
                serde_json::from_value(row)
                    .map_err(|e| AppError::Internal(format!("Failed to parse slot row: {}", e)))
            })
            .collect()
    }

    /// Open slots for a doctor, the view a patient books from. A given
    /// date narrows the listing to that day; otherwise the next two
    /// weeks are shown.
    pub async fn open_slots(
        &self,
        doctor_id: &str,
        date: Option<NaiveDate>,
    ) -> Result<Vec<AvailabilitySlot>, AppError> {
        let today = Utc::now().date_naive();
        let date_filter = match date {
            Some(date) => format!("slot_date=eq.{}", date),
            None => format!(
                "slot_date=gte.{}&slot_date=lte.{}",
                today,
                today + Duration::days(OPEN_SLOTS_WINDOW_DAYS)
            ),
        };
        let path = format!(
            "/rest/v1/availability_slots?doctor_id=eq.{}&is_available=eq.true&{}&select=*&order=slot_date.asc,start_time.asc",
            doctor_id, date_filter
        );

        let rows: Vec<Value> = self
            .client
            .request(Method::GET, &path, None, None)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        rows.into_iter()
            .map(|row| {
                serde_json::from_value(row)
                    .map_err(|e| AppError::Internal(format!("Failed to parse slot row: {}", e)))
            })
            .collect()
    }

    /// The doctor's week ahead: every slot with the appointment holding
    /// it, grouped by day.
    pub async fn schedule(&self, doctor_id: &str) -> Result<Vec<ScheduleDay>, AppError> {
        let today = Utc::now().date_naive();
        let horizon = today + Duration::days(SCHEDULE_WINDOW_DAYS);

        let slot_path = format!(
            "/rest/v1/availability_slots?doctor_id=eq.{}&slot_date=gte.{}&slot_date=lte.{}&select=*&order=slot_date.asc,start_time.asc",
            doctor_id, today, horizon
        );
        let slot_rows: Vec<Value> = self
            .client
            .request(Method::GET, &slot_path, None, None)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let slots: Vec<AvailabilitySlot> = slot_rows
            .into_iter()
            .map(|row| {
                serde_json::from_value(row)
                    .map_err(|e| AppError::Internal(format!("Failed to parse slot row: {}", e)))
            })
            .collect::<Result<_, _>>()?;

        let appt_path = format!(
            "/rest/v1/appointments?doctor_id=eq.{}&status={}&select=id,patient_id,slot_id,status,reason,checked_in",
            doctor_id, ACTIVE_STATUSES
        );
        let appt_rows: Vec<Value> = self
            .client
            .request(Method::GET, &appt_path, None, None)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let appointments: Vec<BookedAppointment> = appt_rows
            .into_iter()
            .map(|row| {
                serde_json::from_value(row).map_err(|e| {
                    AppError::Internal(format!("Failed to parse appointment row: {}", e))
                })
            })
            .collect::<Result<_, _>>()?;

        let mut days: Vec<ScheduleDay> = Vec::new();
        for slot in slots {
            let appointment = appointments
                .iter()
                .find(|a| a.slot_id == slot.id)
                .cloned();

            match days.last_mut() {
                Some(day) if day.date == slot.slot_date => {
                    day.entries.push(ScheduleEntry { slot, appointment });
                }
                _ => days.push(ScheduleDay {
                    date: slot.slot_date,
                    entries: vec![ScheduleEntry { slot, appointment }],
                }),
            }
        }

        Ok(days)
    }

    pub async fn list_doctors(&self) -> Result<Vec<DoctorSummary>, AppError> {
        let path = "/rest/v1/users?role=eq.doctor&is_active=eq.true&select=id,full_name,email,specialty&order=full_name.asc";

        let rows: Vec<Value> = self
            .client
            .request(Method::GET, path, None, None)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        rows.into_iter()
            .map(|row| {
                serde_json::from_value(row)
                    .map_err(|e| AppError::Internal(format!("Failed to parse doctor row: {}", e)))
            })
            .collect()
    }
}
