use chrono::{Duration, Utc};
use serde_json::{json, Map, Value};
use tracing::{info, warn};

use doctor_cell::models::AvailabilitySlot;
use notification_cell::services::notify::NotificationService;
use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;
use shared_database::Method;
use shared_models::auth::{AuthUser, UserRole};
use shared_models::error::AppError;

use crate::models::{
    Appointment, AppointmentError, AppointmentStatus, BookAppointmentRequest,
    UpdateAppointmentRequest,
};
use crate::services::lifecycle;

const MAX_DAYS_AHEAD: i64 = 90;

pub struct BookingService {
    client: SupabaseClient,
    notifier: NotificationService,
}

impl BookingService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: SupabaseClient::new(config),
            notifier: NotificationService::new(config),
        }
    }

    pub async fn book(
        &self,
        patient: &AuthUser,
        request: BookAppointmentRequest,
    ) -> Result<Appointment, AppError> {
        let slot = self.get_slot(&request.slot_id).await?;

        if slot.doctor_id != request.doctor_id {
            return Err(AppError::BadRequest(
                "Slot does not belong to that doctor".to_string(),
            ));
        }

        let now = Utc::now();
        let today = now.date_naive();
        if slot.slot_date < today || (slot.slot_date == today && slot.start_time <= now.time()) {
            return Err(AppError::ValidationError(
                "Cannot book a slot in the past".to_string(),
            ));
        }
        if slot.slot_date > today + Duration::days(MAX_DAYS_AHEAD) {
            return Err(AppError::ValidationError(format!(
                "Cannot book more than {} days ahead",
                MAX_DAYS_AHEAD
            )));
        }

        let doctor_name = self
            .lookup_name(&request.doctor_id, Some(UserRole::Doctor))
            .await?
            .ok_or_else(|| AppError::NotFound("Doctor not found".to_string()))?;

        self.claim_slot(&slot.id).await?;

        let row = json!({
            "patient_id": patient.id,
            "doctor_id": request.doctor_id,
            "slot_id": request.slot_id,
            "status": AppointmentStatus::Confirmed.to_string(),
            "reason": request.reason,
            "checked_in": false
        });

        let created = match self.client.insert_returning("appointments", json!([row]), None).await
        {
            Ok(rows) => rows,
            Err(e) => {
                // Give the slot back so a failed insert does not leak it.
                self.release_slot(&slot.id).await;
                return Err(AppError::Database(e.to_string()));
            }
        };

        let row = created
            .into_iter()
            .next()
            .ok_or_else(|| AppError::Database("Appointment insert returned no rows".to_string()))?;
        let appointment = parse_appointment(row)?;

        let patient_name = patient
            .full_name
            .clone()
            .unwrap_or_else(|| "A patient".to_string());
        let when = format!("{} at {}", slot.slot_date, slot.start_time.format("%H:%M"));

        self.notifier
            .notify(
                &patient.id,
                Some(&appointment.id),
                &format!(
                    "Your appointment with {} on {} is confirmed.",
                    doctor_name, when
                ),
            )
            .await;
        self.notifier
            .notify(
                &appointment.doctor_id,
                Some(&appointment.id),
                &format!("New appointment booked by {} on {}.", patient_name, when),
            )
            .await;

        info!(
            "Patient {} booked appointment {} with doctor {}",
            patient.id, appointment.id, appointment.doctor_id
        );
        Ok(appointment)
    }

    pub async fn cancel(
        &self,
        user: &AuthUser,
        appointment_id: &str,
    ) -> Result<Appointment, AppError> {
        let appointment = self.get_appointment(appointment_id).await?;

        if user.id != appointment.patient_id && user.id != appointment.doctor_id {
            return Err(AppError::Forbidden(
                "You can only cancel your own appointments".to_string(),
            ));
        }

        lifecycle::validate_transition(appointment.status, AppointmentStatus::Cancelled)
            .map_err(AppError::from)?;

        let updated = self
            .patch_appointment(
                appointment_id,
                json!({
                    "status": AppointmentStatus::Cancelled.to_string(),
                    "updated_at": Utc::now().to_rfc3339()
                }),
            )
            .await?;

        self.release_slot(&updated.slot_id).await;

        let canceller = user
            .full_name
            .clone()
            .unwrap_or_else(|| "the other party".to_string());
        let other_party = if user.id == updated.patient_id {
            &updated.doctor_id
        } else {
            &updated.patient_id
        };
        self.notifier
            .notify(
                other_party,
                Some(&updated.id),
                &format!("Your appointment was cancelled by {}.", canceller),
            )
            .await;

        info!("Appointment {} cancelled by {}", updated.id, user.id);
        Ok(updated)
    }

    pub async fn reschedule(
        &self,
        patient: &AuthUser,
        appointment_id: &str,
        new_slot_id: &str,
    ) -> Result<Appointment, AppError> {
        let appointment = self.get_appointment(appointment_id).await?;

        if patient.id != appointment.patient_id {
            return Err(AppError::Forbidden(
                "You can only reschedule your own appointments".to_string(),
            ));
        }

        if lifecycle::is_terminal(appointment.status) {
            return Err(AppError::Conflict(format!(
                "Cannot reschedule a {} appointment",
                appointment.status
            )));
        }

        let new_slot = self.get_slot(new_slot_id).await?;
        if new_slot.doctor_id != appointment.doctor_id {
            return Err(AppError::BadRequest(
                "New slot belongs to a different doctor".to_string(),
            ));
        }

        let now = Utc::now();
        let today = now.date_naive();
        if new_slot.slot_date < today
            || (new_slot.slot_date == today && new_slot.start_time <= now.time())
        {
            return Err(AppError::ValidationError(
                "Cannot reschedule into the past".to_string(),
            ));
        }

        self.claim_slot(new_slot_id).await?;

        let old_slot_id = appointment.slot_id.clone();
        let updated = match self
            .patch_appointment(
                appointment_id,
                json!({
                    "slot_id": new_slot_id,
                    "updated_at": Utc::now().to_rfc3339()
                }),
            )
            .await
        {
            Ok(appointment) => appointment,
            Err(e) => {
                self.release_slot(new_slot_id).await;
                return Err(e);
            }
        };

        self.release_slot(&old_slot_id).await;

        let patient_name = patient
            .full_name
            .clone()
            .unwrap_or_else(|| "A patient".to_string());
        self.notifier
            .notify(
                &updated.doctor_id,
                Some(&updated.id),
                &format!(
                    "{} moved an appointment to {} at {}.",
                    patient_name,
                    new_slot.slot_date,
                    new_slot.start_time.format("%H:%M")
                ),
            )
            .await;

        info!(
            "Appointment {} rescheduled from slot {} to slot {}",
            updated.id, old_slot_id, new_slot_id
        );
        Ok(updated)
    }

    pub async fn check_in(
        &self,
        nurse: &AuthUser,
        appointment_id: &str,
    ) -> Result<Appointment, AppError> {
        let appointment = self.get_appointment(appointment_id).await?;

        if appointment.status != AppointmentStatus::Confirmed {
            return Err(AppError::Conflict(
                "Only confirmed appointments can be checked in".to_string(),
            ));
        }
        if appointment.checked_in {
            return Err(AppError::Conflict(
                "Patient is already checked in".to_string(),
            ));
        }

        let updated = self
            .patch_appointment(
                appointment_id,
                json!({
                    "checked_in": true,
                    "checked_in_time": Utc::now().to_rfc3339(),
                    "nurse_id": nurse.id,
                    "updated_at": Utc::now().to_rfc3339()
                }),
            )
            .await?;

        let patient_name = self
            .lookup_name(&updated.patient_id, None)
            .await?
            .unwrap_or_else(|| "Your patient".to_string());
        self.notifier
            .notify(
                &updated.doctor_id,
                Some(&updated.id),
                &format!("{} has checked in.", patient_name),
            )
            .await;

        info!("Nurse {} checked in appointment {}", nurse.id, updated.id);
        Ok(updated)
    }

    pub async fn update(
        &self,
        doctor: &AuthUser,
        appointment_id: &str,
        request: UpdateAppointmentRequest,
    ) -> Result<Appointment, AppError> {
        let appointment = self.get_appointment(appointment_id).await?;

        if doctor.id != appointment.doctor_id {
            return Err(AppError::Forbidden(
                "You can only update your own appointments".to_string(),
            ));
        }

        let mut patch = Map::new();

        if let Some(status) = request.status {
            if status == AppointmentStatus::Cancelled {
                return Err(AppError::BadRequest(
                    "Use the cancel endpoint to cancel an appointment".to_string(),
                ));
            }
            lifecycle::validate_transition(appointment.status, status)
                .map_err(AppError::from)?;
            patch.insert("status".to_string(), json!(status.to_string()));
        }
        if let Some(notes) = request.notes {
            patch.insert("notes".to_string(), json!(notes));
        }

        if patch.is_empty() {
            return Err(AppError::BadRequest("No fields to update".to_string()));
        }
        patch.insert("updated_at".to_string(), json!(Utc::now().to_rfc3339()));

        self.patch_appointment(appointment_id, Value::Object(patch))
            .await
    }

    pub async fn get_for_user(
        &self,
        user: &AuthUser,
        appointment_id: &str,
    ) -> Result<Appointment, AppError> {
        let appointment = self.get_appointment(appointment_id).await?;

        let allowed = user.id == appointment.patient_id
            || user.id == appointment.doctor_id
            || user.has_role(UserRole::Nurse);
        if !allowed {
            return Err(AppError::Forbidden(
                "You do not have access to this appointment".to_string(),
            ));
        }

        Ok(appointment)
    }

    pub async fn list_for_user(&self, user: &AuthUser) -> Result<Vec<Appointment>, AppError> {
        let filter = match user.role {
            Some(UserRole::Patient) => format!("patient_id=eq.{}", user.id),
            Some(UserRole::Doctor) => format!("doctor_id=eq.{}", user.id),
            // Nurses work the front desk and see every open appointment.
            Some(UserRole::Nurse) => "status=in.(requested,confirmed)".to_string(),
            None => {
                return Err(AppError::Forbidden(
                    "You do not have permission to access this resource".to_string(),
                ))
            }
        };

        let path = format!(
            "/rest/v1/appointments?{}&select=*&order=created_at.desc",
            filter
        );

        let rows: Vec<Value> = self
            .client
            .request(Method::GET, &path, None, None)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        rows.into_iter().map(parse_appointment).collect()
    }

    async fn get_slot(&self, slot_id: &str) -> Result<AvailabilitySlot, AppError> {
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

        serde_json::from_value(row)
            .map_err(|e| AppError::Internal(format!("Failed to parse slot row: {}", e)))
    }

    async fn get_appointment(&self, appointment_id: &str) -> Result<Appointment, AppError> {
        let rows: Vec<Value> = self
            .client
            .request(
                Method::GET,
                &format!("/rest/v1/appointments?id=eq.{}&select=*", appointment_id),
                None,
                None,
            )
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| AppError::NotFound("Appointment not found".to_string()))?;

        parse_appointment(row)
    }

    async fn patch_appointment(
        &self,
        appointment_id: &str,
        body: Value,
    ) -> Result<Appointment, AppError> {
        let updated = self
            .client
            .update_returning(
                &format!("/rest/v1/appointments?id=eq.{}", appointment_id),
                body,
                None,
            )
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let row = updated
            .into_iter()
            .next()
            .ok_or_else(|| AppError::NotFound("Appointment not found".to_string()))?;

        parse_appointment(row)
    }

    /// Flip the slot to unavailable only if it is still open. An empty
    /// result means someone else claimed it first.
    async fn claim_slot(&self, slot_id: &str) -> Result<(), AppError> {
        let claimed = self
            .client
            .update_returning(
                &format!(
                    "/rest/v1/availability_slots?id=eq.{}&is_available=eq.true",
                    slot_id
                ),
                json!({ "is_available": false }),
                None,
            )
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        if claimed.is_empty() {
            return Err(AppointmentError::SlotTaken.into());
        }

        Ok(())
    }

    async fn release_slot(&self, slot_id: &str) {
        let result = self
            .client
            .update_returning(
                &format!("/rest/v1/availability_slots?id=eq.{}", slot_id),
                json!({ "is_available": true }),
                None,
            )
            .await;

        if let Err(e) = result {
            warn!("Failed to release slot {}: {}", slot_id, e);
        }
    }

    async fn lookup_name(
        &self,
        user_id: &str,
        role: Option<UserRole>,
    ) -> Result<Option<String>, AppError> {
        let mut path = format!("/rest/v1/users?id=eq.{}&select=full_name", user_id);
        if let Some(role) = role {
            path.push_str(&format!("&role=eq.{}", role));
        }

        let rows: Vec<Value> = self
            .client
            .request(Method::GET, &path, None, None)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(rows
            .into_iter()
            .next()
            .and_then(|row| row.get("full_name").and_then(Value::as_str).map(String::from)))
    }
}

fn parse_appointment(row: Value) -> Result<Appointment, AppError> {
    serde_json::from_value(row)
        .map_err(|e| AppError::Internal(format!("Failed to parse appointment row: {}", e)))
}
