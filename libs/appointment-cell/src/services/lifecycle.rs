use tracing::{debug, warn};

use crate::models::{AppointmentError, AppointmentStatus};

/// The statuses an appointment may move to from `current`.
pub fn valid_transitions(current: AppointmentStatus) -> &'static [AppointmentStatus] {
    match current {
        AppointmentStatus::Requested => {
            &[AppointmentStatus::Confirmed, AppointmentStatus::Cancelled]
        }
        AppointmentStatus::Confirmed => {
            &[AppointmentStatus::Completed, AppointmentStatus::Cancelled]
        }
        // Terminal states.
        AppointmentStatus::Cancelled | AppointmentStatus::Completed => &[],
    }
}

pub fn validate_transition(
    from: AppointmentStatus,
    to: AppointmentStatus,
) -> Result<(), AppointmentError> {
    debug!("Validating status transition {} -> {}", from, to);

    if !valid_transitions(from).contains(&to) {
        warn!("Invalid status transition attempted: {} -> {}", from, to);
        return Err(AppointmentError::InvalidStatusTransition { from, to });
    }

    Ok(())
}

pub fn is_terminal(status: AppointmentStatus) -> bool {
    valid_transitions(status).is_empty()
}
