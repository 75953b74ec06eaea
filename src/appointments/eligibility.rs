// src/appointments/eligibility.rs
//
// Which lifecycle actions the UI may offer for an appointment right now.
//
// Every function here is a pure predicate over `(appointment, now)`. The
// backend remains the authority; these only decide what is offered.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::appointments::status::{AppointmentStatus, PrescriptionStatus};
use crate::models::{Appointment, Prescription};

/// Check-in opens this long before the scheduled time.
pub const CHECK_IN_LEAD_MINUTES: i64 = 120;

/// A SCHEDULED appointment becomes a no-show candidate this long after its time.
pub const NO_SHOW_GRACE_MINUTES: i64 = 30;

pub fn can_check_in(a: &Appointment, now: DateTime<Utc>) -> bool {
    // Late arrivals and walk-ins are always allowed; only early check-in is gated.
    a.status == AppointmentStatus::Scheduled
        && now >= a.scheduled_at - Duration::minutes(CHECK_IN_LEAD_MINUTES)
}

pub fn can_start_consultation(a: &Appointment, _now: DateTime<Utc>) -> bool {
    a.status.can_transition_to(AppointmentStatus::InConsultation)
}

pub fn can_reschedule(a: &Appointment, _now: DateTime<Utc>) -> bool {
    !a.status.is_terminal()
}

pub fn can_cancel(a: &Appointment, _now: DateTime<Utc>) -> bool {
    !a.status.is_terminal()
}

pub fn should_mark_no_show(a: &Appointment, now: DateTime<Utc>) -> bool {
    a.status == AppointmentStatus::Scheduled
        && now > a.scheduled_at + Duration::minutes(NO_SHOW_GRACE_MINUTES)
}

pub fn has_draft_prescription(prescriptions: &[Prescription]) -> bool {
    prescriptions
        .iter()
        .any(|p| p.status == PrescriptionStatus::Draft)
}

pub fn can_close_visit(a: &Appointment, prescriptions: &[Prescription]) -> bool {
    a.status.can_transition_to(AppointmentStatus::Completed)
        && !has_draft_prescription(prescriptions)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentAction {
    CheckIn,
    StartConsultation,
    CloseVisit,
    Reschedule,
    Cancel,
    MarkNoShow,
}

/// Everything the UI should render for one appointment's action bar.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Eligibility {
    pub actions: Vec<AppointmentAction>,
    pub no_show_due: bool,
    /// Close visit is otherwise permitted but a DRAFT prescription blocks it.
    pub close_blocked_by_draft: bool,
}

impl Eligibility {
    pub fn allows(&self, action: AppointmentAction) -> bool {
        self.actions.contains(&action)
    }
}

/// `prescriptions` is `None` when they were not loaded (list views); close
/// visit is then judged on status alone and verified again on the action.
pub fn evaluate(
    a: &Appointment,
    prescriptions: Option<&[Prescription]>,
    now: DateTime<Utc>,
) -> Eligibility {
    let mut actions = Vec::new();

    if can_check_in(a, now) {
        actions.push(AppointmentAction::CheckIn);
    }
    if can_start_consultation(a, now) {
        actions.push(AppointmentAction::StartConsultation);
    }

    let status_allows_close = a.status.can_transition_to(AppointmentStatus::Completed);
    let close_blocked_by_draft =
        status_allows_close && prescriptions.is_some_and(has_draft_prescription);
    if can_close_visit(a, prescriptions.unwrap_or_default()) {
        actions.push(AppointmentAction::CloseVisit);
    }

    if can_reschedule(a, now) {
        actions.push(AppointmentAction::Reschedule);
    }
    if can_cancel(a, now) {
        actions.push(AppointmentAction::Cancel);
    }

    let no_show_due = should_mark_no_show(a, now);
    if no_show_due {
        actions.push(AppointmentAction::MarkNoShow);
    }

    Eligibility {
        actions,
        no_show_due,
        close_blocked_by_draft,
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use chrono::{DateTime, TimeZone, Utc};
    use uuid::Uuid;

    use crate::appointments::status::{AppointmentStatus, PrescriptionStatus};
    use crate::models::{Appointment, Prescription};

    pub fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    pub fn appt(status: AppointmentStatus, scheduled_at: DateTime<Utc>) -> Appointment {
        appt_named(Uuid::new_v4(), "Asha Verma", status, scheduled_at)
    }

    pub fn appt_named(
        id: Uuid,
        patient_name: &str,
        status: AppointmentStatus,
        scheduled_at: DateTime<Utc>,
    ) -> Appointment {
        Appointment {
            id,
            patient_id: Uuid::new_v4(),
            patient_name: patient_name.to_string(),
            doctor_id: None,
            doctor_name: Some("Dr. Rao".into()),
            department_id: None,
            department_name: Some("General Medicine".into()),
            scheduled_at,
            status,
            reason: None,
            notes: None,
            created_at: None,
            updated_at: None,
        }
    }

    pub fn rx(a: &Appointment, status: PrescriptionStatus) -> Prescription {
        Prescription {
            id: Uuid::new_v4(),
            appointment_id: Some(a.id),
            patient_id: a.patient_id,
            status,
            created_at: None,
            items: vec![],
        }
    }
}
