// src/appointments/status.rs

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/*
Appointment lifecycle (owned by the backend, mirrored here):

SCHEDULED       -> CHECKED_IN | CANCELLED | NO_SHOW
CHECKED_IN      -> IN_CONSULTATION | CANCELLED
IN_CONSULTATION -> COMPLETED
COMPLETED, CANCELLED, NO_SHOW are terminal.
*/

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AppointmentStatus {
    Scheduled,
    CheckedIn,
    InConsultation,
    Completed,
    Cancelled,
    NoShow,
}

impl AppointmentStatus {
    pub const ALL: [AppointmentStatus; 6] = [
        AppointmentStatus::Scheduled,
        AppointmentStatus::CheckedIn,
        AppointmentStatus::InConsultation,
        AppointmentStatus::Completed,
        AppointmentStatus::Cancelled,
        AppointmentStatus::NoShow,
    ];

    /// Non-terminal statuses, in lifecycle order.
    pub const ACTIVE: [AppointmentStatus; 3] = [
        AppointmentStatus::Scheduled,
        AppointmentStatus::CheckedIn,
        AppointmentStatus::InConsultation,
    ];

    pub const TERMINAL: [AppointmentStatus; 3] = [
        AppointmentStatus::Completed,
        AppointmentStatus::Cancelled,
        AppointmentStatus::NoShow,
    ];

    /// Statuses that keep an appointment visible in UPCOMING even after its
    /// scheduled time has passed.
    pub const OPERATIONALLY_ACTIVE: [AppointmentStatus; 2] = [
        AppointmentStatus::CheckedIn,
        AppointmentStatus::InConsultation,
    ];

    pub fn is_terminal(self) -> bool {
        Self::TERMINAL.contains(&self)
    }

    pub fn next_statuses(self) -> &'static [AppointmentStatus] {
        use AppointmentStatus::*;
        match self {
            Scheduled => &[CheckedIn, Cancelled, NoShow],
            CheckedIn => &[InConsultation, Cancelled],
            InConsultation => &[Completed],
            Completed | Cancelled | NoShow => &[],
        }
    }

    pub fn can_transition_to(self, next: AppointmentStatus) -> bool {
        self.next_statuses().contains(&next)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AppointmentStatus::Scheduled => "SCHEDULED",
            AppointmentStatus::CheckedIn => "CHECKED_IN",
            AppointmentStatus::InConsultation => "IN_CONSULTATION",
            AppointmentStatus::Completed => "COMPLETED",
            AppointmentStatus::Cancelled => "CANCELLED",
            AppointmentStatus::NoShow => "NO_SHOW",
        }
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AppointmentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_uppercase();
        AppointmentStatus::ALL
            .into_iter()
            .find(|st| st.as_str() == wanted)
            .ok_or_else(|| format!("unknown appointment status: {s}"))
    }
}

/// Parse a comma separated status list (`SCHEDULED,CHECKED_IN`).
/// Blank entries are skipped; duplicates collapse.
pub fn parse_status_csv(raw: &str) -> Result<Vec<AppointmentStatus>, String> {
    let mut out: Vec<AppointmentStatus> = Vec::new();
    for part in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let st: AppointmentStatus = part.parse()?;
        if !out.contains(&st) {
            out.push(st);
        }
    }
    out.sort();
    Ok(out)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PrescriptionStatus {
    Draft,
    Issued,
    Dispensed,
    Cancelled,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_statuses_have_no_successors() {
        for st in AppointmentStatus::TERMINAL {
            assert!(st.is_terminal());
            assert!(st.next_statuses().is_empty());
        }
        for st in AppointmentStatus::ACTIVE {
            assert!(!st.is_terminal());
            assert!(!st.next_statuses().is_empty());
        }
    }

    #[test]
    fn test_transition_table() {
        use AppointmentStatus::*;
        assert!(Scheduled.can_transition_to(CheckedIn));
        assert!(Scheduled.can_transition_to(NoShow));
        assert!(!Scheduled.can_transition_to(Completed));
        assert!(CheckedIn.can_transition_to(InConsultation));
        assert!(CheckedIn.can_transition_to(Cancelled));
        assert!(!CheckedIn.can_transition_to(NoShow));
        assert!(InConsultation.can_transition_to(Completed));
        assert!(!InConsultation.can_transition_to(Cancelled));
    }

    #[test]
    fn test_status_wire_format() {
        let json = serde_json::to_string(&AppointmentStatus::InConsultation).unwrap();
        assert_eq!(json, "\"IN_CONSULTATION\"");
        let st: AppointmentStatus = serde_json::from_str("\"NO_SHOW\"").unwrap();
        assert_eq!(st, AppointmentStatus::NoShow);
    }

    #[test]
    fn test_parse_status_csv() {
        let parsed = parse_status_csv("checked_in, SCHEDULED,,SCHEDULED").unwrap();
        assert_eq!(
            parsed,
            vec![AppointmentStatus::Scheduled, AppointmentStatus::CheckedIn]
        );
        assert!(parse_status_csv("").unwrap().is_empty());
        assert!(parse_status_csv("SCHEDULED,ARRIVED").is_err());
    }

    #[test]
    fn test_prescription_status_wire_format() {
        let st: PrescriptionStatus = serde_json::from_str("\"DRAFT\"").unwrap();
        assert_eq!(st, PrescriptionStatus::Draft);
        assert!(serde_json::from_str::<PrescriptionStatus>("\"PENDING\"").is_err());
    }
}
