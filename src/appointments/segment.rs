// src/appointments/segment.rs
//
// Time segments of the appointment list and their filter rules.
//
// `resolve` is the only entry point: it applies the user's edits on top of the
// segment defaults and then clamps the result back into the segment. It runs
// once per request, before any backend query is built.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::appointments::status::AppointmentStatus;

/// How far back PAST looks by default.
pub const PAST_LOOKBACK_DAYS: i64 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Segment {
    #[default]
    Upcoming,
    Today,
    Past,
    All,
}

impl Segment {
    pub const ALL_SEGMENTS: [Segment; 4] =
        [Segment::Upcoming, Segment::Today, Segment::Past, Segment::All];

    pub fn parse(raw: &str) -> Option<Segment> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "UPCOMING" => Some(Segment::Upcoming),
            "TODAY" => Some(Segment::Today),
            "PAST" => Some(Segment::Past),
            "ALL" => Some(Segment::All),
            _ => None,
        }
    }

    /// Statuses a user may select in this segment.
    pub fn allowed_statuses(self) -> &'static [AppointmentStatus] {
        match self {
            Segment::Upcoming => &AppointmentStatus::ACTIVE,
            Segment::Past => &AppointmentStatus::TERMINAL,
            Segment::Today | Segment::All => &AppointmentStatus::ALL,
        }
    }

    /// Whether the segment needs the active-status override query.
    pub fn uses_active_override(self) -> bool {
        self == Segment::Upcoming
    }

    pub fn defaults(self, today: NaiveDate) -> SegmentFilters {
        match self {
            Segment::Upcoming => SegmentFilters {
                statuses: AppointmentStatus::ACTIVE.to_vec(),
                date_from: Some(today),
                date_to: None,
            },
            Segment::Today => SegmentFilters {
                statuses: AppointmentStatus::ACTIVE.to_vec(),
                date_from: Some(today),
                date_to: Some(today),
            },
            Segment::Past => SegmentFilters {
                statuses: AppointmentStatus::TERMINAL.to_vec(),
                date_from: Some(today - Duration::days(PAST_LOOKBACK_DAYS)),
                date_to: Some(yesterday(today)),
            },
            Segment::All => SegmentFilters::default(),
        }
    }
}

fn yesterday(today: NaiveDate) -> NaiveDate {
    today.pred_opt().unwrap_or(today)
}

/// Effective filters for one segment. Empty `statuses` means unrestricted.
/// Date bounds are inclusive calendar days in clinic time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SegmentFilters {
    pub statuses: Vec<AppointmentStatus>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
}

impl SegmentFilters {
    pub fn admits(&self, status: AppointmentStatus) -> bool {
        self.statuses.is_empty() || self.statuses.contains(&status)
    }
}

/// What the user changed. Outer `None` = untouched (keep the default);
/// `Some(None)` on a date = explicitly cleared.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterEdits {
    pub statuses: Option<Vec<AppointmentStatus>>,
    pub date_from: Option<Option<NaiveDate>>,
    pub date_to: Option<Option<NaiveDate>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedFilters {
    pub segment: Segment,
    #[serde(flatten)]
    pub filters: SegmentFilters,
    /// The user's edits were pulled back into the segment's valid range.
    pub corrected: bool,
}

pub fn resolve(segment: Segment, edits: &FilterEdits, today: NaiveDate) -> ResolvedFilters {
    let mut requested = segment.defaults(today);
    if let Some(st) = &edits.statuses {
        requested.statuses = normalize_statuses(st);
    }
    if let Some(d) = edits.date_from {
        requested.date_from = d;
    }
    if let Some(d) = edits.date_to {
        requested.date_to = d;
    }

    let filters = clamp(segment, requested.clone(), today);
    let corrected = filters != requested;

    ResolvedFilters {
        segment,
        filters,
        corrected,
    }
}

fn normalize_statuses(st: &[AppointmentStatus]) -> Vec<AppointmentStatus> {
    let mut out = st.to_vec();
    out.sort();
    out.dedup();
    out
}

fn clamp(segment: Segment, mut f: SegmentFilters, today: NaiveDate) -> SegmentFilters {
    // statuses
    match segment {
        Segment::Upcoming | Segment::Past => {
            let allowed = segment.allowed_statuses();
            f.statuses.retain(|s| allowed.contains(s));
            if f.statuses.is_empty() {
                f.statuses = allowed.to_vec();
            }
        }
        Segment::Today | Segment::All => {}
    }

    // dates
    match segment {
        Segment::Upcoming => {
            let from = f.date_from.map_or(today, |d| d.max(today));
            f.date_from = Some(from);
            f.date_to = f.date_to.map(|d| d.max(from));
        }
        Segment::Today => {
            f.date_from = Some(today);
            f.date_to = Some(today);
        }
        Segment::Past => {
            let last = yesterday(today);
            let to = f.date_to.map_or(last, |d| d.min(last));
            f.date_to = Some(to);
            f.date_from = f.date_from.map(|d| d.min(to));
        }
        Segment::All => {}
    }

    f
}
