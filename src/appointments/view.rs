// src/appointments/view.rs
//
// UPCOMING needs two backend queries: the date-windowed main set, and the
// operationally active set whose scheduled time may already be in the past.
// Both are fetched concurrently, merged, sorted and paged here. Every other
// segment is a single server-paged query.

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use serde::Serialize;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::appointments::eligibility::{self, Eligibility};
use crate::appointments::merge::{
    PageSlice, SortKey, SortOrder, merge_by_id, paginate, retain_selected, sort_appointments,
    total_pages,
};
use crate::appointments::segment::{FilterEdits, ResolvedFilters, Segment, resolve};
use crate::appointments::status::AppointmentStatus;
use crate::backend::{AppointmentQuery, AppointmentSource, BackendError, MAX_BACKEND_PAGE_SIZE};
use crate::models::{Appointment, Page};

pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const MAX_PAGE_SIZE: u32 = 100;

/// Clinic-local calendar and display formatting.
#[derive(Debug, Clone)]
pub struct ClinicClock {
    pub offset: FixedOffset,
    pub date_format: String,
}

impl ClinicClock {
    pub fn today(&self, now: DateTime<Utc>) -> NaiveDate {
        now.with_timezone(&self.offset).date_naive()
    }

    pub fn display(&self, at: DateTime<Utc>) -> String {
        at.with_timezone(&self.offset)
            .format(&format!("{} %H:%M", self.date_format))
            .to_string()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ViewRequest {
    pub segment: Segment,
    pub edits: FilterEdits,
    pub search: Option<String>,
    pub doctor_id: Option<Uuid>,
    pub department_id: Option<Uuid>,
    pub sort_key: SortKey,
    pub sort_order: SortOrder,
    pub page: u32,
    pub page_size: u32,
}

impl Default for ViewRequest {
    fn default() -> Self {
        ViewRequest {
            segment: Segment::default(),
            edits: FilterEdits::default(),
            search: None,
            doctor_id: None,
            department_id: None,
            sort_key: SortKey::default(),
            sort_order: SortOrder::default(),
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AppointmentRow {
    #[serde(flatten)]
    pub appointment: Appointment,
    pub scheduled_display: String,
    #[serde(flatten)]
    pub eligibility: Eligibility,
}

impl AppointmentRow {
    pub fn build(
        appointment: Appointment,
        prescriptions: Option<&[crate::models::Prescription]>,
        now: DateTime<Utc>,
        clock: &ClinicClock,
    ) -> Self {
        let eligibility = eligibility::evaluate(&appointment, prescriptions, now);
        let scheduled_display = clock.display(appointment.scheduled_at);
        AppointmentRow {
            appointment,
            scheduled_display,
            eligibility,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Paging {
    Client,
    Server,
}

#[derive(Debug, Clone, Serialize)]
pub struct AppointmentView {
    pub filters: ResolvedFilters,
    pub sort_by: SortKey,
    pub sort_order: SortOrder,
    pub paging: Paging,
    pub items: Vec<AppointmentRow>,
    pub total: u64,
    pub page: u32,
    pub page_size: u32,
    pub total_pages: u32,
    /// The active-status override query failed; rows it would have added are missing.
    pub override_degraded: bool,
    /// A backend query hit its page cap, so `total` undercounts.
    pub truncated: bool,
}

fn base_query(req: &ViewRequest) -> AppointmentQuery {
    AppointmentQuery {
        page: 1,
        page_size: MAX_BACKEND_PAGE_SIZE,
        search: req.search.clone(),
        doctor_id: req.doctor_id,
        department_id: req.department_id,
        ..Default::default()
    }
}

/// Query A: the segment's own date window and status selection.
pub fn main_query(req: &ViewRequest, resolved: &ResolvedFilters) -> AppointmentQuery {
    AppointmentQuery {
        date_from: resolved.filters.date_from,
        date_to: resolved.filters.date_to,
        statuses: resolved.filters.statuses.clone(),
        ..base_query(req)
    }
}

/// Query B: operationally active appointments regardless of date.
pub fn override_query(req: &ViewRequest) -> AppointmentQuery {
    AppointmentQuery {
        statuses: AppointmentStatus::OPERATIONALLY_ACTIVE.to_vec(),
        ..base_query(req)
    }
}

pub async fn load_view<S: AppointmentSource + ?Sized>(
    source: &S,
    token: &str,
    req: &ViewRequest,
    now: DateTime<Utc>,
    clock: &ClinicClock,
) -> Result<AppointmentView, BackendError> {
    let today = clock.today(now);
    let resolved = resolve(req.segment, &req.edits, today);
    let page_size = req.page_size.clamp(1, MAX_PAGE_SIZE);

    debug!(
        segment = ?req.segment,
        corrected = resolved.corrected,
        "loading appointment view"
    );

    if req.segment.uses_active_override() {
        let main_q = main_query(req, &resolved);
        let override_q = override_query(req);

        let (main, overrides) = tokio::join!(
            source.list_appointments(token, &main_q),
            source.list_appointments(token, &override_q),
        );

        let main = main?;
        let (overrides, override_degraded) = match overrides {
            Ok(page) => (page, false),
            Err(e) => {
                warn!("active-status override query failed, showing date window only: {e}");
                (Page::empty(), true)
            }
        };

        let truncated = is_capped(&main) || is_capped(&overrides);
        if truncated {
            warn!(
                main_total = main.total,
                override_total = overrides.total,
                cap = MAX_BACKEND_PAGE_SIZE,
                "appointment view truncated at the backend page cap"
            );
        }

        let mut merged = merge_by_id(main.items, overrides.items);
        retain_selected(&mut merged, &resolved.filters);
        sort_appointments(&mut merged, req.sort_key, req.sort_order);
        let PageSlice {
            items,
            total,
            page,
            page_size,
            total_pages,
        } = paginate(merged, req.page, page_size);

        return Ok(AppointmentView {
            filters: resolved,
            sort_by: req.sort_key,
            sort_order: req.sort_order,
            paging: Paging::Client,
            items: items
                .into_iter()
                .map(|a| AppointmentRow::build(a, None, now, clock))
                .collect(),
            total,
            page,
            page_size,
            total_pages,
            override_degraded,
            truncated,
        });
    }

    let mut query = AppointmentQuery {
        page: req.page.max(1),
        page_size,
        ..main_query(req, &resolved)
    };
    let mut server_page = source.list_appointments(token, &query).await?;

    // Past the end: answer with the last page, as the client-paged branch does.
    let last_page = total_pages(server_page.total, page_size);
    if last_page > 0 && query.page > last_page {
        query.page = last_page;
        server_page = source.list_appointments(token, &query).await?;
    }

    let mut items = server_page.items;
    sort_appointments(&mut items, req.sort_key, req.sort_order);

    Ok(AppointmentView {
        filters: resolved,
        sort_by: req.sort_key,
        sort_order: req.sort_order,
        paging: Paging::Server,
        items: items
            .into_iter()
            .map(|a| AppointmentRow::build(a, None, now, clock))
            .collect(),
        total: server_page.total,
        page: query.page.min(last_page.max(1)),
        page_size,
        total_pages: last_page,
        override_degraded: false,
        truncated: false,
    })
}

fn is_capped<T>(page: &Page<T>) -> bool {
    page.total > page.items.len() as u64
}
