// src/routes/appointment_routes.rs

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, post},
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    appointments::{
        eligibility::{self, AppointmentAction},
        merge::{SortKey, SortOrder},
        segment::{FilterEdits, Segment},
        status::parse_status_csv,
        view::{
            AppointmentRow, AppointmentView, ClinicClock, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE,
            ViewRequest, load_view,
        },
    },
    backend::{AppointmentDesk, LifecycleCall},
    error::ApiError,
    i18n::Msg,
    middleware::auth_context::AuthContext,
    models::{ApiOk, AppState, Appointment, Prescription},
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/appointments/view", get(view_appointments))
        .route("/appointments/{appointment_id}", get(get_appointment))
        .route("/appointments/{appointment_id}/check-in", post(check_in))
        .route(
            "/appointments/{appointment_id}/start-consultation",
            post(start_consultation),
        )
        .route("/appointments/{appointment_id}/close-visit", post(close_visit))
        .route("/appointments/{appointment_id}/cancel", post(cancel))
        .route("/appointments/{appointment_id}/no-show", post(mark_no_show))
        .route("/appointments/{appointment_id}/reschedule", post(reschedule))
}

/* =========================================================
   List view
   ========================================================= */

/// Raw query string. Everything arrives as text so that an empty value
/// (`date_from=`) can mean "cleared" rather than failing to parse.
#[derive(Debug, Default, Deserialize)]
pub struct ViewParams {
    pub segment: Option<String>,
    pub status: Option<String>,
    pub date_from: Option<String>,
    pub date_to: Option<String>,
    pub search: Option<String>,
    pub doctor_id: Option<String>,
    pub department_id: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
    pub page: Option<String>,
    pub page_size: Option<String>,
}

fn parse_date_edit(field: &str, raw: Option<&str>) -> Result<Option<Option<NaiveDate>>, ApiError> {
    match raw.map(str::trim) {
        None => Ok(None),
        Some("") => Ok(Some(None)),
        Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map(|d| Some(Some(d)))
            .map_err(|_| ApiError::validation(format!("{field} must be YYYY-MM-DD"))),
    }
}

fn parse_uuid_opt(field: &str, raw: Option<&str>) -> Result<Option<Uuid>, ApiError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => Uuid::parse_str(s)
            .map(Some)
            .map_err(|_| ApiError::validation(format!("{field} must be a UUID"))),
    }
}

fn parse_u32_in(
    field: &str,
    raw: Option<&str>,
    default: u32,
    min: u32,
    max: u32,
) -> Result<u32, ApiError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(default),
        Some(s) => match s.parse::<u32>() {
            Ok(n) if (min..=max).contains(&n) => Ok(n),
            _ => Err(ApiError::validation(format!(
                "{field} must be between {min} and {max}"
            ))),
        },
    }
}

fn non_blank(raw: Option<String>) -> Option<String> {
    raw.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

pub fn parse_view_params(p: ViewParams) -> Result<ViewRequest, ApiError> {
    let segment = match p.segment.as_deref().map(str::trim) {
        None | Some("") => Segment::default(),
        Some(s) => Segment::parse(s)
            .ok_or_else(|| ApiError::validation(format!("unknown segment: {s}")))?,
    };

    let statuses = match p.status.as_deref() {
        None => None,
        Some(raw) => Some(parse_status_csv(raw).map_err(ApiError::validation)?),
    };

    let edits = FilterEdits {
        statuses,
        date_from: parse_date_edit("date_from", p.date_from.as_deref())?,
        date_to: parse_date_edit("date_to", p.date_to.as_deref())?,
    };

    let sort_key = match p.sort_by.as_deref().map(str::trim) {
        None | Some("") => SortKey::default(),
        Some(s) => SortKey::parse(s)
            .ok_or_else(|| ApiError::validation(format!("sort_by not supported: {s}")))?,
    };
    let sort_order = match p.sort_order.as_deref().map(str::trim) {
        None | Some("") => SortOrder::default(),
        Some(s) => SortOrder::parse(s)
            .ok_or_else(|| ApiError::validation("sort_order must be asc or desc"))?,
    };

    Ok(ViewRequest {
        segment,
        edits,
        search: non_blank(p.search),
        doctor_id: parse_uuid_opt("doctor_id", p.doctor_id.as_deref())?,
        department_id: parse_uuid_opt("department_id", p.department_id.as_deref())?,
        sort_key,
        sort_order,
        page: parse_u32_in("page", p.page.as_deref(), 1, 1, u32::MAX)?,
        page_size: parse_u32_in(
            "page_size",
            p.page_size.as_deref(),
            DEFAULT_PAGE_SIZE,
            1,
            MAX_PAGE_SIZE,
        )?,
    })
}

pub async fn view_appointments(
    State(state): State<AppState>,
    auth: AuthContext,
    Query(params): Query<ViewParams>,
) -> Result<Json<ApiOk<AppointmentView>>, ApiError> {
    let req = parse_view_params(params)?;
    let view = load_view(
        &state.backend,
        &auth.token,
        &req,
        Utc::now(),
        &state.clinic_clock(),
    )
    .await
    .map_err(|e| ApiError::from_backend(e, auth.lang))?;

    Ok(Json(ApiOk { data: view }))
}

/* =========================================================
   Detail
   ========================================================= */

#[derive(Debug, Serialize)]
pub struct AppointmentDetail {
    pub appointment: AppointmentRow,
    /// `None` when the prescriptions could not be read (no access, backend error).
    pub prescriptions: Option<Vec<Prescription>>,
}

/// Prescriptions are optional on every response: a caller who may not read
/// them still gets the appointment.
async fn prescriptions_or_none<D: AppointmentDesk + ?Sized>(
    desk: &D,
    auth: &AuthContext,
    appointment_id: Uuid,
) -> Option<Vec<Prescription>> {
    match desk.list_prescriptions(&auth.token, appointment_id).await {
        Ok(items) => Some(items),
        Err(e) => {
            tracing::warn!(
                session = %auth.fingerprint(),
                %appointment_id,
                "prescriptions unavailable: {e}"
            );
            None
        }
    }
}

fn detail(
    appointment: Appointment,
    prescriptions: Option<Vec<Prescription>>,
    now: DateTime<Utc>,
    clock: &ClinicClock,
) -> AppointmentDetail {
    AppointmentDetail {
        appointment: AppointmentRow::build(appointment, prescriptions.as_deref(), now, clock),
        prescriptions,
    }
}

pub async fn load_detail<D: AppointmentDesk + ?Sized>(
    desk: &D,
    auth: &AuthContext,
    appointment_id: Uuid,
    now: DateTime<Utc>,
    clock: &ClinicClock,
) -> Result<AppointmentDetail, ApiError> {
    let (appointment, prescriptions) = tokio::join!(
        desk.get_appointment(&auth.token, appointment_id),
        prescriptions_or_none(desk, auth, appointment_id),
    );
    let appointment = appointment.map_err(|e| ApiError::from_backend(e, auth.lang))?;

    Ok(detail(appointment, prescriptions, now, clock))
}

pub async fn get_appointment(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(appointment_id): Path<Uuid>,
) -> Result<Json<ApiOk<AppointmentDetail>>, ApiError> {
    let detail = load_detail(
        &state.backend,
        &auth,
        appointment_id,
        Utc::now(),
        &state.clinic_clock(),
    )
    .await?;
    Ok(Json(ApiOk { data: detail }))
}

/* =========================================================
   Actions
   ========================================================= */

/// Re-checks eligibility against fresh data, forwards the call, and answers
/// with the appointment the backend returned. Once the backend has applied
/// the call, nothing after it can turn the response into an error.
pub async fn perform<D: AppointmentDesk + ?Sized>(
    desk: &D,
    auth: &AuthContext,
    appointment_id: Uuid,
    call: LifecycleCall,
    now: DateTime<Utc>,
    clock: &ClinicClock,
) -> Result<AppointmentDetail, ApiError> {
    let action = call.action();
    let current = desk
        .get_appointment(&auth.token, appointment_id)
        .await
        .map_err(|e| ApiError::from_backend(e, auth.lang))?;

    // Only closing the visit depends on prescriptions.
    let prescriptions = if action == AppointmentAction::CloseVisit {
        Some(
            desk.list_prescriptions(&auth.token, appointment_id)
                .await
                .map_err(|e| ApiError::from_backend(e, auth.lang))?,
        )
    } else {
        None
    };

    let eligibility = eligibility::evaluate(&current, prescriptions.as_deref(), now);
    if !eligibility.allows(action) {
        tracing::info!(
            session = %auth.fingerprint(),
            %appointment_id,
            ?action,
            status = %current.status,
            "action refused"
        );
        let msg = if eligibility.close_blocked_by_draft {
            Msg::DraftPrescriptionOpen
        } else {
            Msg::ActionNotAvailable
        };
        return Err(ApiError::action_not_available(auth.lang, msg));
    }

    let updated = desk
        .apply(&auth.token, appointment_id, &call)
        .await
        .map_err(|e| ApiError::from_backend(e, auth.lang))?;

    tracing::info!(
        session = %auth.fingerprint(),
        %appointment_id,
        ?action,
        status = %updated.status,
        "action applied"
    );

    let prescriptions = prescriptions_or_none(desk, auth, appointment_id).await;
    Ok(detail(updated, prescriptions, now, clock))
}

async fn perform_for(
    state: &AppState,
    auth: &AuthContext,
    appointment_id: Uuid,
    call: LifecycleCall,
) -> Result<Json<ApiOk<AppointmentDetail>>, ApiError> {
    let detail = perform(
        &state.backend,
        auth,
        appointment_id,
        call,
        Utc::now(),
        &state.clinic_clock(),
    )
    .await?;
    Ok(Json(ApiOk { data: detail }))
}

pub async fn check_in(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(appointment_id): Path<Uuid>,
) -> Result<Json<ApiOk<AppointmentDetail>>, ApiError> {
    perform_for(&state, &auth, appointment_id, LifecycleCall::CheckIn).await
}

pub async fn start_consultation(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(appointment_id): Path<Uuid>,
) -> Result<Json<ApiOk<AppointmentDetail>>, ApiError> {
    perform_for(&state, &auth, appointment_id, LifecycleCall::StartConsultation).await
}

pub async fn close_visit(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(appointment_id): Path<Uuid>,
) -> Result<Json<ApiOk<AppointmentDetail>>, ApiError> {
    perform_for(&state, &auth, appointment_id, LifecycleCall::Complete).await
}

pub async fn mark_no_show(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(appointment_id): Path<Uuid>,
) -> Result<Json<ApiOk<AppointmentDetail>>, ApiError> {
    perform_for(&state, &auth, appointment_id, LifecycleCall::NoShow).await
}

pub const MAX_CANCEL_REASON_CHARS: usize = 500;

#[derive(Debug, Default, Deserialize)]
pub struct CancelRequest {
    pub reason: Option<String>,
}

fn cancel_call(req: CancelRequest) -> Result<LifecycleCall, ApiError> {
    let reason = non_blank(req.reason);
    if reason
        .as_ref()
        .is_some_and(|r| r.chars().count() > MAX_CANCEL_REASON_CHARS)
    {
        return Err(ApiError::validation(format!(
            "reason must be at most {MAX_CANCEL_REASON_CHARS} characters"
        )));
    }
    Ok(LifecycleCall::Cancel { reason })
}

pub async fn cancel(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(appointment_id): Path<Uuid>,
    Json(req): Json<CancelRequest>,
) -> Result<Json<ApiOk<AppointmentDetail>>, ApiError> {
    let call = cancel_call(req)?;
    perform_for(&state, &auth, appointment_id, call).await
}

#[derive(Debug, Deserialize)]
pub struct RescheduleRequest {
    pub scheduled_at: DateTime<Utc>,
}

pub async fn reschedule(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(appointment_id): Path<Uuid>,
    Json(req): Json<RescheduleRequest>,
) -> Result<Json<ApiOk<AppointmentDetail>>, ApiError> {
    let call = LifecycleCall::Reschedule {
        scheduled_at: req.scheduled_at,
    };
    perform_for(&state, &auth, appointment_id, call).await
}
