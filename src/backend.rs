// src/backend.rs
//
// HTTP client for the hospital backend (FastAPI). The caller's bearer token
// is forwarded verbatim and nothing is cached between requests.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::debug;
use uuid::Uuid;

use crate::appointments::eligibility::AppointmentAction;
use crate::appointments::status::AppointmentStatus;
use crate::auth::token_fingerprint;
use crate::models::{
    Appointment, LoginRequest, Page, Patient, Prescription, TokenResponse, UserProfile,
};

/// Backend failures, classified by what the UI needs to tell the user.
/// Each variant carries the backend's `detail` text when it sent one.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("unauthorized: {}", .0.as_deref().unwrap_or("-"))]
    Unauthorized(Option<String>),

    #[error("forbidden: {}", .0.as_deref().unwrap_or("-"))]
    Forbidden(Option<String>),

    #[error("not found: {}", .0.as_deref().unwrap_or("-"))]
    NotFound(Option<String>),

    #[error("conflict: {}", .0.as_deref().unwrap_or("-"))]
    Conflict(Option<String>),

    #[error("validation failed: {}", .0.as_deref().unwrap_or("-"))]
    Validation(Option<String>),

    #[error("backend returned {status}: {}", .detail.as_deref().unwrap_or("-"))]
    Server { status: u16, detail: Option<String> },

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("unexpected response body: {0}")]
    Decode(String),
}

impl BackendError {
    pub fn detail(&self) -> Option<&str> {
        match self {
            BackendError::Unauthorized(d)
            | BackendError::Forbidden(d)
            | BackendError::NotFound(d)
            | BackendError::Conflict(d)
            | BackendError::Validation(d) => d.as_deref(),
            BackendError::Server { detail, .. } => detail.as_deref(),
            BackendError::Network(_) | BackendError::Decode(_) => None,
        }
    }
}

/// Extract FastAPI's `detail`: either a string, or a list of `{ msg, loc }`.
pub fn detail_from_body(body: &str) -> Option<String> {
    let v: serde_json::Value = serde_json::from_str(body).ok()?;
    match v.get("detail")? {
        serde_json::Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        serde_json::Value::Array(items) => {
            let msgs: Vec<String> = items
                .iter()
                .filter_map(|it| {
                    let msg = it.get("msg")?.as_str()?;
                    let field = it
                        .get("loc")
                        .and_then(|l| l.as_array())
                        .and_then(|l| l.last())
                        .and_then(|f| f.as_str());
                    Some(match field {
                        Some(f) => format!("{f}: {msg}"),
                        None => msg.to_string(),
                    })
                })
                .collect();
            if msgs.is_empty() {
                None
            } else {
                Some(msgs.join("; "))
            }
        }
        _ => None,
    }
}

pub fn classify(status: u16, body: &str) -> BackendError {
    let detail = detail_from_body(body);
    match status {
        401 => BackendError::Unauthorized(detail),
        403 => BackendError::Forbidden(detail),
        404 => BackendError::NotFound(detail),
        409 => BackendError::Conflict(detail),
        400 | 422 => BackendError::Validation(detail),
        _ => BackendError::Server { status, detail },
    }
}

/* ============================================================
   Appointment list query
   ============================================================ */

/// Backend's hard cap on `page_size` for list endpoints.
pub const MAX_BACKEND_PAGE_SIZE: u32 = 500;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppointmentQuery {
    pub page: u32,
    pub page_size: u32,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    pub statuses: Vec<AppointmentStatus>,
    pub search: Option<String>,
    pub doctor_id: Option<Uuid>,
    pub department_id: Option<Uuid>,
}

impl AppointmentQuery {
    /// Query-string pairs; `status` repeats once per selected status.
    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("page", self.page.max(1).to_string()),
            (
                "page_size",
                self.page_size.clamp(1, MAX_BACKEND_PAGE_SIZE).to_string(),
            ),
        ];
        if let Some(d) = self.date_from {
            params.push(("date_from", d.format("%Y-%m-%d").to_string()));
        }
        if let Some(d) = self.date_to {
            params.push(("date_to", d.format("%Y-%m-%d").to_string()));
        }
        for st in &self.statuses {
            params.push(("status", st.as_str().to_string()));
        }
        if let Some(s) = self.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            params.push(("search", s.to_string()));
        }
        if let Some(id) = self.doctor_id {
            params.push(("doctor_id", id.to_string()));
        }
        if let Some(id) = self.department_id {
            params.push(("department_id", id.to_string()));
        }
        params
    }
}

/// Anything that can answer an appointment list query.
#[async_trait]
pub trait AppointmentSource: Send + Sync {
    async fn list_appointments(
        &self,
        token: &str,
        query: &AppointmentQuery,
    ) -> Result<Page<Appointment>, BackendError>;
}

/* ============================================================
   Lifecycle calls
   ============================================================ */

/// One appointment mutation, as forwarded to the backend.
#[derive(Debug, Clone, PartialEq)]
pub enum LifecycleCall {
    CheckIn,
    StartConsultation,
    Complete,
    NoShow,
    Cancel { reason: Option<String> },
    Reschedule { scheduled_at: DateTime<Utc> },
}

impl LifecycleCall {
    fn path_segment(&self) -> &'static str {
        match self {
            LifecycleCall::CheckIn => "check-in",
            LifecycleCall::StartConsultation => "start-consultation",
            LifecycleCall::Complete => "complete",
            LifecycleCall::NoShow => "no-show",
            LifecycleCall::Cancel { .. } => "cancel",
            LifecycleCall::Reschedule { .. } => "reschedule",
        }
    }

    fn body(&self) -> serde_json::Value {
        match self {
            LifecycleCall::Cancel { reason } => json!({ "reason": reason }),
            LifecycleCall::Reschedule { scheduled_at } => json!({ "scheduled_at": scheduled_at }),
            _ => json!({}),
        }
    }

    /// The UI action that has to be on offer before this call is forwarded.
    pub fn action(&self) -> AppointmentAction {
        match self {
            LifecycleCall::CheckIn => AppointmentAction::CheckIn,
            LifecycleCall::StartConsultation => AppointmentAction::StartConsultation,
            LifecycleCall::Complete => AppointmentAction::CloseVisit,
            LifecycleCall::NoShow => AppointmentAction::MarkNoShow,
            LifecycleCall::Cancel { .. } => AppointmentAction::Cancel,
            LifecycleCall::Reschedule { .. } => AppointmentAction::Reschedule,
        }
    }
}

/// Single-appointment reads and mutations behind the action routes.
#[async_trait]
pub trait AppointmentDesk: Send + Sync {
    async fn get_appointment(&self, token: &str, id: Uuid) -> Result<Appointment, BackendError>;

    async fn list_prescriptions(
        &self,
        token: &str,
        appointment_id: Uuid,
    ) -> Result<Vec<Prescription>, BackendError>;

    /// Returns the appointment as the backend left it.
    async fn apply(
        &self,
        token: &str,
        id: Uuid,
        call: &LifecycleCall,
    ) -> Result<Appointment, BackendError>;
}

/* ============================================================
   Client
   ============================================================ */

#[derive(Debug, Clone)]
pub struct BackendClient {
    http: reqwest::Client,
    base_url: String,
}

impl BackendClient {
    pub fn new(base_url: &str, timeout_secs: u64) -> Result<Self, BackendError> {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(timeout_secs.min(10)))
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/v1{}", self.base_url, path)
    }

    async fn handle_response<T: DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, BackendError> {
        let status = response.status();
        let body = response.text().await?;
        if status.is_success() {
            serde_json::from_str(&body).map_err(|e| BackendError::Decode(e.to_string()))
        } else {
            Err(classify(status.as_u16(), &body))
        }
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        token: &str,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, BackendError> {
        debug!(session = %token_fingerprint(token), "GET {path}");
        let response = self
            .http
            .get(self.url(path))
            .bearer_auth(token)
            .query(query)
            .send()
            .await?;
        self.handle_response(response).await
    }

    async fn post_json<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        token: Option<&str>,
        path: &str,
        body: &B,
    ) -> Result<T, BackendError> {
        if let Some(t) = token {
            debug!(session = %token_fingerprint(t), "POST {path}");
        } else {
            debug!("POST {path}");
        }
        let mut req = self.http.post(self.url(path)).json(body);
        if let Some(t) = token {
            req = req.bearer_auth(t);
        }
        let response = req.send().await?;
        self.handle_response(response).await
    }

    // ---------- auth ----------

    pub async fn login(&self, req: &LoginRequest) -> Result<TokenResponse, BackendError> {
        self.post_json(None, "/auth/login", req).await
    }

    pub async fn me(&self, token: &str) -> Result<UserProfile, BackendError> {
        self.get_json(token, "/auth/me", &[]).await
    }

    // ---------- patients ----------

    pub async fn search_patients(
        &self,
        token: &str,
        search: Option<&str>,
        page: u32,
        page_size: u32,
    ) -> Result<Page<Patient>, BackendError> {
        let mut query = vec![
            ("page", page.to_string()),
            ("page_size", page_size.to_string()),
        ];
        if let Some(s) = search {
            query.push(("search", s.to_string()));
        }
        self.get_json(token, "/patients", &query).await
    }

    pub async fn get_patient(&self, token: &str, id: Uuid) -> Result<Patient, BackendError> {
        self.get_json(token, &format!("/patients/{id}"), &[]).await
    }
}

#[async_trait]
impl AppointmentDesk for BackendClient {
    async fn get_appointment(&self, token: &str, id: Uuid) -> Result<Appointment, BackendError> {
        self.get_json(token, &format!("/appointments/{id}"), &[]).await
    }

    async fn list_prescriptions(
        &self,
        token: &str,
        appointment_id: Uuid,
    ) -> Result<Vec<Prescription>, BackendError> {
        let page: Page<Prescription> = self
            .get_json(
                token,
                "/prescriptions",
                &[
                    ("appointment_id", appointment_id.to_string()),
                    ("page_size", MAX_BACKEND_PAGE_SIZE.to_string()),
                ],
            )
            .await?;
        Ok(page.items)
    }

    async fn apply(
        &self,
        token: &str,
        id: Uuid,
        call: &LifecycleCall,
    ) -> Result<Appointment, BackendError> {
        let path = format!("/appointments/{id}/{}", call.path_segment());
        self.post_json(Some(token), &path, &call.body()).await
    }
}

#[async_trait]
impl AppointmentSource for BackendClient {
    async fn list_appointments(
        &self,
        token: &str,
        query: &AppointmentQuery,
    ) -> Result<Page<Appointment>, BackendError> {
        self.get_json(token, "/appointments", &query.to_params()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detail_from_string_body() {
        let body = r#"{"detail":"Appointment already checked in"}"#;
        assert_eq!(
            detail_from_body(body).as_deref(),
            Some("Appointment already checked in")
        );
    }

    #[test]
    fn test_detail_from_validation_list() {
        let body = r#"{"detail":[{"loc":["body","scheduled_at"],"msg":"field required","type":"missing"},{"msg":"bad"}]}"#;
        assert_eq!(
            detail_from_body(body).as_deref(),
            Some("scheduled_at: field required; bad")
        );
    }

    #[test]
    fn test_detail_missing_or_not_json() {
        assert_eq!(detail_from_body("<html>502</html>"), None);
        assert_eq!(detail_from_body(r#"{"message":"x"}"#), None);
        assert_eq!(detail_from_body(r#"{"detail":"  "}"#), None);
    }

    #[test]
    fn test_classify_status_codes() {
        assert!(matches!(classify(401, ""), BackendError::Unauthorized(None)));
        assert!(matches!(classify(403, ""), BackendError::Forbidden(None)));
        assert!(matches!(classify(404, ""), BackendError::NotFound(None)));
        assert!(matches!(classify(409, ""), BackendError::Conflict(None)));
        assert!(matches!(classify(422, ""), BackendError::Validation(None)));
        assert!(matches!(classify(400, ""), BackendError::Validation(None)));
        match classify(503, r#"{"detail":"maintenance"}"#) {
            BackendError::Server { status, detail } => {
                assert_eq!(status, 503);
                assert_eq!(detail.as_deref(), Some("maintenance"));
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_query_params_repeat_status() {
        let q = AppointmentQuery {
            page: 0,
            page_size: 10_000,
            date_from: NaiveDate::from_ymd_opt(2024, 6, 10),
            date_to: None,
            statuses: vec![AppointmentStatus::CheckedIn, AppointmentStatus::InConsultation],
            search: Some("  ".into()),
            doctor_id: None,
            department_id: None,
        };
        let params = q.to_params();
        assert!(params.contains(&("page", "1".to_string())));
        assert!(params.contains(&("page_size", "500".to_string())));
        assert!(params.contains(&("date_from", "2024-06-10".to_string())));
        assert!(!params.iter().any(|(k, _)| *k == "date_to"));
        assert!(!params.iter().any(|(k, _)| *k == "search"));
        let statuses: Vec<&str> = params
            .iter()
            .filter(|(k, _)| *k == "status")
            .map(|(_, v)| v.as_str())
            .collect();
        assert_eq!(statuses, vec!["CHECKED_IN", "IN_CONSULTATION"]);
    }

    #[test]
    fn test_lifecycle_call_paths_and_bodies() {
        assert_eq!(LifecycleCall::Complete.path_segment(), "complete");
        assert_eq!(LifecycleCall::Complete.action(), AppointmentAction::CloseVisit);
        assert_eq!(LifecycleCall::NoShow.body(), json!({}));

        let cancel = LifecycleCall::Cancel {
            reason: Some("patient travelling".into()),
        };
        assert_eq!(cancel.path_segment(), "cancel");
        assert_eq!(cancel.body(), json!({ "reason": "patient travelling" }));

        let at = DateTime::parse_from_rfc3339("2024-06-12T04:30:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let body = LifecycleCall::Reschedule { scheduled_at: at }.body();
        assert_eq!(body, json!({ "scheduled_at": "2024-06-12T04:30:00Z" }));
    }
}
