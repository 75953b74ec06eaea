// src/routes/patient_routes.rs

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::get,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    appointments::view::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE},
    error::ApiError,
    middleware::auth_context::AuthContext,
    models::{ApiOk, AppState, Page, Patient},
};

/// Shorter terms match too much of the register to be useful.
pub const MIN_SEARCH_CHARS: usize = 2;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/patients", get(search_patients))
        .route("/patients/{patient_id}", get(get_patient))
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchPatientsQuery {
    pub search: Option<String>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

#[derive(Debug, PartialEq, Eq)]
pub struct PatientSearch {
    pub search: Option<String>,
    pub page: u32,
    pub page_size: u32,
}

fn validate_search(q: SearchPatientsQuery) -> Result<PatientSearch, ApiError> {
    let search = q
        .search
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());

    if search
        .as_ref()
        .is_some_and(|s| s.chars().count() < MIN_SEARCH_CHARS)
    {
        return Err(ApiError::validation(format!(
            "search must be at least {MIN_SEARCH_CHARS} characters"
        )));
    }

    let page = q.page.unwrap_or(1);
    if page == 0 {
        return Err(ApiError::validation("page must be >= 1"));
    }

    let page_size = q.page_size.unwrap_or(DEFAULT_PAGE_SIZE);
    if !(1..=MAX_PAGE_SIZE).contains(&page_size) {
        return Err(ApiError::validation(format!(
            "page_size must be between 1 and {MAX_PAGE_SIZE}"
        )));
    }

    Ok(PatientSearch {
        search,
        page,
        page_size,
    })
}

pub async fn search_patients(
    State(state): State<AppState>,
    auth: AuthContext,
    Query(q): Query<SearchPatientsQuery>,
) -> Result<Json<ApiOk<Page<Patient>>>, ApiError> {
    let s = validate_search(q)?;

    let page = state
        .backend
        .search_patients(&auth.token, s.search.as_deref(), s.page, s.page_size)
        .await
        .map_err(|e| ApiError::from_backend(e, auth.lang))?;

    Ok(Json(ApiOk { data: page }))
}

pub async fn get_patient(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(patient_id): Path<Uuid>,
) -> Result<Json<ApiOk<Patient>>, ApiError> {
    let patient = state
        .backend
        .get_patient(&auth.token, patient_id)
        .await
        .map_err(|e| ApiError::from_backend(e, auth.lang))?;

    Ok(Json(ApiOk { data: patient }))
}
