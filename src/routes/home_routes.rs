use axum::{Json, Router, extract::State, routing::get};
use serde::Serialize;

use crate::appointments::{
    merge::{SortKey, SortOrder},
    segment::Segment,
    view::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE},
};
use crate::i18n::Lang;
use crate::middleware::auth_context::RequestLang;
use crate::models::{ApiOk, AppState};

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Everything the browser needs to render filters before the first list call.
#[derive(Debug, Serialize)]
pub struct UiConfig {
    pub demo_mode: bool,
    pub date_format: String,
    pub lang: Lang,
    pub languages: Vec<Lang>,
    pub segments: Vec<Segment>,
    pub default_segment: Segment,
    pub sort_keys: Vec<SortKey>,
    pub sort_orders: Vec<SortOrder>,
    pub default_page_size: u32,
    pub max_page_size: u32,
}

/// Mounted at the root, outside `/api/v1`.
pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health))
}

pub fn api_router() -> Router<AppState> {
    Router::new().route("/ui-config", get(ui_config))
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

fn build_ui_config(state: &AppState, lang: Lang) -> UiConfig {
    UiConfig {
        demo_mode: state.config.demo_mode,
        date_format: state.config.date_format.clone(),
        lang,
        languages: Lang::SUPPORTED.to_vec(),
        segments: Segment::ALL_SEGMENTS.to_vec(),
        default_segment: Segment::default(),
        sort_keys: vec![SortKey::ScheduledAt, SortKey::PatientName],
        sort_orders: vec![SortOrder::Asc, SortOrder::Desc],
        default_page_size: DEFAULT_PAGE_SIZE,
        max_page_size: MAX_PAGE_SIZE,
    }
}

pub async fn ui_config(
    State(state): State<AppState>,
    RequestLang(lang): RequestLang,
) -> Json<ApiOk<UiConfig>> {
    Json(ApiOk {
        data: build_ui_config(&state, lang),
    })
}
