use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::backend::BackendError;
use crate::i18n::{Lang, Msg, text};

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorObject,
}

#[derive(Debug, Serialize)]
pub struct ErrorObject {
    pub code: String,
    pub message: String,
}

#[derive(Debug)]
pub enum ApiError {
    Unauthorized(&'static str, String),
    Forbidden(&'static str, String),
    BadRequest(&'static str, String),
    NotFound(&'static str, String),
    Conflict(&'static str, String),
    BadGateway(&'static str, String),
}

impl ApiError {
    pub fn session_expired(lang: Lang) -> Self {
        ApiError::Unauthorized("SESSION_EXPIRED", text(lang, Msg::SessionExpired).into())
    }

    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::BadRequest("VALIDATION_ERROR", message.into())
    }

    pub fn action_not_available(lang: Lang, msg: Msg) -> Self {
        ApiError::Conflict("ACTION_NOT_AVAILABLE", text(lang, msg).into())
    }

    /// Surface the backend's `detail` when present, a localized fallback otherwise.
    pub fn from_backend(err: BackendError, lang: Lang) -> Self {
        let detail = err.detail().map(str::to_string);
        let or = |msg: Msg| detail.clone().unwrap_or_else(|| text(lang, msg).to_string());
        match &err {
            BackendError::Unauthorized(_) => {
                ApiError::Unauthorized("SESSION_EXPIRED", or(Msg::SessionExpired))
            }
            BackendError::Forbidden(_) => ApiError::Forbidden("FORBIDDEN", or(Msg::Forbidden)),
            BackendError::NotFound(_) => ApiError::NotFound("NOT_FOUND", or(Msg::NotFound)),
            BackendError::Conflict(_) => ApiError::Conflict("CONFLICT", or(Msg::Conflict)),
            BackendError::Validation(_) => {
                ApiError::BadRequest("VALIDATION_ERROR", or(Msg::Validation))
            }
            BackendError::Server { status, .. } => {
                tracing::error!(status, "backend error: {err}");
                ApiError::BadGateway("BACKEND_ERROR", or(Msg::Unexpected))
            }
            BackendError::Network(e) => {
                tracing::error!("backend unreachable: {e}");
                ApiError::BadGateway(
                    "BACKEND_UNAVAILABLE",
                    text(lang, Msg::BackendUnavailable).into(),
                )
            }
            BackendError::Decode(e) => {
                tracing::error!("backend response decode failed: {e}");
                ApiError::BadGateway("BACKEND_ERROR", text(lang, Msg::Unexpected).into())
            }
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized(..) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(..) => StatusCode::FORBIDDEN,
            ApiError::BadRequest(..) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(..) => StatusCode::NOT_FOUND,
            ApiError::Conflict(..) => StatusCode::CONFLICT,
            ApiError::BadGateway(..) => StatusCode::BAD_GATEWAY,
        }
    }

    fn to_error_response(code: &str, message: &str) -> Json<ErrorResponse> {
        Json(ErrorResponse {
            error: ErrorObject {
                code: code.to_string(),
                message: message.to_string(),
            },
        })
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = match &self {
            ApiError::Unauthorized(code, msg)
            | ApiError::Forbidden(code, msg)
            | ApiError::BadRequest(code, msg)
            | ApiError::NotFound(code, msg)
            | ApiError::Conflict(code, msg)
            | ApiError::BadGateway(code, msg) => ApiError::to_error_response(code, msg),
        };
        (status, body).into_response()
    }
}
