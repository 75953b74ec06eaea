// src/routes/auth_routes.rs

use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};
use serde::Serialize;

use crate::{
    auth::token_fingerprint,
    backend::BackendError,
    error::ApiError,
    i18n::{Msg, text},
    middleware::auth_context::{AuthContext, RequestLang},
    models::{ApiOk, AppState, LoginRequest, UserProfile},
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/login", post(login))
        .route("/me", get(me))
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: String,
    pub user: UserProfile,
}

fn validate_login(req: &LoginRequest) -> Result<LoginRequest, ApiError> {
    let username = req.username.trim();
    if username.is_empty() || req.password.is_empty() {
        return Err(ApiError::validation("username and password are required"));
    }
    Ok(LoginRequest {
        username: username.to_string(),
        password: req.password.clone(),
    })
}

pub async fn login(
    State(state): State<AppState>,
    RequestLang(lang): RequestLang,
    Json(req): Json<LoginRequest>,
) -> Result<Json<ApiOk<LoginResponse>>, ApiError> {
    let req = validate_login(&req)?;

    let token = match state.backend.login(&req).await {
        Ok(t) => t,
        // 401 here means bad credentials, not an expired session.
        Err(BackendError::Unauthorized(detail)) => {
            tracing::info!(username = %req.username, "login rejected");
            return Err(ApiError::Unauthorized(
                "INVALID_CREDENTIALS",
                detail.unwrap_or_else(|| text(lang, Msg::InvalidCredentials).to_string()),
            ));
        }
        Err(e) => return Err(ApiError::from_backend(e, lang)),
    };

    let user = state
        .backend
        .me(&token.access_token)
        .await
        .map_err(|e| ApiError::from_backend(e, lang))?;

    tracing::info!(
        session = %token_fingerprint(&token.access_token),
        user_id = %user.id,
        "login ok"
    );

    Ok(Json(ApiOk {
        data: LoginResponse {
            access_token: token.access_token,
            token_type: token.token_type,
            user,
        },
    }))
}

pub async fn me(
    State(state): State<AppState>,
    auth: AuthContext,
) -> Result<Json<ApiOk<UserProfile>>, ApiError> {
    let user = state
        .backend
        .me(&auth.token)
        .await
        .map_err(|e| ApiError::from_backend(e, auth.lang))?;
    Ok(Json(ApiOk { data: user }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn login_req(username: &str, password: &str) -> LoginRequest {
        LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        }
    }

    #[test]
    fn test_login_requires_both_fields() {
        assert!(validate_login(&login_req("", "secret")).is_err());
        assert!(validate_login(&login_req("   ", "secret")).is_err());
        assert!(validate_login(&login_req("reception", "")).is_err());
    }

    #[test]
    fn test_login_username_is_trimmed_password_is_not() {
        let req = validate_login(&login_req("  reception ", " pw ")).unwrap();
        assert_eq!(req.username, "reception");
        assert_eq!(req.password, " pw ");
    }
}
