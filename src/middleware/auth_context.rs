use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum_extra::TypedHeader;
use axum_extra::extract::cookie::CookieJar;
use headers::{Authorization, authorization::Bearer};

use crate::auth::{clean_bearer, token_fingerprint};
use crate::error::ApiError;
use crate::i18n::{LANG_COOKIE, Lang};
use crate::models::AppState;

/// Per-request caller identity: the browser's bearer token plus its language.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub token: String,
    pub lang: Lang,
}

impl AuthContext {
    pub fn fingerprint(&self) -> String {
        token_fingerprint(&self.token)
    }
}

/// Language of the caller, for routes that do not need a session.
#[derive(Debug, Clone, Copy)]
pub struct RequestLang(pub Lang);

fn lang_from_parts(parts: &Parts, state: &AppState) -> Lang {
    CookieJar::from_headers(&parts.headers)
        .get(LANG_COOKIE)
        .and_then(|c| Lang::from_code(c.value()))
        .unwrap_or(state.config.default_lang)
}

impl FromRequestParts<AppState> for RequestLang {
    type Rejection = ApiError;

    fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> impl std::future::Future<Output = Result<Self, Self::Rejection>> + Send {
        let lang = lang_from_parts(parts, state);
        async move { Ok(RequestLang(lang)) }
    }
}

impl FromRequestParts<AppState> for AuthContext {
    type Rejection = ApiError;

    fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> impl std::future::Future<Output = Result<Self, Self::Rejection>> + Send {
        async move {
            let lang = lang_from_parts(parts, state);

            // Extract Authorization: Bearer <token>
            let TypedHeader(authz): TypedHeader<Authorization<Bearer>> =
                TypedHeader::from_request_parts(parts, state)
                    .await
                    .map_err(|_| ApiError::session_expired(lang))?;

            // The backend validates the token on every call; we only require one.
            let token = clean_bearer(authz.token())
                .ok_or_else(|| ApiError::session_expired(lang))?
                .to_string();

            Ok(AuthContext { token, lang })
        }
    }
}
