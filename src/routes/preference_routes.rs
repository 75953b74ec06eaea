// src/routes/preference_routes.rs

use axum::{Json, Router, routing::post};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};

use crate::{
    error::ApiError,
    i18n::{LANG_COOKIE, Lang},
    models::{ApiOk, AppState},
};

pub fn router() -> Router<AppState> {
    Router::new().route("/preferences/language", post(set_language))
}

#[derive(Debug, Deserialize)]
pub struct LanguageRequest {
    pub lang: String,
}

#[derive(Debug, Serialize)]
pub struct LanguageResponse {
    pub lang: Lang,
}

fn lang_cookie(lang: Lang) -> Cookie<'static> {
    // Readable by the page script so the UI can pick its strings before login.
    Cookie::build((LANG_COOKIE, lang.code()))
        .path("/")
        .same_site(SameSite::Lax)
        .permanent()
        .build()
}

pub async fn set_language(
    jar: CookieJar,
    Json(req): Json<LanguageRequest>,
) -> Result<(CookieJar, Json<ApiOk<LanguageResponse>>), ApiError> {
    let lang = Lang::from_code(&req.lang)
        .ok_or_else(|| ApiError::validation(format!("unsupported language: {}", req.lang)))?;

    Ok((
        jar.add(lang_cookie(lang)),
        Json(ApiOk {
            data: LanguageResponse { lang },
        }),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lang_cookie_shape() {
        let c = lang_cookie(Lang::Hi);
        assert_eq!(c.name(), LANG_COOKIE);
        assert_eq!(c.value(), "hi");
        assert_eq!(c.path(), Some("/"));
        assert_eq!(c.same_site(), Some(SameSite::Lax));
        assert!(c.max_age().is_some());
    }

    #[tokio::test]
    async fn test_set_language_rejects_unknown_code() {
        let res = set_language(
            CookieJar::new(),
            Json(LanguageRequest { lang: "fr".into() }),
        )
        .await;
        assert!(matches!(res, Err(ApiError::BadRequest("VALIDATION_ERROR", _))));
    }

    #[tokio::test]
    async fn test_set_language_writes_cookie() {
        let (jar, Json(body)) = set_language(
            CookieJar::new(),
            Json(LanguageRequest { lang: "hi-IN".into() }),
        )
        .await
        .unwrap();
        assert_eq!(body.data.lang, Lang::Hi);
        assert_eq!(jar.get(LANG_COOKIE).map(|c| c.value()), Some("hi"));
    }
}
