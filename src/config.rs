use std::env;

use anyhow::{Context, bail};
use chrono::FixedOffset;
use chrono::format::{Item, StrftimeItems};

use crate::i18n::Lang;

#[derive(Clone, Debug)]
pub struct Config {
    pub backend_api_url: String,
    pub bind_addr: String,
    pub demo_mode: bool,
    pub date_format: String,
    pub default_lang: Lang,
    pub clinic_offset: FixedOffset,
    pub backend_timeout_secs: u64,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let backend_api_url = env::var("BACKEND_API_URL").context("BACKEND_API_URL is required")?;
        let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:8080".to_string());
        let demo_mode = env::var("DEMO_MODE")
            .ok()
            .map(|s| parse_flag(&s))
            .unwrap_or(false);
        let date_format = env::var("DATE_FORMAT").unwrap_or_else(|_| "%d/%m/%Y".to_string());
        let default_lang = env::var("DEFAULT_LANG")
            .ok()
            .and_then(|s| Lang::from_code(&s))
            .unwrap_or_default();
        let offset_minutes = env::var("CLINIC_UTC_OFFSET_MINUTES")
            .ok()
            .and_then(|s| s.parse::<i32>().ok())
            .unwrap_or(0);
        let backend_timeout_secs = env::var("BACKEND_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(30);

        Self::build(
            backend_api_url,
            bind_addr,
            demo_mode,
            date_format,
            default_lang,
            offset_minutes,
            backend_timeout_secs,
        )
    }

    fn build(
        backend_api_url: String,
        bind_addr: String,
        demo_mode: bool,
        date_format: String,
        default_lang: Lang,
        offset_minutes: i32,
        backend_timeout_secs: u64,
    ) -> anyhow::Result<Self> {
        let backend_api_url = backend_api_url.trim().trim_end_matches('/').to_string();
        let parsed = reqwest::Url::parse(&backend_api_url)
            .with_context(|| format!("invalid BACKEND_API_URL '{backend_api_url}'"))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            bail!(
                "BACKEND_API_URL must use http or https, got: {}",
                parsed.scheme()
            );
        }

        let clinic_offset = FixedOffset::east_opt(offset_minutes * 60)
            .with_context(|| format!("CLINIC_UTC_OFFSET_MINUTES out of range: {offset_minutes}"))?;

        if StrftimeItems::new(&date_format).any(|it| matches!(it, Item::Error)) {
            bail!("DATE_FORMAT is not a valid strftime pattern: {date_format}");
        }

        if backend_timeout_secs == 0 {
            bail!("BACKEND_TIMEOUT_SECS must be > 0");
        }

        Ok(Self {
            backend_api_url,
            bind_addr,
            demo_mode,
            date_format,
            default_lang,
            clinic_offset,
            backend_timeout_secs,
        })
    }
}

fn parse_flag(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
