mod appointments;
mod auth;
mod backend;
mod config;
mod error;
mod i18n;
mod middleware;
mod models;
mod routes;

use std::sync::Arc;

use crate::{backend::BackendClient, config::Config, models::AppState};

use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use axum::http::header;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let cfg = Config::from_env()?;
    let backend = BackendClient::new(&cfg.backend_api_url, cfg.backend_timeout_secs)?;

    tracing::info!(
        backend = %cfg.backend_api_url,
        demo_mode = cfg.demo_mode,
        default_lang = cfg.default_lang.code(),
        clinic_offset = %cfg.clinic_offset,
        "configuration loaded"
    );

    let bind_addr = cfg.bind_addr.clone();
    let state = AppState {
        backend,
        config: Arc::new(cfg),
    };

    // The browser UI may be served from another origin during development.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            header::ACCEPT,
        ]);

    let app = routes::router(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    tracing::info!("Listening on http://{}", bind_addr);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
