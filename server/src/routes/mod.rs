//! Router assembly.
//!
//! SYSTEM CONTEXT
//! ==============
//! This module binds the JSON API under `/api` and, when a static directory
//! is configured, serves the viewer's assets for every other path.

pub mod auth;
pub mod records;

use axum::Router;
use axum::http::StatusCode;
use axum::routing::{get, post};
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// API routes shared by the viewer and the registration form.
fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/api/registros", get(records::list).post(records::create))
        .route("/api/registros/export.xlsx", get(records::export_xlsx))
        .route("/api/registros/delete-all/token", post(records::delete_all_token))
        .route("/api/registros/delete-all", post(records::delete_all))
        .route("/api/registros/{id}/procedimento", post(records::edit_procedure))
        .route("/api/registros/{id}/delete", post(records::delete_record))
        .route("/api/opcoes", get(records::options))
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/logout", post(auth::logout))
        .route("/api/auth/me", get(auth::me))
        .route("/healthz", get(healthz))
}

/// Full application router.
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let mut router = api_routes();
    if let Some(dir) = &state.config.static_dir {
        tracing::info!(dir = %dir.display(), "serving static files");
        router = router.fallback_service(ServeDir::new(dir).append_index_html_on_directories(true));
    }

    router
        .layer(cors)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}
