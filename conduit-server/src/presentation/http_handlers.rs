use axum::{Json, Router, http::StatusCode, routing::get};
use serde::Serialize;

use super::app_error::ErrorBody;
use super::{AppState, routes};

/// Health probe, the `/api` routes and a JSON 404 for everything else.
pub(crate) fn routes(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .merge(routes::router(state.clone()))
        .fallback(not_found)
        .with_state(state)
}

#[derive(Debug, Serialize)]
struct Healthz {
    status: &'static str,
    version: &'static str,
}

async fn healthz() -> Json<Healthz> {
    Json(Healthz {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn not_found() -> (StatusCode, Json<ErrorBody>) {
    (StatusCode::NOT_FOUND, Json(ErrorBody::message("not found")))
}
