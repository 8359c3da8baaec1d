use axum::body::Bytes;
use axum::extract::{DefaultBodyLimit, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, info_span, Instrument};

use crate::driver::MapLayout;
use crate::errors::AppError;
use crate::state::AppState;

const MAX_UPLOAD_BYTES: usize = 16 * 1024 * 1024;

#[derive(Debug, Serialize)]
pub struct Healthz { pub status: &'static str }

#[derive(Debug, Default, Deserialize)]
pub struct MapQuery {
    #[serde(default)]
    pub layout: MapLayout,
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/version", get(version))
        .route("/state", get(session_state))
        .route("/grid", get(grid))
        .route("/start", post(start))
        .route("/randomize", post(randomize))
        .route("/map", post(upload_map))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(state)
}

async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, Json(Healthz { status: "ok" }))
}

async fn version() -> impl IntoResponse {
    let svc_version = env!("CARGO_PKG_VERSION");
    let core_version = courier_core::version();
    (StatusCode::OK, Json(json!({"service_version": svc_version, "core_version": core_version})))
}

async fn session_state(State(state): State<AppState>) -> impl IntoResponse {
    let view = state.driver.view();
    (StatusCode::OK, Json((*view).clone()))
}

async fn grid(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let grid = state.driver.grid().await?;
    Ok((StatusCode::OK, Json(grid)))
}

async fn start(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let view = state.driver.start().await?;
    info!(phase = ?view.phase, "start");
    Ok((StatusCode::OK, Json(view)))
}

async fn randomize(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let view = state.driver.randomize().await?;
    info!(frame = ?view.frame, "randomize");
    Ok((StatusCode::OK, Json(view)))
}

async fn upload_map(
    State(state): State<AppState>,
    Query(params): Query<MapQuery>,
    body: Bytes,
) -> Result<impl IntoResponse, AppError> {
    if body.is_empty() {
        return Err(AppError::BadRequest("empty image body".into()));
    }
    let span = info_span!("upload_map", bytes = body.len(), layout = ?params.layout);
    let view = state.driver.load_map(body.to_vec(), params.layout).instrument(span).await?;
    info!(columns = ?view.columns, rows = ?view.rows, "map uploaded");
    Ok((StatusCode::OK, Json(view)))
}
