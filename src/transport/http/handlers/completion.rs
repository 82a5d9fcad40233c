use crate::transport::http::types::{ApiResponse, AppState};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Response;
use uuid::Uuid;

use super::common::respond_result;

#[utoipa::path(
    get,
    path = "/api/courses/{id}/completion",
    params(("id" = Uuid, Path, description = "Course id")),
    responses(
        (status = 200, description = "Completed vs total modules, lessons, pages and grains, plus the grain percentage", body = ApiResponse),
        (status = 404, description = "Course not found", body = ApiResponse)
    )
)]
pub async fn completion_handler(State(state): State<AppState>, Path(id): Path<Uuid>) -> Response {
    respond_result(StatusCode::OK, state.service.completion(id).await)
}

#[utoipa::path(
    get,
    path = "/api/courses/{id}/completion/report",
    params(("id" = Uuid, Path, description = "Course id")),
    responses(
        (status = 200, description = "Per-module, per-lesson and per-page completion", body = ApiResponse),
        (status = 404, description = "Course not found", body = ApiResponse)
    )
)]
pub async fn completion_report_handler(State(state): State<AppState>, Path(id): Path<Uuid>) -> Response {
    respond_result(StatusCode::OK, state.service.completion_report(id).await)
}
