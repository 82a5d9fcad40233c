use crate::transport::http::types::{ApiResponse, AppState};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Response;

use super::common::respond;

#[utoipa::path(
    get,
    path = "/api/patterns",
    responses(
        (status = 200, description = "Pattern catalog: version and the 15-slot pattern of each predefined page type", body = ApiResponse)
    )
)]
pub async fn list_patterns_handler(State(state): State<AppState>) -> Response {
    respond(StatusCode::OK, state.service.catalog())
}
