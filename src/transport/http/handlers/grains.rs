use crate::transport::http::types::{json_422, ApiResponse, AppState, SaveGrainRequest};
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use uuid::Uuid;

use super::common::respond_result;

#[utoipa::path(
    put,
    path = "/api/grains/{id}",
    params(("id" = Uuid, Path, description = "Grain id")),
    request_body = SaveGrainRequest,
    responses(
        (status = 200, description = "Grain content saved", body = ApiResponse),
        (status = 400, description = "Content is not well formed", body = ApiResponse),
        (status = 404, description = "Grain not found", body = ApiResponse),
        (status = 409, description = "Grain type does not match the slot (code RESTRICTED_GRAIN_TYPE)", body = ApiResponse),
        (status = 422, description = "Unprocessable entity (invalid JSON body)", body = ApiResponse)
    )
)]
pub async fn save_grain_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    request: Result<Json<SaveGrainRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match request {
        Ok(v) => v,
        Err(e) => {
            return json_422(e, "{\"content\": {\"type\": \"<grainType>\", \"data\": {...}}}")
                .into_response()
        }
    };
    respond_result(StatusCode::OK, state.service.save_grain(id, request.content).await)
}
