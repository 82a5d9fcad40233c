use crate::app::PageUpdate;
use crate::transport::http::types::{json_422, ApiResponse, AppState, UpdatePageRequest};
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use uuid::Uuid;

use super::common::respond_result;

#[utoipa::path(
    get,
    path = "/api/pages/{id}/slots",
    params(("id" = Uuid, Path, description = "Page id")),
    responses(
        (status = 200, description = "Slot rule of each of the 15 positions (locked to a grain type, or free)", body = ApiResponse),
        (status = 404, description = "Page not found", body = ApiResponse)
    )
)]
pub async fn page_slots_handler(State(state): State<AppState>, Path(id): Path<Uuid>) -> Response {
    respond_result(StatusCode::OK, state.service.slot_rules(id).await)
}

#[utoipa::path(
    put,
    path = "/api/pages/{id}",
    params(("id" = Uuid, Path, description = "Page id")),
    request_body = UpdatePageRequest,
    responses(
        (status = 200, description = "Page updated", body = ApiResponse),
        (status = 400, description = "Invalid title, page type or pattern", body = ApiResponse),
        (status = 404, description = "Page not found", body = ApiResponse),
        (status = 409, description = "An existing grain breaks the new slot rules", body = ApiResponse),
        (status = 422, description = "Unprocessable entity (invalid JSON body)", body = ApiResponse)
    )
)]
pub async fn update_page_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    request: Result<Json<UpdatePageRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match request {
        Ok(v) => v,
        Err(e) => {
            return json_422(e, "{\"title\"?: \"...\", \"page_type\"?: \"...\", \"grain_pattern\"?: [...]}")
                .into_response()
        }
    };
    let update = PageUpdate {
        title: request.title,
        page_type: request.page_type,
        grain_pattern: request.grain_pattern,
    };
    respond_result(StatusCode::OK, state.service.update_page(id, update).await)
}
