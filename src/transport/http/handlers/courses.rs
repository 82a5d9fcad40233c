use crate::domain::model::NewCourse;
use crate::transport::http::types::{json_422, ApiResponse, AppState, CreateCourseRequest};
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use uuid::Uuid;

use super::common::{error_response, respond_result};

#[utoipa::path(
    post,
    path = "/api/courses",
    request_body = CreateCourseRequest,
    responses(
        (status = 201, description = "Course created", body = ApiResponse),
        (status = 400, description = "Empty title", body = ApiResponse),
        (status = 422, description = "Unprocessable entity (invalid JSON body)", body = ApiResponse),
        (status = 500, description = "Internal server error", body = ApiResponse)
    )
)]
pub async fn create_course_handler(
    State(state): State<AppState>,
    request: Result<Json<CreateCourseRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match request {
        Ok(v) => v,
        Err(e) => return json_422(e, "{\"title\": \"...\", \"description\": \"...\"}").into_response(),
    };
    let new = NewCourse {
        title: request.title,
        description: request.description,
        cover_image_url: request.cover_image_url,
        creator_id: request.creator_id.unwrap_or_else(Uuid::new_v4),
    };
    respond_result(StatusCode::CREATED, state.service.create_course(new).await)
}

#[utoipa::path(
    get,
    path = "/api/courses/{id}",
    params(("id" = Uuid, Path, description = "Course id")),
    responses(
        (status = 200, description = "Course", body = ApiResponse),
        (status = 404, description = "Course not found", body = ApiResponse)
    )
)]
pub async fn get_course_handler(State(state): State<AppState>, Path(id): Path<Uuid>) -> Response {
    respond_result(StatusCode::OK, state.service.get_course(id).await)
}

#[utoipa::path(
    delete,
    path = "/api/courses/{id}",
    params(("id" = Uuid, Path, description = "Course id")),
    responses(
        (status = 200, description = "Course and its whole tree deleted", body = ApiResponse),
        (status = 404, description = "Course not found", body = ApiResponse)
    )
)]
pub async fn delete_course_handler(State(state): State<AppState>, Path(id): Path<Uuid>) -> Response {
    match state.service.delete_course(id).await {
        Ok(()) => (
            StatusCode::OK,
            Json(ApiResponse::ok(serde_json::json!({ "deleted": id }))),
        )
            .into_response(),
        Err(e) => error_response(e),
    }
}
