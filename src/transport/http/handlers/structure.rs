use crate::domain::model::{pattern_from_slice, PageType};
use crate::domain::structure::{BuildContext, PageTemplate, StructureSpec};
use crate::error::ContentError;
use crate::transport::http::types::{json_422, ApiResponse, AppState, BuildStructureRequest};
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use std::sync::Arc;
use uuid::Uuid;

use super::common::{error_response, respond_result};

fn template_from_request(request: &BuildStructureRequest) -> Result<PageTemplate, ContentError> {
    match (request.page_type.unwrap_or_default(), &request.grain_pattern) {
        (PageType::Custom, Some(types)) => Ok(PageTemplate::Custom(
            pattern_from_slice(types).map_err(ContentError::Validation)?,
        )),
        (PageType::Custom, None) => Err(ContentError::validation(
            "page_type Custom requires a grain_pattern of 15 grain types",
        )),
        (_, Some(_)) => Err(ContentError::validation(
            "grain_pattern is only accepted with page_type Custom",
        )),
        (page_type, None) => Ok(PageTemplate::Predefined(page_type)),
    }
}

#[utoipa::path(
    post,
    path = "/api/courses/{id}/structure",
    params(("id" = Uuid, Path, description = "Course id")),
    request_body = BuildStructureRequest,
    responses(
        (status = 201, description = "Structure built (or resumed to completion)", body = ApiResponse),
        (status = 400, description = "Invalid counts, page type or pattern", body = ApiResponse),
        (status = 404, description = "Course not found", body = ApiResponse),
        (status = 409, description = "Structure already created, or a build is running", body = ApiResponse),
        (status = 422, description = "Unprocessable entity (invalid JSON body)", body = ApiResponse),
        (status = 500, description = "Build stopped on a store failure; retry resumes it", body = ApiResponse)
    )
)]
pub async fn build_structure_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    request: Result<Json<BuildStructureRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match request {
        Ok(v) => v,
        Err(e) => {
            return json_422(
                e,
                "{\"modules_count\": n, \"lessons_per_module\": n, \"pages_per_lesson\": n}",
            )
            .into_response()
        }
    };

    let spec = StructureSpec::new(
        request.modules_count,
        request.lessons_per_module,
        request.pages_per_lesson,
    );
    if let Err(e) = spec.validate_ui_bounds() {
        return error_response(e);
    }
    let template = match template_from_request(&request) {
        Ok(t) => t,
        Err(e) => return error_response(e),
    };

    // The build runs on its own task so a dropped connection does not stop it half way.
    let service = Arc::clone(&state.service);
    let build = tokio::spawn(async move {
        let ctx = BuildContext::new();
        service.build_structure(id, spec, template, &ctx).await
    });
    match build.await {
        Ok(result) => respond_result(StatusCode::CREATED, result),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiResponse::failure(format!("Structure build task failed: {}", e))),
        )
            .into_response(),
    }
}
