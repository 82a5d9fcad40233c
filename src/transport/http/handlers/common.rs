use crate::error::ContentError;
use crate::transport::http::types::ApiResponse;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

/// Maps a domain error onto a status code and a failure envelope.
pub fn error_response(err: ContentError) -> Response {
    let (status, data) = match &err {
        ContentError::Validation(_) => (StatusCode::BAD_REQUEST, None),
        ContentError::NotFound { entity, id } => (
            StatusCode::NOT_FOUND,
            Some(serde_json::json!({ "code": "NOT_FOUND", "entity": entity, "id": id })),
        ),
        ContentError::RestrictedGrainType {
            page_type,
            position,
            expected,
            attempted,
        } => (
            StatusCode::CONFLICT,
            Some(serde_json::json!({
                "code": "RESTRICTED_GRAIN_TYPE",
                "page_type": page_type,
                "position": position,
                "expected": expected,
                "attempted": attempted
            })),
        ),
        ContentError::StructureAlreadyCreated(_) => (
            StatusCode::CONFLICT,
            Some(serde_json::json!({ "code": "STRUCTURE_ALREADY_CREATED" })),
        ),
        ContentError::BuildInProgress(_) => (
            StatusCode::CONFLICT,
            Some(serde_json::json!({ "code": "BUILD_IN_PROGRESS" })),
        ),
        ContentError::Cancelled => (StatusCode::SERVICE_UNAVAILABLE, None),
        ContentError::Persistence(_) => (StatusCode::INTERNAL_SERVER_ERROR, None),
    };
    if status.is_server_error() {
        eprintln!("> HTTP: request failed: {}", err);
    }
    (
        status,
        Json(ApiResponse {
            success: false,
            data,
            error: Some(err.to_string()),
        }),
    )
        .into_response()
}

/// Wraps a serializable value in a success envelope.
pub fn respond<T: Serialize>(status: StatusCode, value: &T) -> Response {
    match serde_json::to_value(value) {
        Ok(data) => (status, Json(ApiResponse::ok(data))).into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiResponse::failure(format!("Failed to encode response: {}", e))),
        )
            .into_response(),
    }
}

pub fn respond_result<T: Serialize>(status: StatusCode, result: Result<T, ContentError>) -> Response {
    match result {
        Ok(value) => respond(status, &value),
        Err(e) => error_response(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{GrainType, PageType};

    #[test]
    fn restricted_grain_type_is_a_conflict() {
        let response = error_response(ContentError::RestrictedGrainType {
            page_type: PageType::Introduction,
            position: 8,
            expected: GrainType::PairsOfText,
            attempted: GrainType::TestQuestion,
        });
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn status_mapping() {
        assert_eq!(
            error_response(ContentError::validation("bad")).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            error_response(ContentError::not_found("course", uuid::Uuid::nil())).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            error_response(ContentError::Cancelled).status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            error_response(ContentError::Persistence(anyhow::anyhow!("db down"))).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
