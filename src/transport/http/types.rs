use crate::app::CourseService;
use crate::domain::model::{GrainContent, GrainType, PageType};
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::sync::Arc;
use utoipa::ToSchema;

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<CourseService>,
}

#[derive(Serialize, Debug, ToSchema)]
pub struct ApiResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Object)]
    pub data: Option<JsonValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ApiResponse {
    pub fn ok(data: JsonValue) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
        }
    }
}

#[derive(Deserialize, Debug, ToSchema)]
pub struct CreateCourseRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub cover_image_url: Option<String>,
    /// Defaults to a fresh id when the caller has no user context.
    #[serde(default)]
    pub creator_id: Option<uuid::Uuid>,
}

#[derive(Deserialize, Debug, ToSchema)]
pub struct BuildStructureRequest {
    pub modules_count: u32,
    pub lessons_per_module: u32,
    pub pages_per_lesson: u32,
    /// Page type applied to every generated page. Defaults to `Introduction`.
    #[serde(default)]
    pub page_type: Option<PageType>,
    /// Required when `page_type` is `Custom`: exactly 15 grain types.
    #[serde(default)]
    pub grain_pattern: Option<Vec<GrainType>>,
}

#[derive(Deserialize, Debug, Default, ToSchema)]
pub struct UpdatePageRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub page_type: Option<PageType>,
    #[serde(default)]
    pub grain_pattern: Option<Vec<GrainType>>,
}

/// Grain content in its tagged form: `{"type": "<grainType>", "data": {...}}`.
#[derive(Deserialize, Debug, ToSchema)]
pub struct SaveGrainRequest {
    #[schema(value_type = Object)]
    pub content: GrainContent,
}

pub fn json_422(err: JsonRejection, expected: &str) -> (StatusCode, Json<ApiResponse>) {
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        Json(ApiResponse::failure(format!(
            "Invalid JSON body: {} (expected: {})",
            err, expected
        ))),
    )
}
