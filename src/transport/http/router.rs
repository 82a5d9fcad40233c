use crate::domain::model::{GrainType, PageType};
use crate::transport::http::handlers::{
    completion, courses, grains, health, pages, patterns, structure,
};
use crate::transport::http::types::{
    ApiResponse, AppState, BuildStructureRequest, CreateCourseRequest, SaveGrainRequest,
    UpdatePageRequest,
};
use axum::routing::{get, post, put};
use axum::Router;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        health::healthcheck_handler,
        patterns::list_patterns_handler,
        courses::create_course_handler,
        courses::get_course_handler,
        courses::delete_course_handler,
        structure::build_structure_handler,
        completion::completion_handler,
        completion::completion_report_handler,
        pages::page_slots_handler,
        pages::update_page_handler,
        grains::save_grain_handler
    ),
    components(schemas(
        ApiResponse,
        CreateCourseRequest,
        BuildStructureRequest,
        UpdatePageRequest,
        SaveGrainRequest,
        GrainType,
        PageType
    ))
)]
#[allow(dead_code)]
pub struct ApiDoc;

pub fn create_router(app_state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::healthcheck_handler))
        .route("/api/patterns", get(patterns::list_patterns_handler))
        .route("/api/courses", post(courses::create_course_handler))
        .route(
            "/api/courses/:id",
            get(courses::get_course_handler).delete(courses::delete_course_handler),
        )
        .route("/api/courses/:id/structure", post(structure::build_structure_handler))
        .route("/api/courses/:id/completion", get(completion::completion_handler))
        .route(
            "/api/courses/:id/completion/report",
            get(completion::completion_report_handler),
        )
        .route("/api/pages/:id/slots", get(pages::page_slots_handler))
        .route("/api/pages/:id", put(pages::update_page_handler))
        .route("/api/grains/:id", put(grains::save_grain_handler))
        .with_state(app_state)
}
