// src/bin/api_server.rs

use course_tree_engine::infra::config::{self, StoreBackend};
use course_tree_engine::transport;
use course_tree_engine::{ContentStore, CourseService, MemoryContentStore, PostgresContentStore};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    config::load_dotenv();

    // --- Pattern Catalog ---
    println!("> Loading pattern catalog...");
    let catalog = Arc::new(config::pattern_catalog()?);
    match config::pattern_catalog_path() {
        Some(path) => println!("> Pattern catalog v{} loaded from {}", catalog.version, path.display()),
        None => println!("> Using built-in pattern catalog v{}", catalog.version),
    }

    // --- Content Store ---
    let backend = config::store_backend()?;
    println!("> Initializing content store (backend: {})...", backend.as_str());
    let store: Arc<dyn ContentStore> = match backend {
        StoreBackend::Postgres => {
            let url = config::database_url()?;
            let store = PostgresContentStore::connect(&url, config::db_max_connections()?).await?;
            store.ensure_schema().await?;
            println!("> Postgres schema ready.");
            Arc::new(store)
        }
        StoreBackend::Memory => {
            println!("> Warning: in-memory store, content is lost on shutdown.");
            Arc::new(MemoryContentStore::new())
        }
    };

    // --- Service Initialization ---
    let concurrency = config::build_concurrency()?;
    let service = Arc::new(CourseService::new(store, catalog, concurrency));
    println!("> CourseService initialized (build concurrency {}).", concurrency);

    // --- API Server Initialization ---
    println!("> Starting API server...");
    let app_state = transport::http::AppState { service };
    let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);
    let app = transport::http::create_router(app_state)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", transport::http::ApiDoc::openapi()))
        .layer(cors);
    let bind_addr = config::bind_addr();
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    println!("> API server listening on http://{}", bind_addr);
    println!("> Swagger UI available at http://{}/swagger-ui", bind_addr);

    tokio::select! {
        result = axum::serve(listener, app) => {
            result?;
        }
        _ = tokio::signal::ctrl_c() => {
            println!("\n> Shutdown signal received (Ctrl+C).");
            println!("> Interrupted structure builds resume on the next request for the same course.");
        }
    }

    Ok(())
}
