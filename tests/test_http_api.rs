//! Drives the HTTP API in-process over an ephemeral port.

mod common;

use common::{authored, setup};
use course_tree_engine::domain::model::GrainType;
use course_tree_engine::transport;
use course_tree_engine::ContentStore;
use serde_json::{json, Value};
use uuid::Uuid;

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_http_api() -> Result<(), Box<dyn std::error::Error>> {
    println!("--- test_http_api ---");
    let (store, service) = setup();
    let router = transport::http::create_router(transport::http::AppState { service });

    // Bind to an ephemeral port to avoid conflicts if an API server is already running.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let port = listener.local_addr()?.port();
    let server_handle = tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    let base_url = format!("http://127.0.0.1:{}", port);
    let client = reqwest::Client::new();

    // --- health + catalog ---
    let resp = client.get(format!("{}/health", base_url)).send().await?;
    assert_eq!(resp.status(), 200);

    let resp = client.get(format!("{}/api/patterns", base_url)).send().await?;
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await?;
    assert_eq!(body["data"]["version"], 1);
    let intro = body["data"]["patterns"]["Introduction"]
        .as_array()
        .ok_or("Introduction pattern missing")?;
    assert_eq!(intro.len(), 15);
    assert_eq!(intro[7], "pairsOfText");

    // --- course + structure ---
    let resp = client
        .post(format!("{}/api/courses", base_url))
        .json(&json!({ "title": "Spanish A1", "description": "first steps" }))
        .send()
        .await?;
    assert_eq!(resp.status(), 201);
    let body: Value = resp.json().await?;
    let course_id: Uuid = body["data"]["id"].as_str().ok_or("course id missing")?.parse()?;
    assert_eq!(body["data"]["structure_created"], false);

    let resp = client
        .post(format!("{}/api/courses/{}/structure", base_url, course_id))
        .json(&json!({ "modules_count": 0, "lessons_per_module": 1, "pages_per_lesson": 1 }))
        .send()
        .await?;
    assert_eq!(resp.status(), 400);

    let resp = client
        .post(format!("{}/api/courses/{}/structure", base_url, course_id))
        .header("content-type", "application/json")
        .body("{ not json")
        .send()
        .await?;
    assert_eq!(resp.status(), 422);

    let resp = client
        .post(format!("{}/api/courses/{}/structure", base_url, course_id))
        .json(&json!({ "modules_count": 1, "lessons_per_module": 1, "pages_per_lesson": 1 }))
        .send()
        .await?;
    assert_eq!(resp.status(), 201);
    let body: Value = resp.json().await?;
    assert_eq!(body["data"]["grains"]["created"], 15);

    let resp = client
        .post(format!("{}/api/courses/{}/structure", base_url, course_id))
        .json(&json!({ "modules_count": 1, "lessons_per_module": 1, "pages_per_lesson": 1 }))
        .send()
        .await?;
    assert_eq!(resp.status(), 409);
    let body: Value = resp.json().await?;
    assert_eq!(body["data"]["code"], "STRUCTURE_ALREADY_CREATED");

    let resp = client
        .get(format!("{}/api/courses/{}", base_url, course_id))
        .send()
        .await?;
    let body: Value = resp.json().await?;
    assert_eq!(body["data"]["structure_created"], true);
    assert_eq!(body["data"]["build_stage"], "complete");

    // --- slots + grain saves ---
    let modules = store.list_modules(course_id).await?;
    let lessons = store.list_lessons(modules[0].id).await?;
    let pages = store.list_pages(lessons[0].id).await?;
    let grains = store.list_grains(pages[0].id).await?;

    let resp = client
        .get(format!("{}/api/pages/{}/slots", base_url, pages[0].id))
        .send()
        .await?;
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await?;
    assert_eq!(body["data"][7], json!({ "state": "locked", "required": "pairsOfText" }));

    let resp = client
        .put(format!("{}/api/grains/{}", base_url, grains[7].id))
        .json(&json!({ "content": authored(GrainType::TestQuestion) }))
        .send()
        .await?;
    assert_eq!(resp.status(), 409);
    let body: Value = resp.json().await?;
    assert_eq!(body["data"]["code"], "RESTRICTED_GRAIN_TYPE");
    assert_eq!(body["data"]["expected"], "pairsOfText");

    let resp = client
        .put(format!("{}/api/grains/{}", base_url, grains[7].id))
        .json(&json!({ "content": { "type": "pairsOfText", "data": { "pairs": [] } } }))
        .send()
        .await?;
    assert_eq!(resp.status(), 400);

    let resp = client
        .put(format!("{}/api/grains/{}", base_url, grains[7].id))
        .json(&json!({ "content": authored(GrainType::PairsOfText) }))
        .send()
        .await?;
    assert_eq!(resp.status(), 200);

    let resp = client
        .get(format!("{}/api/courses/{}/completion", base_url, course_id))
        .send()
        .await?;
    let body: Value = resp.json().await?;
    assert_eq!(body["data"]["grains"], json!({ "current": 1, "total": 15, "percentage": 7 }));
    assert_eq!(body["data"]["pages"], json!({ "current": 0, "total": 1 }));

    let resp = client
        .get(format!("{}/api/courses/{}/completion/report", base_url, course_id))
        .send()
        .await?;
    assert_eq!(resp.status(), 200);

    // --- page edits ---
    let resp = client
        .put(format!("{}/api/pages/{}", base_url, pages[0].id))
        .json(&json!({ "page_type": "text" }))
        .send()
        .await?;
    assert_eq!(resp.status(), 400);

    let resp = client
        .put(format!("{}/api/pages/{}", base_url, pages[0].id))
        .json(&json!({ "title": "Greetings" }))
        .send()
        .await?;
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await?;
    assert_eq!(body["data"]["title"], "Greetings");

    // --- not found + delete ---
    let resp = client
        .get(format!("{}/api/courses/{}", base_url, Uuid::new_v4()))
        .send()
        .await?;
    assert_eq!(resp.status(), 404);

    let resp = client
        .delete(format!("{}/api/courses/{}", base_url, course_id))
        .send()
        .await?;
    assert_eq!(resp.status(), 200);
    assert_eq!(store.counts().await.grains, 0);

    let resp = client
        .get(format!("{}/api/courses/{}/completion", base_url, course_id))
        .send()
        .await?;
    assert_eq!(resp.status(), 404);

    server_handle.abort();
    Ok(())
}
