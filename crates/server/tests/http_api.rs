// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use actix_web::{test, web, App};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use zl_config::OracleConfig;
use zl_server::{AppState, OracleProxy};
use zl_store::{InMemoryStore, JsonFileStore, Project, ProjectStore};

const POOL: &str = "0x95E8250c6cc42148d8D067C1AAF6b6d961be338f";

fn offline_oracle() -> OracleProxy {
    // Nothing listens on the discard port, so every candidate path fails fast.
    let config = OracleConfig {
        upstream_url: "http://127.0.0.1:9".to_string(),
        ..OracleConfig::default()
    };
    OracleProxy::new(&config)
}

fn test_state(store: Arc<dyn ProjectStore>) -> web::Data<AppState> {
    web::Data::new(AppState {
        store,
        oracle: offline_oracle(),
    })
}

fn seeded_project() -> Project {
    Project {
        id: "p1".into(),
        title: "Test Sale".into(),
        category: None,
        description: None,
        images: None,
        hard_cap: None,
        min_per: None,
        max_per: None,
        start: None,
        end: None,
        pool_address: POOL.into(),
        creator: "0xCreator".into(),
        created_at: "1700000000000".into(),
        contributions: Vec::new(),
    }
}

#[actix_web::test]
async fn health_reports_ok() {
    let app = test::init_service(
        App::new()
            .app_data(test_state(Arc::new(InMemoryStore::new())))
            .configure(zl_server::configure),
    )
    .await;

    let response = test::call_service(&app, test::TestRequest::get().uri("/health").to_request()).await;
    assert!(response.status().is_success());
    let body: Value = test::read_body_json(response).await;
    assert_eq!(body["status"], "ok");
}

#[actix_web::test]
async fn projects_round_trip_through_the_api() {
    let app = test::init_service(
        App::new()
            .app_data(test_state(Arc::new(InMemoryStore::new())))
            .configure(zl_server::configure),
    )
    .await;

    let create = test::TestRequest::post()
        .uri("/api/projects")
        .set_json(json!({
            "title": "Test Sale",
            "poolAddress": POOL,
            "creator": "0xCreator",
            "hardCap": "10",
        }))
        .to_request();
    let response = test::call_service(&app, create).await;
    assert!(response.status().is_success());
    let body: Value = test::read_body_json(response).await;
    assert_eq!(body["success"], true);
    assert!(body["id"].as_str().is_some_and(|id| !id.is_empty()));

    let response =
        test::call_service(&app, test::TestRequest::get().uri("/api/projects").to_request()).await;
    let projects: Value = test::read_body_json(response).await;
    assert_eq!(projects.as_array().map(Vec::len), Some(1));
    assert_eq!(projects[0]["poolAddress"], POOL);
    assert_eq!(projects[0]["hardCap"], "10");
    // assigned server-side
    assert!(projects[0]["createdAt"].as_str().is_some_and(|at| !at.is_empty()));
}

#[actix_web::test]
async fn project_creation_requires_the_core_fields() {
    let app = test::init_service(
        App::new()
            .app_data(test_state(Arc::new(InMemoryStore::new())))
            .configure(zl_server::configure),
    )
    .await;

    for body in [
        json!({ "poolAddress": POOL, "creator": "0xCreator" }),
        json!({ "title": "Test", "creator": "0xCreator" }),
        json!({ "title": "Test", "poolAddress": POOL }),
        json!({ "title": "", "poolAddress": POOL, "creator": "0xCreator" }),
    ] {
        let request = test::TestRequest::post()
            .uri("/api/projects")
            .set_json(body)
            .to_request();
        let response = test::call_service(&app, request).await;
        assert_eq!(response.status().as_u16(), 400);
    }
}

#[actix_web::test]
async fn contributions_require_a_pool_address() {
    let app = test::init_service(
        App::new()
            .app_data(test_state(Arc::new(InMemoryStore::new())))
            .configure(zl_server::configure),
    )
    .await;

    let response = test::call_service(
        &app,
        test::TestRequest::get().uri("/api/contributions").to_request(),
    )
    .await;
    assert_eq!(response.status().as_u16(), 400);
    let body: Value = test::read_body_json(response).await;
    assert_eq!(body["error"], "Missing poolAddress");
}

#[actix_web::test]
async fn contributions_for_an_unknown_pool_are_a_404() {
    let app = test::init_service(
        App::new()
            .app_data(test_state(Arc::new(InMemoryStore::new())))
            .configure(zl_server::configure),
    )
    .await;

    let response = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/api/contributions?poolAddress=0xdeadbeef")
            .to_request(),
    )
    .await;
    assert_eq!(response.status().as_u16(), 404);

    let request = test::TestRequest::post()
        .uri("/api/contributions")
        .set_json(json!({ "poolAddress": "0xdeadbeef", "user": "0xUser" }))
        .to_request();
    let response = test::call_service(&app, request).await;
    assert_eq!(response.status().as_u16(), 404);
}

#[actix_web::test]
async fn recorded_contributions_come_back_newest_first() {
    let store = Arc::new(InMemoryStore::new());
    store.insert_project(seeded_project()).await.unwrap();
    let app = test::init_service(
        App::new()
            .app_data(test_state(store))
            .configure(zl_server::configure),
    )
    .await;

    for user in ["0xFirst", "0xSecond"] {
        let request = test::TestRequest::post()
            .uri("/api/contributions")
            .set_json(json!({
                "poolAddress": POOL.to_lowercase(),
                "user": user,
                "isPrivate": true,
                "tx": "0xabc",
            }))
            .to_request();
        let response = test::call_service(&app, request).await;
        assert!(response.status().is_success());
        let body: Value = test::read_body_json(response).await;
        assert_eq!(body["success"], true);
        // keep the server-assigned millisecond timestamps distinct
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    let response = test::call_service(
        &app,
        test::TestRequest::get()
            .uri(&format!("/api/contributions?poolAddress={POOL}"))
            .to_request(),
    )
    .await;
    let body: Value = test::read_body_json(response).await;
    let contributions = body["contributions"].as_array().unwrap();
    assert_eq!(contributions.len(), 2);
    assert_eq!(contributions[0]["user"], "0xSecond");
    assert_eq!(contributions[1]["user"], "0xFirst");
    assert_eq!(contributions[0]["isPrivate"], true);
    assert!(contributions[0]["timestamp"].as_u64().unwrap() > 0);
    assert!(contributions[0].get("amountWei").is_none());
}

#[actix_web::test]
async fn oracle_requires_a_request_id() {
    let app = test::init_service(
        App::new()
            .app_data(test_state(Arc::new(InMemoryStore::new())))
            .configure(zl_server::configure),
    )
    .await;

    let response =
        test::call_service(&app, test::TestRequest::get().uri("/api/oracle").to_request()).await;
    assert_eq!(response.status().as_u16(), 400);
    let body: Value = test::read_body_json(response).await;
    assert_eq!(body["error"], "Missing requestId");
}

#[actix_web::test]
async fn unreachable_oracle_reports_every_tried_path() {
    let app = test::init_service(
        App::new()
            .app_data(test_state(Arc::new(InMemoryStore::new())))
            .configure(zl_server::configure),
    )
    .await;

    let response = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/api/oracle?requestId=42")
            .to_request(),
    )
    .await;
    assert_eq!(response.status().as_u16(), 404);
    let body: Value = test::read_body_json(response).await;
    assert_eq!(body["requestId"], "42");
    let tried = body["tried"].as_array().unwrap();
    assert_eq!(tried.len(), 7);
    assert!(tried.iter().all(|path| path.as_str().unwrap().contains("42")));
}

#[actix_web::test]
async fn projects_created_through_the_api_persist_to_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("projects.json");
    let app = test::init_service(
        App::new()
            .app_data(test_state(Arc::new(JsonFileStore::new(path.clone()))))
            .configure(zl_server::configure),
    )
    .await;

    let request = test::TestRequest::post()
        .uri("/api/projects")
        .set_json(json!({
            "title": "Durable Sale",
            "poolAddress": POOL,
            "creator": "0xCreator",
        }))
        .to_request();
    let response = test::call_service(&app, request).await;
    assert!(response.status().is_success());

    let reopened = JsonFileStore::new(path);
    let projects = reopened.list_projects().await.unwrap();
    assert_eq!(projects.len(), 1);
    assert_eq!(projects[0].title, "Durable Sale");
}
