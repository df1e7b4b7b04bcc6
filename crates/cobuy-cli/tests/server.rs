use std::io::Write;
use std::sync::Arc;

use actix_web::{test, web, App};
use serde_json::{json, Value};

use cobuy_cli::server::{configure, AppState};
use cobuy_engine::config::EngineConfig;
use cobuy_engine::history::{HistoryStore, MemoryHistory};
use cobuy_engine::RecommendationEngine;

fn dataset() -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
    writeln!(file, "input,target").unwrap();
    for _ in 0..5 {
        writeln!(file, "\"[1, 2]\",\"[3]\"").unwrap();
        writeln!(file, "\"[3, 4]\",\"[1]\"").unwrap();
    }
    file
}

fn state(file: &tempfile::NamedTempFile, history: Option<Arc<MemoryHistory>>) -> AppState {
    let engine = RecommendationEngine::new(EngineConfig::default().with_dataset(file.path()));
    AppState::new(
        Arc::new(engine),
        history.map(|h| h as Arc<dyn HistoryStore>),
    )
}

#[actix_web::test]
async fn test_recommendation_round_trip() {
    let file = dataset();
    let history = Arc::new(MemoryHistory::new());
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(state(&file, Some(Arc::clone(&history)))))
            .configure(configure),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/recommendations/")
        .set_json(json!({"input": [1, 2]}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body, json!({"input": [1, 2], "suggested": [3]}));
    assert_eq!(history.len(), 1);
}

#[actix_web::test]
async fn test_wrong_arity_is_bad_request() {
    let file = dataset();
    let engine_state = state(&file, None);
    let engine = Arc::clone(&engine_state.engine);
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(engine_state))
            .configure(configure),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/recommendations")
        .set_json(json!({"input": [1]}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);
    let body: Value = test::read_body_json(resp).await;
    assert!(body["error"].as_str().unwrap().contains("Exactly 2 products"));
    assert!(!engine.is_trained());
}

#[actix_web::test]
async fn test_malformed_body_is_bad_request() {
    let file = dataset();
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(state(&file, None)))
            .configure(configure),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/recommendations/")
        .set_json(json!({"input": ["a", "b"]}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);
    let body: Value = test::read_body_json(resp).await;
    assert!(body["error"].is_string());
}

#[actix_web::test]
async fn test_train_and_products() {
    let file = dataset();
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(state(&file, None)))
            .configure(configure),
    )
    .await;

    let req = test::TestRequest::get().uri("/api/train/").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
    let body: Value = test::read_body_json(resp).await;
    assert!(body["message"].as_str().unwrap().starts_with("Model trained successfully"));
    assert_eq!(body["products"], json!([1, 2, 3, 4]));

    let req = test::TestRequest::get().uri("/api/products").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body, json!({"products": [1, 2, 3, 4]}));
}

#[actix_web::test]
async fn test_missing_dataset_is_server_error() {
    let engine =
        RecommendationEngine::new(EngineConfig::default().with_dataset("/no/such/data.csv"));
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(AppState::new(Arc::new(engine), None)))
            .configure(configure),
    )
    .await;

    let req = test::TestRequest::get().uri("/api/train/").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 500);
    let body: Value = test::read_body_json(resp).await;
    assert!(body["error"].as_str().unwrap().starts_with("Error training model"));
}
