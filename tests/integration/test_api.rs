//! REST boundary tests over the in-process router.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use contrarx::api::{create_rest_router, ApiState, RestApiConfig};
use contrarx::interactions::InteractionEngine;
use contrarx::resolver::DrugResolver;
use contrarx::store::SqliteStore;

use crate::support::{FixtureProvider, FixtureSource};

fn test_router(source: FixtureSource, provider: FixtureProvider) -> Router {
    let store = Arc::new(SqliteStore::open_in_memory().unwrap());
    let resolver = Arc::new(DrugResolver::new(store.clone(), Arc::new(source)));
    let engine = Arc::new(InteractionEngine::new(store.clone(), Arc::new(provider)));
    let state = Arc::new(ApiState::new(resolver, engine, store));
    create_rest_router(state, &RestApiConfig::default())
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn search_resolves_and_reports_cache_state() {
    let router = test_router(FixtureSource::new().with_drug("AspirinX"), FixtureProvider::new());

    let response = router
        .clone()
        .oneshot(
            Request::get("/api/drugs/search?name=aspirinx")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["hitCache"], json!(false));
    assert_eq!(body["data"]["name"], json!("AspirinX"));

    let response = router
        .oneshot(
            Request::get("/api/drugs/search?name=aspirinx")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["hitCache"], json!(true));
}

#[tokio::test]
async fn search_maps_errors_to_status_codes() {
    let router = test_router(FixtureSource::new(), FixtureProvider::new());

    // Empty name -> 400 with a structured error body.
    let response = router
        .clone()
        .oneshot(
            Request::get("/api/drugs/search?name=")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["code"], json!("invalid_request"));

    // Unknown name -> 404.
    let response = router
        .oneshot(
            Request::get("/api/drugs/search?name=nonexistol")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn autocomplete_returns_names_and_empty_prefix_shortcut() {
    let router = test_router(FixtureSource::new().with_drug("AspirinX"), FixtureProvider::new());

    // Populate the store through a search first.
    router
        .clone()
        .oneshot(
            Request::get("/api/drugs/search?name=aspirinx")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let response = router
        .clone()
        .oneshot(
            Request::get("/api/drugs/autocomplete?prefix=asp")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(body_json(response).await, json!(["AspirinX"]));

    let response = router
        .oneshot(
            Request::get("/api/drugs/autocomplete?prefix=")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(body_json(response).await, json!([]));
}

#[tokio::test]
async fn analyze_returns_pairs_and_validates_input() {
    let router = test_router(
        FixtureSource::new().with_drug("AspirinX").with_drug("WarfarinY"),
        FixtureProvider::new().with_response(
            "AspirinX",
            "WarfarinY",
            r#"{"summary": "Bleeding risk", "rating": "Warning", "details": "Monitor"}"#,
        ),
    );

    let mut ids = Vec::new();
    for name in ["aspirinx", "warfariny"] {
        let response = router
            .clone()
            .oneshot(
                Request::get(format!("/api/drugs/search?name={name}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let body = body_json(response).await;
        ids.push(body["data"]["id"].as_str().unwrap().to_string());
    }

    let response = router
        .clone()
        .oneshot(
            Request::post("/api/interactions/analyze")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    json!({ "drugIds": ids }).to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["pairs"][0]["drug1_name"], json!("AspirinX"));
    assert_eq!(body["pairs"][0]["risk_rating"], json!("Warning"));

    // A single id fails validation before any external access.
    let response = router
        .oneshot(
            Request::post("/api/interactions/analyze")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json!({ "drugIds": [ids[0]] }).to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn health_and_stats_endpoints_respond() {
    let router = test_router(FixtureSource::new(), FixtureProvider::new());

    let response = router
        .clone()
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = router
        .oneshot(Request::get("/api/stats").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["drug_count"], json!(0));
}
