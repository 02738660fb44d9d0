use std::path::PathBuf;
use std::time::Duration;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;
use tripwise_api::{build_app_with_catalog, ApiConfig};
use tripwise_catalog::{Catalog, MemoryCatalog};

fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("fixtures")
}

fn fixture_catalog() -> MemoryCatalog {
    MemoryCatalog::from_fixture_dir(fixtures_dir()).expect("fixtures should load")
}

fn app(catalog: MemoryCatalog) -> Router {
    build_app_with_catalog(Catalog::memory(catalog), &ApiConfig::default())
}

fn plan_request(body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/plan-trip")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&body).unwrap()
}

fn ids(suggestion: &Value) -> Vec<i64> {
    suggestion["suggested_items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|item| item["id"].as_i64().unwrap())
        .collect()
}

#[tokio::test]
async fn health_reports_catalog_and_metrics() {
    let response = app(fixture_catalog()).oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));

    let parsed = json_body(response).await;
    assert_eq!(parsed["status"], "ok");
    assert_eq!(parsed["catalog"], "memory");
    assert_eq!(parsed["metrics"]["plans_total"], 0);
}

#[tokio::test]
async fn plan_trip_returns_suggestions_per_category() {
    let response = app(fixture_catalog())
        .oneshot(plan_request(json!({
            "total_budget": 9000,
            "people_count": 3,
            "days": 3,
            "destination": "Jeddah"
        })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["x-budget-submission"], "skipped");

    let plan = json_body(response).await;
    assert_eq!(plan["per_person_total"], 3000.0);
    assert_eq!(plan["per_person_per_day"], 1000.0);
    assert!((plan["budgets_per_day"]["hotels"].as_f64().unwrap() - 400.0).abs() < 1e-9);

    assert_eq!(ids(&plan["hotels"]), vec![3, 1]);
    assert_eq!(plan["hotels"]["within_budget"], true);
    assert_eq!(plan["food"]["suggested_items"][0]["price"], 30.0);
    assert_eq!(ids(&plan["activities"]), vec![8]);

    assert_eq!(ids(&plan["transport"]), vec![12]);
    assert_eq!(plan["transport"]["within_budget"], false);
    assert!(plan["transport"]["message"].as_str().unwrap().contains("transport/flights"));
}

#[tokio::test]
async fn plan_trip_submits_budget_when_identifiers_present() {
    let catalog = fixture_catalog();
    let response = app(catalog.clone())
        .oneshot(plan_request(json!({
            "total_budget": 9000,
            "people_count": 3,
            "days": 3,
            "destination": "jeddah",
            "from_city_id": 3,
            "user_id": 21
        })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["x-budget-submission"], "sent");

    let submissions = catalog.submissions();
    assert_eq!(submissions.len(), 1);
    assert_eq!(submissions[0].to_city_id, 4);
    assert_eq!(submissions[0].from_city_id, 3);
}

#[tokio::test]
async fn failed_submission_still_returns_plan() {
    let catalog = fixture_catalog().with_failure("budgets", 500);
    let response = app(catalog)
        .oneshot(plan_request(json!({
            "total_budget": 9000,
            "people_count": 3,
            "days": 3,
            "destination": "Jeddah",
            "from_city_id": 3,
            "user_id": 21
        })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["x-budget-submission"], "failed");
    let plan = json_body(response).await;
    assert_eq!(ids(&plan["hotels"]), vec![3, 1]);
}

#[tokio::test]
async fn invalid_percentages_are_rejected() {
    let response = app(fixture_catalog())
        .oneshot(plan_request(json!({
            "total_budget": 1000,
            "people_count": 1,
            "days": 1,
            "destination": "Jeddah",
            "percentages": { "hotels": 0.5, "food": 0.5, "activities": 0.5, "transport": 0.5 }
        })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["error"], "invalid_configuration");
}

#[tokio::test]
async fn negative_percentage_is_rejected() {
    let response = app(fixture_catalog())
        .oneshot(plan_request(json!({
            "total_budget": 1000,
            "people_count": 1,
            "days": 1,
            "destination": "Jeddah",
            "percentages": { "hotels": 1.5, "food": -0.5, "activities": 0.0, "transport": 0.0 }
        })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["error"], "invalid_configuration");
}

#[tokio::test]
async fn unknown_city_id_is_rejected() {
    let response = app(fixture_catalog())
        .oneshot(plan_request(json!({
            "total_budget": 1000,
            "people_count": 1,
            "days": 1,
            "destination": "Jeddah",
            "city_id": 404
        })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["error"], "unknown_city");
}

#[tokio::test]
async fn provider_failure_maps_to_bad_gateway() {
    let response = app(fixture_catalog().with_failure("hotels", 503))
        .oneshot(plan_request(json!({
            "total_budget": 1000,
            "people_count": 1,
            "days": 1,
            "destination": "Jeddah"
        })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert_eq!(json_body(response).await["error"], "provider_error");
}

#[tokio::test]
async fn external_lists_pass_records_through() {
    let app = app(fixture_catalog());

    let response = app.clone().oneshot(get("/external/plains")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let records = json_body(response).await;
    assert_eq!(records[0]["price"], "1,450");

    let response = app.oneshot(get("/external/flights")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn external_preview_truncates_each_list() {
    let response = app(fixture_catalog())
        .oneshot(get("/external-preview?limit=1"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let preview = json_body(response).await;
    assert_eq!(preview["hotels_sample"].as_array().unwrap().len(), 1);
    assert_eq!(preview["activities_sample"].as_array().unwrap().len(), 1);
    assert_eq!(preview["plains_sample"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn rate_limit_returns_too_many_requests() {
    let config = ApiConfig {
        rate_limit_window: Duration::from_secs(60),
        rate_limit_max: 2,
        ..ApiConfig::default()
    };
    let app = build_app_with_catalog(Catalog::memory(fixture_catalog()), &config);

    for _ in 0..2 {
        let response = app.clone().oneshot(get("/external/cities")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = app.clone().oneshot(get("/external/cities")).await.unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(json_body(response).await["error"], "rate_limited");

    let response = app.oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
