//! HTTP surface tests driven through the router with `oneshot`

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use iris_classifier::classifier::{ForestParams, IrisClassifier};
use iris_classifier::config::Config;
use iris_classifier::dataset::IrisDataset;
use iris_classifier::{create_router, AppState, ModelSlot};

fn trained_model() -> IrisClassifier {
    let data = IrisDataset::embedded();
    let mut model = IrisClassifier::new(ForestParams {
        n_estimators: 15,
        ..ForestParams::default()
    });
    model.train(&data.features(), &data.labels()).unwrap();
    model
}

fn app_with(slot: ModelSlot) -> Router {
    create_router(AppState::new(slot, Config::default()))
}

fn app() -> Router {
    app_with(ModelSlot::with_model(trained_model()))
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn setosa() -> Value {
    json!({"sepal_length": 5.1, "sepal_width": 3.5, "petal_length": 1.4, "petal_width": 0.2})
}

fn virginica() -> Value {
    json!({"sepal_length": 6.7, "sepal_width": 3.0, "petal_length": 5.2, "petal_width": 2.3})
}

#[tokio::test]
async fn test_root_lists_metadata() {
    let (status, body) = send(app(), get("/")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["version"], "0.1.0");
    assert_eq!(body["health"], "/health");
    assert_eq!(body["docs"], "/docs");
}

#[tokio::test]
async fn test_docs_lists_routes() {
    let (status, body) = send(app(), get("/docs")).await;

    assert_eq!(status, StatusCode::OK);
    let paths: Vec<&str> = body["routes"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["path"].as_str().unwrap())
        .collect();
    assert!(paths.contains(&"/predict/batch"));
}

#[tokio::test]
async fn test_health_reports_loaded_model() {
    let (status, body) = send(app(), get("/health")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["model_loaded"], true);
    assert!(body["timestamp"].is_i64());
}

#[tokio::test]
async fn test_health_without_model() {
    let (status, body) = send(app_with(ModelSlot::empty()), get("/health")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "unhealthy");
    assert_eq!(body["model_loaded"], false);
}

#[tokio::test]
async fn test_predict_without_model_is_unavailable() {
    let (status, body) = send(app_with(ModelSlot::empty()), post_json("/predict", setosa())).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(body["error"].as_str().unwrap().contains("Model not loaded"));
    assert_eq!(body["status"], 503);

    let (status, _) = send(
        app_with(ModelSlot::empty()),
        post_json("/predict/batch", json!([setosa()])),
    )
    .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_predict_setosa() {
    let (status, body) = send(app(), post_json("/predict", setosa())).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["prediction"], "setosa");
    assert_eq!(body["prediction_index"], 0);
    assert!(body["confidence"].as_f64().unwrap() > 0.5);

    let probabilities = body["probabilities"].as_object().unwrap();
    assert_eq!(probabilities.len(), 3);
    let total: f64 = probabilities.values().map(|p| p.as_f64().unwrap()).sum();
    assert!((total - 1.0).abs() < 1e-9);
    assert_eq!(body["confidence"], body["probabilities"]["setosa"]);
}

#[tokio::test]
async fn test_batch_keeps_input_order() {
    let (status, body) = send(app(), post_json("/predict/batch", json!([setosa(), virginica()]))).await;

    assert_eq!(status, StatusCode::OK);
    let results = body.as_array().unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0]["prediction"], "setosa");
    assert_eq!(results[1]["prediction"], "virginica");
}

#[tokio::test]
async fn test_batch_matches_single_predictions() {
    let (_, single) = send(app(), post_json("/predict", virginica())).await;
    let (_, batch) = send(app(), post_json("/predict/batch", json!([setosa(), virginica()]))).await;

    assert_eq!(batch[1], single);
}

#[tokio::test]
async fn test_empty_batch() {
    let (status, body) = send(app(), post_json("/predict/batch", json!([]))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn test_missing_field_is_rejected() {
    let body = json!({"sepal_length": 5.1, "sepal_width": 3.5, "petal_length": 1.4});
    let (status, body) = send(app(), post_json("/predict", body)).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["status"], 422);
}

#[tokio::test]
async fn test_negative_value_is_rejected() {
    let body = json!({"sepal_length": -1.0, "sepal_width": 3.5, "petal_length": 1.4, "petal_width": 0.2});
    let (status, body) = send(app(), post_json("/predict", body)).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["details"][0]["field"], "sepal_length");
}

#[tokio::test]
async fn test_wrong_type_is_rejected() {
    let body = json!({"sepal_length": "long", "sepal_width": 3.5, "petal_length": 1.4, "petal_width": 0.2});
    let (status, _) = send(app(), post_json("/predict", body)).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_invalid_batch_item_names_its_index() {
    let bad = json!({"sepal_length": 5.0, "sepal_width": 3.0, "petal_length": 1.0, "petal_width": -0.1});
    let (status, body) = send(app(), post_json("/predict/batch", json!([setosa(), bad]))).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["details"][0]["field"], "[1].petal_width");
}

#[tokio::test]
async fn test_validation_precedes_model_check() {
    let body = json!({"sepal_length": -1.0, "sepal_width": 3.5, "petal_length": 1.4, "petal_width": 0.2});
    let (status, _) = send(app_with(ModelSlot::empty()), post_json("/predict", body)).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_zero_values_are_accepted() {
    let body = json!({"sepal_length": 0.0, "sepal_width": 0.0, "petal_length": 0.0, "petal_width": 0.0});
    let (status, body) = send(app(), post_json("/predict", body)).await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["prediction"].is_string());
}

#[tokio::test]
async fn test_malformed_json_is_rejected() {
    let request = Request::builder()
        .method("POST")
        .uri("/predict")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"sepal_length\": 5.1,"))
        .unwrap();
    let (status, body) = send(app(), request).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["status"], 422);
}
