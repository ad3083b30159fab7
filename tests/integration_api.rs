//! API Integration Tests
//!
//! Drive the full application router against the in-memory stores.

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use serde_json::{json, Value};
use tower::util::ServiceExt;

use budget_costing::{api, Stores};

mod common;
use common::send;

fn app() -> axum::Router {
    api::build_app(Stores::in_memory())
}

fn id(value: &Value) -> String {
    value["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_health() {
    let (status, body) = send(&app(), "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert!(body["timestamp"].is_string());
}

#[tokio::test]
async fn test_price_change_propagation_e2e() {
    let app = app();

    // 1. Material "Flour" with a 25 kg dimension at 50
    let (status, flour) = send(&app, "POST", "/api/v1/materials", Some(json!({"name": "Flour"}))).await;
    assert_eq!(status, StatusCode::CREATED, "Material creation failed");
    let flour_id = id(&flour);

    let (status, flour) = send(
        &app,
        "POST",
        &format!("/api/v1/materials/{}/dimensions", flour_id),
        Some(json!({"metric": "kg", "quantity": 25, "price": 50})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "Dimension creation failed");
    let dimension_id = flour["dimensions"][0]["id"].as_str().unwrap().to_string();

    // 2. Budget "Cake"
    let (status, cake) = send(&app, "POST", "/api/v1/budgets", Some(json!({"name": "Cake"}))).await;
    assert_eq!(status, StatusCode::CREATED);
    let cake_id = id(&cake);

    // 3. Add 5 of "25 kg"
    let (status, cake) = send(
        &app,
        "PUT",
        &format!("/api/v1/materials/{}/budgets/{}", flour_id, cake_id),
        Some(json!({"metric": "25 kg", "quantity": 5})),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "Add to budget failed: {}", cake);
    assert_eq!(cake["lines"][0]["price"], "10");
    assert_eq!(cake["total_price"], "30");

    // 4. Reprice the dimension
    let (status, result) = send(
        &app,
        "PUT",
        &format!("/api/v1/dimensions/{}/price", dimension_id),
        Some(json!({"price": "100"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(result["cascade"]["affected"][0], cake_id.as_str());
    assert!(result["cascade"]["failed"].as_array().unwrap().is_empty());

    // 5. Budget picked up the new price
    let (status, cake) = send(&app, "GET", &format!("/api/v1/budgets/{}", cake_id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cake["lines"][0]["price"], "20");
    assert_eq!(cake["total_price"], "60");
}

#[tokio::test]
async fn test_metric_mismatch_is_unprocessable() {
    let app = app();
    let (_, flour) = send(&app, "POST", "/api/v1/materials", Some(json!({"name": "Flour"}))).await;
    let flour_id = id(&flour);
    send(
        &app,
        "POST",
        &format!("/api/v1/materials/{}/dimensions", flour_id),
        Some(json!({"metric": "kg", "quantity": 25, "price": 50})),
    )
    .await;
    let (_, cake) = send(&app, "POST", "/api/v1/budgets", Some(json!({"name": "Cake"}))).await;
    let cake_id = id(&cake);

    let (status, error) = send(
        &app,
        "PUT",
        &format!("/api/v1/materials/{}/budgets/{}", flour_id, cake_id),
        Some(json!({"metric": "10 kg", "quantity": 5})),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(error["error_code"], "metric_mismatch");

    let (_, cake) = send(&app, "GET", &format!("/api/v1/budgets/{}", cake_id), None).await;
    assert!(cake["lines"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_duplicate_material_name_conflicts() {
    let app = app();
    let (status, _) = send(&app, "POST", "/api/v1/materials", Some(json!({"name": "Flour"}))).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, error) = send(&app, "POST", "/api/v1/materials", Some(json!({"name": "FLOUR"}))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(error["error_code"], "conflict");
}

#[tokio::test]
async fn test_blank_name_and_bad_ids_rejected() {
    let app = app();

    let (status, error) = send(&app, "POST", "/api/v1/budgets", Some(json!({"name": "  "}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error["error_code"], "blank_name");

    let (status, _) = send(&app, "GET", "/api/v1/budgets/not-a-uuid", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, error) = send(
        &app,
        "GET",
        &format!("/api/v1/materials/{}", uuid::Uuid::new_v4()),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(error["error_code"], "not_found");
}

#[tokio::test]
async fn test_catalog_attach_and_delete_cascade() {
    let app = app();

    let (status, template) = send(
        &app,
        "POST",
        "/api/v1/dimensions",
        Some(json!({"metric": "kg", "quantity": "2.50"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let template_id = id(&template);

    let (_, sugar) = send(&app, "POST", "/api/v1/materials", Some(json!({"name": "Sugar"}))).await;
    let sugar_id = id(&sugar);

    let (status, sugar) = send(
        &app,
        "PUT",
        &format!("/api/v1/dimensions/{}/materials/{}", template_id, sugar_id),
        Some(json!({"price": 5})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(sugar["dimensions"][0]["id"], template_id.as_str());

    let (_, candy) = send(&app, "POST", "/api/v1/budgets", Some(json!({"name": "Candy"}))).await;
    let candy_id = id(&candy);
    let (status, candy) = send(
        &app,
        "PUT",
        &format!("/api/v1/materials/{}/budgets/{}", sugar_id, candy_id),
        Some(json!({"metric": "2.5 kg", "quantity": 5})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(candy["total_price"], "30");

    let (status, result) = send(&app, "DELETE", &format!("/api/v1/dimensions/{}", template_id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(result["lines_removed"], 1);

    let (_, candy) = send(&app, "GET", &format!("/api/v1/budgets/{}", candy_id), None).await;
    assert!(candy["lines"].as_array().unwrap().is_empty());
    assert_eq!(candy["total_price"], "0");

    let (status, _) = send(&app, "GET", &format!("/api/v1/dimensions/{}", template_id), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_request_id_is_propagated() {
    let request_id = uuid::Uuid::new_v4().to_string();
    let request = Request::builder()
        .method("GET")
        .uri("/api/v1/materials")
        .header("x-request-id", &request_id)
        .body(Body::empty())
        .unwrap();

    let response = app().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["x-request-id"], request_id.as_str());
}

#[tokio::test]
async fn test_out_of_range_measures_return_error_body() {
    let app = app();

    let (status, error) = send(
        &app,
        "POST",
        "/api/v1/dimensions",
        Some(json!({"metric": "kg", "quantity": 0})),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(error["error_code"], "invalid_measure");
    assert!(error["details"].is_string());

    let (_, flour) = send(&app, "POST", "/api/v1/materials", Some(json!({"name": "Flour"}))).await;
    let flour_id = id(&flour);
    let (status, error) = send(
        &app,
        "POST",
        &format!("/api/v1/materials/{}/dimensions", flour_id),
        Some(json!({"metric": "kg", "quantity": 25, "price": "-1"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(error["error_code"], "invalid_measure");

    let (_, flour) = send(&app, "GET", &format!("/api/v1/materials/{}", flour_id), None).await;
    assert!(flour["dimensions"].as_array().unwrap().is_empty());

    let (status, error) = send(
        &app,
        "PUT",
        &format!("/api/v1/dimensions/{}/price", uuid::Uuid::new_v4()),
        Some(json!({"price": -5})),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(error["error_code"], "invalid_measure");
}

#[tokio::test]
async fn test_malformed_request_id_is_replaced() {
    let request = Request::builder()
        .method("GET")
        .uri("/api/v1/materials")
        .header("x-request-id", "not-a-uuid")
        .body(Body::empty())
        .unwrap();

    let response = app().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let echoed = response.headers()["x-request-id"].to_str().unwrap();
    assert!(uuid::Uuid::parse_str(echoed).is_ok(), "echoed {}", echoed);
}
