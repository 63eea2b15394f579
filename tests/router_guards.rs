//! Requests that are rejected before any query runs, driven through the full
//! router over a pool that never connects.

mod common;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
};
use farmbox_api::{app::build_app, services::auth_service::issue_token};
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

fn app() -> Router {
    build_app(common::lazy_state(), &common::test_config())
}

fn bearer(role: &str) -> String {
    common::init();
    let token = issue_token(Uuid::new_v4(), role).expect("token");
    format!("Bearer {token}")
}

async fn send(request: Request<Body>) -> (StatusCode, Value) {
    let response = app().oneshot(request).await.expect("response");
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

fn json_request(method: &str, uri: &str, auth: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(auth) = auth {
        builder = builder.header(header::AUTHORIZATION, auth);
    }
    builder.body(Body::from(body.to_string())).expect("request")
}

fn get(uri: &str, auth: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(auth) = auth {
        builder = builder.header(header::AUTHORIZATION, auth);
    }
    builder.body(Body::empty()).expect("request")
}

#[tokio::test]
async fn health_is_public() {
    let (status, body) = send(get("/health", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], true);
    assert_eq!(body["data"]["status"], "ok");
}

#[tokio::test]
async fn unknown_route_uses_error_envelope() {
    let (status, body) = send(get("/api/nope", None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["ok"], false);
}

#[tokio::test]
async fn missing_token_is_unauthorized() {
    let (status, body) = send(get("/api/orders", None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["ok"], false);
    assert_eq!(body["message"], "Missing Authorization header");
}

#[tokio::test]
async fn wrong_scheme_and_bad_token_are_unauthorized() {
    let (status, _) = send(get("/api/cart", Some("Token abc"))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = send(get("/api/cart", Some("Bearer not-a-jwt"))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Invalid or expired token");
}

#[tokio::test]
async fn plans_are_listed_without_auth() {
    let (status, body) = send(get("/api/subscriptions/plans", None)).await;
    assert_eq!(status, StatusCode::OK);
    let plans = body["data"].as_array().expect("plan list");
    assert_eq!(plans.len(), 3);
    assert_eq!(plans[0]["plan"], "basic");
    assert_eq!(plans[0]["limit_in_kg"], 5.0);
}

#[tokio::test]
async fn producer_status_update_rejects_unknown_status() {
    let auth = bearer("producer");
    let uri = format!("/api/orders/producer/{}/status", Uuid::new_v4());
    let (status, body) = send(json_request(
        "PUT",
        &uri,
        Some(&auth),
        serde_json::json!({ "status": "shipped" }),
    ))
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["ok"], false);
    assert_eq!(body["message"], "Invalid order status: shipped");
}

#[tokio::test]
async fn admin_routes_require_admin_role() {
    let auth = bearer("customer");
    let (status, body) = send(get("/api/admin/orders", Some(&auth))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["ok"], false);

    let (status, _) = send(get("/api/admin/dashboard", Some(&bearer("producer")))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn admin_status_update_rejects_unknown_status() {
    let auth = bearer("admin");
    let uri = format!("/api/admin/orders/{}/status", Uuid::new_v4());
    let (status, _) = send(json_request(
        "PUT",
        &uri,
        Some(&auth),
        serde_json::json!({ "status": "lost" }),
    ))
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn only_customers_subscribe_and_plan_must_exist() {
    let (status, _) = send(json_request(
        "POST",
        "/api/subscriptions",
        Some(&bearer("producer")),
        serde_json::json!({ "plan": "basic" }),
    ))
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(json_request(
        "POST",
        "/api/subscriptions",
        Some(&bearer("customer")),
        serde_json::json!({ "plan": "gold" }),
    ))
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Unknown plan: gold");
}

#[tokio::test]
async fn customers_cannot_create_products() {
    let (status, _) = send(json_request(
        "POST",
        "/api/products",
        Some(&bearer("customer")),
        serde_json::json!({
            "name": "Carrots",
            "category": "vegetables",
            "price": 100,
            "weight_in_kg": 1.0,
            "stock": 10
        }),
    ))
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn cart_quantity_must_be_positive() {
    let (status, body) = send(json_request(
        "POST",
        "/api/cart",
        Some(&bearer("customer")),
        serde_json::json!({ "product_id": Uuid::new_v4(), "quantity": 0 }),
    ))
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "quantity must be greater than 0");
}

#[tokio::test]
async fn out_of_range_page_is_rejected() {
    let uri = format!("/api/products?page={}&per_page=100", i64::MAX);
    let (status, body) = send(get(&uri, None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "page is out of range");

    let uri = format!("/api/orders?page={}", i64::MAX);
    let (status, _) = send(get(&uri, Some(&bearer("customer")))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
