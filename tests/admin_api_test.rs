mod common;

use axum::http::{Method, StatusCode};
use common::{money, response_json, CouponSeed, TestApp, ADMIN_KEY};
use rust_decimal_macros::dec;
use serde_json::json;
use uuid::Uuid;

fn coupon_payload(code: &str) -> serde_json::Value {
    json!({
        "code": code,
        "description": "Festive season",
        "discount_type": "percentage",
        "discount_value": "20",
        "min_order_amount": "300",
        "max_discount_amount": "250",
        "usage_limit": 100,
        "per_user_limit": 2,
        "applicable_categories": ["candles", "cards"]
    })
}

#[tokio::test]
async fn admin_routes_require_the_admin_key() {
    let app = TestApp::new().await;

    let missing = app
        .request(Method::GET, "/api/v1/admin/coupons", None, None)
        .await;
    assert_eq!(missing.status(), StatusCode::UNAUTHORIZED);
    let body = response_json(missing).await;
    assert_eq!(body["error"], "Unauthorized");

    let wrong = app
        .request(
            Method::GET,
            "/api/v1/admin/orders",
            None,
            Some("admin-key-for-tests-0123456789abcdeX"),
        )
        .await;
    assert_eq!(wrong.status(), StatusCode::UNAUTHORIZED);

    let ok = app
        .request(Method::GET, "/api/v1/admin/coupons", None, Some(ADMIN_KEY))
        .await;
    assert_eq!(ok.status(), StatusCode::OK);
}

#[tokio::test]
async fn storefront_routes_are_public() {
    let app = TestApp::new().await;

    let response = app
        .post_json(
            "/api/v1/coupons/validate",
            json!({"code": "NONE", "subtotal": "10"}),
        )
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn coupon_crud_round_trip() {
    let app = TestApp::new().await;

    let created = app
        .admin(
            Method::POST,
            "/api/v1/admin/coupons",
            Some(coupon_payload("diwali20")),
        )
        .await;
    assert_eq!(created.status(), StatusCode::CREATED);
    let body = response_json(created).await;
    assert_eq!(body["success"], true);
    let coupon = &body["data"];
    assert_eq!(coupon["code"], "DIWALI20");
    assert_eq!(coupon["used_count"], 0);
    assert_eq!(coupon["is_active"], true);
    let id = coupon["id"].as_str().expect("coupon id").to_string();

    let fetched = app
        .admin(Method::GET, &format!("/api/v1/admin/coupons/{id}"), None)
        .await;
    assert_eq!(fetched.status(), StatusCode::OK);
    assert_eq!(
        money(&response_json(fetched).await["data"]["discount_value"]),
        dec!(20)
    );

    let mut changed = coupon_payload("DIWALI20");
    changed["discount_value"] = json!("25");
    changed["is_active"] = json!(false);
    let updated = app
        .admin(
            Method::PUT,
            &format!("/api/v1/admin/coupons/{id}"),
            Some(changed),
        )
        .await;
    assert_eq!(updated.status(), StatusCode::OK);
    let updated = response_json(updated).await;
    assert_eq!(money(&updated["data"]["discount_value"]), dec!(25));
    assert_eq!(updated["data"]["is_active"], false);

    let listed = app
        .admin(Method::GET, "/api/v1/admin/coupons?page=1&per_page=10", None)
        .await;
    assert_eq!(listed.status(), StatusCode::OK);
    let listed = response_json(listed).await;
    assert_eq!(listed["data"]["data"].as_array().map(Vec::len), Some(1));
    assert_eq!(listed["data"]["pagination"]["total"], 1);

    let deleted = app
        .admin(Method::DELETE, &format!("/api/v1/admin/coupons/{id}"), None)
        .await;
    assert_eq!(deleted.status(), StatusCode::NO_CONTENT);

    let gone = app
        .admin(Method::GET, &format!("/api/v1/admin/coupons/{id}"), None)
        .await;
    assert_eq!(gone.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn duplicate_codes_conflict_regardless_of_case() {
    let app = TestApp::new().await;

    let first = app
        .admin(
            Method::POST,
            "/api/v1/admin/coupons",
            Some(coupon_payload("GIFT")),
        )
        .await;
    assert_eq!(first.status(), StatusCode::CREATED);

    let second = app
        .admin(
            Method::POST,
            "/api/v1/admin/coupons",
            Some(coupon_payload("gift")),
        )
        .await;
    assert_eq!(second.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn invalid_coupon_definitions_are_rejected() {
    let app = TestApp::new().await;

    let mut too_much = coupon_payload("HUGE");
    too_much["discount_value"] = json!("150");
    let response = app
        .admin(Method::POST, "/api/v1/admin/coupons", Some(too_much))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let mut backwards = coupon_payload("BACKWARDS");
    backwards["start_date"] = json!("2024-12-31T00:00:00Z");
    backwards["end_date"] = json!("2024-01-01T00:00:00Z");
    let response = app
        .admin(Method::POST, "/api/v1/admin/coupons", Some(backwards))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let mut zero_fixed = coupon_payload("ZERO");
    zero_fixed["discount_type"] = json!("fixed");
    zero_fixed["discount_value"] = json!("0");
    let response = app
        .admin(Method::POST, "/api/v1/admin/coupons", Some(zero_fixed))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn deleting_a_redeemed_coupon_removes_its_history() {
    let app = TestApp::new().await;
    let coupon = app
        .seed_coupon(CouponSeed::fixed("USED", dec!(40)))
        .await;
    let order = app.place_order("history@example.com").await;

    let tracked = app
        .post_json(
            "/api/v1/coupons/track-usage",
            json!({
                "coupon_id": coupon.id,
                "order_id": order.id,
                "customer_email": "history@example.com",
                "discount_amount": "40"
            }),
        )
        .await;
    assert_eq!(tracked.status(), StatusCode::OK);

    let usage = app
        .admin(
            Method::GET,
            &format!("/api/v1/admin/coupons/{}/usage", coupon.id),
            None,
        )
        .await;
    assert_eq!(usage.status(), StatusCode::OK);
    let usage = response_json(usage).await;
    assert_eq!(usage["data"].as_array().map(Vec::len), Some(1));
    assert_eq!(usage["data"][0]["order_id"], json!(order.id));

    let deleted = app
        .admin(
            Method::DELETE,
            &format!("/api/v1/admin/coupons/{}", coupon.id),
            None,
        )
        .await;
    assert_eq!(deleted.status(), StatusCode::NO_CONTENT);

    let usage = app
        .admin(
            Method::GET,
            &format!("/api/v1/admin/coupons/{}/usage", coupon.id),
            None,
        )
        .await;
    assert_eq!(usage.status(), StatusCode::NOT_FOUND);

    let missing = app
        .admin(
            Method::DELETE,
            &format!("/api/v1/admin/coupons/{}", Uuid::new_v4()),
            None,
        )
        .await;
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn orders_can_be_listed_filtered_and_moved_between_statuses() {
    let app = TestApp::new().await;
    let first = app.place_order("first@example.com").await;
    let second = app.place_order("second@example.com").await;

    let listed = app
        .admin(Method::GET, "/api/v1/admin/orders", None)
        .await;
    assert_eq!(listed.status(), StatusCode::OK);
    let listed = response_json(listed).await;
    assert_eq!(listed["data"]["pagination"]["total"], 2);

    let shipped = app
        .admin(
            Method::PUT,
            &format!("/api/v1/admin/orders/{}/status", first.id),
            Some(json!({"status": "shipped", "tracking_number": "TRK-1001"})),
        )
        .await;
    assert_eq!(shipped.status(), StatusCode::OK);
    let shipped = response_json(shipped).await;
    assert_eq!(shipped["data"]["status"], "shipped");
    assert_eq!(shipped["data"]["tracking_number"], "TRK-1001");

    // Any status may follow any other.
    let back = app
        .admin(
            Method::PUT,
            &format!("/api/v1/admin/orders/{}/status", first.id),
            Some(json!({"status": "pending"})),
        )
        .await;
    assert_eq!(back.status(), StatusCode::OK);
    let back = response_json(back).await;
    assert_eq!(back["data"]["status"], "pending");
    assert_eq!(back["data"]["tracking_number"], "TRK-1001");

    let cancelled = app
        .admin(
            Method::PUT,
            &format!("/api/v1/admin/orders/{}/status", second.id),
            Some(json!({"status": "cancelled"})),
        )
        .await;
    assert_eq!(cancelled.status(), StatusCode::OK);

    let filtered = app
        .admin(Method::GET, "/api/v1/admin/orders?status=cancelled", None)
        .await;
    assert_eq!(filtered.status(), StatusCode::OK);
    let filtered = response_json(filtered).await;
    assert_eq!(filtered["data"]["pagination"]["total"], 1);
    assert_eq!(filtered["data"]["data"][0]["id"], json!(second.id));

    let fetched = app
        .admin(Method::GET, &format!("/api/v1/admin/orders/{}", second.id), None)
        .await;
    assert_eq!(fetched.status(), StatusCode::OK);
    assert_eq!(response_json(fetched).await["data"]["status"], "cancelled");
}

#[tokio::test]
async fn order_admin_rejects_bad_input() {
    let app = TestApp::new().await;
    let order = app.place_order("bad@example.com").await;

    let unknown_filter = app
        .admin(Method::GET, "/api/v1/admin/orders?status=lost", None)
        .await;
    assert_eq!(unknown_filter.status(), StatusCode::BAD_REQUEST);

    let unknown_status = app
        .admin(
            Method::PUT,
            &format!("/api/v1/admin/orders/{}/status", order.id),
            Some(json!({"status": "teleported"})),
        )
        .await;
    assert_eq!(unknown_status.status(), StatusCode::BAD_REQUEST);

    let missing = app
        .admin(
            Method::PUT,
            &format!("/api/v1/admin/orders/{}/status", Uuid::new_v4()),
            Some(json!({"status": "shipped"})),
        )
        .await;
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn health_status_and_request_ids() {
    let app = TestApp::new().await;

    let health = app.request(Method::GET, "/api/v1/health", None, None).await;
    assert_eq!(health.status(), StatusCode::OK);
    let generated = health
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .expect("request id header");
    assert!(!generated.is_empty());
    let health = response_json(health).await;
    assert_eq!(health["data"]["database"], "healthy");

    let status = app
        .request_with_headers(
            Method::GET,
            "/api/v1/status",
            None,
            None,
            &[("x-request-id", "checkout-trace-42")],
        )
        .await;
    assert_eq!(status.status(), StatusCode::OK);
    assert_eq!(
        status.headers().get("x-request-id").and_then(|v| v.to_str().ok()),
        Some("checkout-trace-42")
    );
    let status = response_json(status).await;
    assert_eq!(status["data"]["currency"], "INR");
    assert_eq!(status["meta"]["request_id"], "checkout-trace-42");
}

#[tokio::test]
async fn openapi_document_is_served() {
    let app = TestApp::new().await;

    let response = app
        .request(Method::GET, "/api-docs/openapi.json", None, None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let doc = response_json(response).await;
    assert!(doc["paths"]["/api/v1/orders/cod"].is_object());
}
