#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Method, Request},
    Router,
};
use chrono::{DateTime, Utc};
use giftshop_api::{
    config::AppConfig,
    db::{self, DbConfig},
    entities::{
        coupon::{self, CategoryList, DiscountType},
        order,
    },
    AppState,
};
use hmac::{Hmac, Mac};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, Set};
use serde_json::{json, Value};
use sha2::Sha256;
use tower::ServiceExt;
use uuid::Uuid;

pub const ADMIN_KEY: &str = "admin-key-for-tests-0123456789abcdef";
pub const GATEWAY_SECRET: &str = "gateway-secret-for-tests-01";

/// Application router over a fresh in-memory SQLite database.
pub struct TestApp {
    router: Router,
    pub state: AppState,
}

impl TestApp {
    pub async fn new() -> Self {
        let mut cfg = AppConfig::new(
            "sqlite::memory:".to_string(),
            GATEWAY_SECRET.to_string(),
            ADMIN_KEY.to_string(),
            "test".to_string(),
        );
        cfg.cors_allow_any_origin = true;
        // A single connection keeps every query on the same in-memory database.
        cfg.db_max_connections = 1;
        cfg.db_min_connections = 1;

        let pool = db::establish_connection_with_config(&DbConfig::from(&cfg))
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");

        let state = AppState::new(Arc::new(pool), cfg).expect("services should build");
        let router = giftshop_api::build_router(state.clone());

        Self { router, state }
    }

    /// Send a request against the router, optionally with the admin key.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        admin_key: Option<&str>,
    ) -> axum::response::Response {
        self.request_with_headers(method, uri, body, admin_key, &[])
            .await
    }

    pub async fn request_with_headers(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        admin_key: Option<&str>,
        headers: &[(&str, &str)],
    ) -> axum::response::Response {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(key) = admin_key {
            builder = builder.header("x-admin-key", key);
        }
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }

        let body = if let Some(json) = body {
            builder = builder.header("content-type", "application/json");
            Body::from(serde_json::to_vec(&json).expect("failed to serialize json request body"))
        } else {
            Body::empty()
        };

        let request = builder.body(body).expect("failed to build request");
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request")
    }

    pub async fn post_json(&self, uri: &str, body: Value) -> axum::response::Response {
        self.request(Method::POST, uri, Some(body), None).await
    }

    pub async fn admin(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> axum::response::Response {
        self.request(method, uri, body, Some(ADMIN_KEY)).await
    }

    /// Inserts a coupon directly so tests control fields the admin API
    /// would reject, such as past end dates or a spent usage counter.
    pub async fn seed_coupon(&self, seed: CouponSeed) -> coupon::Model {
        let now = Utc::now();
        coupon::ActiveModel {
            id: Set(Uuid::new_v4()),
            code: Set(seed.code.to_uppercase()),
            description: Set(Some(format!("{} test coupon", seed.code))),
            discount_type: Set(seed.discount_type),
            discount_value: Set(seed.discount_value),
            min_order_amount: Set(seed.min_order_amount),
            max_discount_amount: Set(seed.max_discount_amount),
            usage_limit: Set(seed.usage_limit),
            used_count: Set(seed.used_count),
            per_user_limit: Set(seed.per_user_limit),
            start_date: Set(seed.start_date),
            end_date: Set(seed.end_date),
            applicable_categories: Set(seed.categories.map(CategoryList)),
            is_active: Set(seed.is_active),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&*self.state.db)
        .await
        .expect("seed coupon for tests")
    }

    pub async fn reload_coupon(&self, id: Uuid) -> coupon::Model {
        self.state
            .services
            .coupons
            .get_coupon(id)
            .await
            .expect("coupon should exist")
    }

    /// Places a plain COD order and returns the stored row.
    pub async fn place_order(&self, email: &str) -> order::Model {
        let response = self.post_json("/api/v1/orders/cod", order_body(email)).await;
        assert_eq!(response.status(), 200, "order placement should succeed");
        let body = response_json(response).await;
        serde_json::from_value(body["order"].clone()).expect("order in response")
    }
}

/// Field overrides for a seeded coupon.
#[derive(Clone)]
pub struct CouponSeed {
    pub code: &'static str,
    pub discount_type: DiscountType,
    pub discount_value: Decimal,
    pub min_order_amount: Option<Decimal>,
    pub max_discount_amount: Option<Decimal>,
    pub usage_limit: Option<i32>,
    pub used_count: i32,
    pub per_user_limit: Option<i32>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub categories: Option<Vec<String>>,
    pub is_active: bool,
}

impl CouponSeed {
    pub fn percentage(code: &'static str, value: Decimal) -> Self {
        Self {
            code,
            discount_type: DiscountType::Percentage,
            discount_value: value,
            min_order_amount: None,
            max_discount_amount: None,
            usage_limit: None,
            used_count: 0,
            per_user_limit: None,
            start_date: None,
            end_date: None,
            categories: None,
            is_active: true,
        }
    }

    pub fn fixed(code: &'static str, value: Decimal) -> Self {
        Self {
            discount_type: DiscountType::Fixed,
            ..Self::percentage(code, value)
        }
    }
}

/// A valid COD checkout payload: two mugs for a 1000.00 subtotal, no coupon.
pub fn order_body(email: &str) -> Value {
    json!({
        "items": [
            {"name": "Ceramic Mug", "price": "500.00", "quantity": 2, "category": "kitchen"}
        ],
        "subtotal": "1000.00",
        "shipping_charge": "0.00",
        "cod_charge": "50.00",
        "total_amount": "1050.00",
        "customer_name": "Asha Rao",
        "customer_email": email,
        "customer_phone": "+91 98765 43210",
        "shipping_address": "12 MG Road",
        "city": "Bengaluru",
        "state": "Karnataka",
        "postal_code": "560001"
    })
}

/// Gateway signature computed independently of the service under test.
pub fn gateway_signature(order_id: &str, payment_id: &str) -> String {
    let mut mac = Hmac::<Sha256>::new_from_slice(GATEWAY_SECRET.as_bytes())
        .expect("hmac accepts any key length");
    mac.update(format!("{}|{}", order_id, payment_id).as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

pub async fn response_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("failed to read body");
    serde_json::from_slice(&bytes).expect("response should be json")
}

/// Reads a money field, which serializes as a decimal string.
pub fn money(value: &Value) -> Decimal {
    match value {
        Value::String(s) => s.parse().expect("decimal string"),
        Value::Number(n) => n.to_string().parse().expect("decimal number"),
        other => panic!("expected a money value, got {other}"),
    }
}
