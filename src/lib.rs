//! Gift Shop API Library
//!
//! Storefront checkout backend: coupon validation and redemption,
//! cash-on-delivery orders and online payment verification.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod auth;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod handlers;
pub mod middleware_helpers;
pub mod openapi;
pub mod services;
pub mod tracing;

use axum::{
    extract::State,
    http::{HeaderValue, StatusCode},
    response::Json,
    routing::{get, post, put},
    Router,
};
use chrono::Utc;
use sea_orm::DatabaseConnection;
use serde::Serialize;
use std::{sync::Arc, time::Duration};
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowHeaders, AllowMethods, CorsLayer},
    timeout::TimeoutLayer,
};
use utoipa::ToSchema;

use crate::auth::{AdminKey, AdminRouterExt};

// App state definition
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: config::AppConfig,
    pub services: handlers::AppServices,
}

impl AppState {
    /// Builds the state and every service on top of an open pool.
    pub fn new(
        db: Arc<DatabaseConnection>,
        config: config::AppConfig,
    ) -> Result<Self, errors::ServiceError> {
        let services = handlers::AppServices::new(db.clone(), &config)?;
        Ok(Self {
            db,
            config,
            services,
        })
    }
}

// Common response wrappers
#[derive(Serialize, ToSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<ResponseMeta>,
}

#[derive(Serialize, ToSchema)]
pub struct ResponseMeta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    pub timestamp: String,
}

impl ResponseMeta {
    fn capture() -> Self {
        Self {
            request_id: crate::tracing::current_request_id().map(|rid| rid.as_str().to_string()),
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
            meta: Some(ResponseMeta::capture()),
        }
    }

    pub fn failure(data: T, message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: Some(data),
            message: Some(message.into()),
            meta: Some(ResponseMeta::capture()),
        }
    }
}

#[cfg(test)]
mod response_tests {
    use super::*;
    use chrono::DateTime;
    use serde_json::json;

    #[tokio::test]
    async fn success_response_includes_request_metadata() {
        let response =
            crate::tracing::scope_request_id(crate::tracing::RequestId::new("meta-123"), async {
                ApiResponse::success("ok")
            })
            .await;

        assert!(response.success);
        let meta = response.meta.expect("metadata expected");
        assert_eq!(meta.request_id.as_deref(), Some("meta-123"));
        DateTime::parse_from_rfc3339(&meta.timestamp).expect("timestamp should parse");
    }

    #[tokio::test]
    async fn failure_response_keeps_payload_and_message() {
        let response =
            crate::tracing::scope_request_id(crate::tracing::RequestId::new("meta-err"), async {
                ApiResponse::failure(json!({"database": "unhealthy"}), "degraded")
            })
            .await;

        assert!(!response.success);
        assert_eq!(response.message.as_deref(), Some("degraded"));
        assert_eq!(response.data, Some(json!({"database": "unhealthy"})));
        let meta = response.meta.expect("metadata expected");
        assert_eq!(meta.request_id.as_deref(), Some("meta-err"));
    }

    #[test]
    fn meta_without_scope_has_no_request_id() {
        let response = ApiResponse::success(1);
        let meta = response.meta.expect("metadata expected");
        assert!(meta.request_id.is_none());
    }
}

/// Storefront and admin routes mounted under `/api/v1`.
pub fn api_v1_routes(admin_key: AdminKey) -> Router<AppState> {
    let storefront = Router::new()
        .route("/coupons/validate", post(handlers::coupons::validate_coupon))
        .route("/coupons/track-usage", post(handlers::coupons::track_usage))
        .route("/orders/cod", post(handlers::orders::place_cod_order))
        .route(
            "/payment/verify-payment",
            post(handlers::payments::verify_payment),
        );

    let admin = Router::new()
        .route(
            "/coupons",
            get(handlers::coupons::list_coupons).post(handlers::coupons::create_coupon),
        )
        .route(
            "/coupons/:id",
            get(handlers::coupons::get_coupon)
                .put(handlers::coupons::update_coupon)
                .delete(handlers::coupons::delete_coupon),
        )
        .route(
            "/coupons/:id/usage",
            get(handlers::coupons::list_coupon_usage),
        )
        .route("/orders", get(handlers::orders::list_orders))
        .route("/orders/:id", get(handlers::orders::get_order))
        .route(
            "/orders/:id/status",
            put(handlers::orders::update_order_status),
        )
        .with_admin_key(admin_key);

    Router::new()
        .route("/health", get(health_check))
        .route("/status", get(api_status))
        .merge(storefront)
        .nest("/admin", admin)
}

/// CORS policy derived from configuration. Without explicit origins the
/// permissive policy applies only where the configuration allows it.
/// Methods and headers mirror the request since credentials cannot be
/// combined with wildcards.
pub fn cors_layer(cfg: &config::AppConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = cfg
        .cors_allowed_origins
        .as_deref()
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .filter_map(|origin| HeaderValue::from_str(origin).ok())
        .collect();

    if !origins.is_empty() {
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(AllowMethods::mirror_request())
            .allow_headers(AllowHeaders::mirror_request())
            .allow_credentials(cfg.cors_allow_credentials)
    } else if cfg.should_allow_permissive_cors() {
        ::tracing::info!(
            "Using permissive CORS because explicit origins were not configured ({})",
            if cfg.is_development() {
                "development environment"
            } else {
                "explicit override enabled"
            }
        );
        CorsLayer::permissive()
    } else {
        ::tracing::warn!("No CORS origins configured; cross-origin requests will be refused");
        CorsLayer::new()
    }
}

/// Full application router with middleware applied.
pub fn build_router(state: AppState) -> Router {
    let admin_key = AdminKey::new(state.config.admin_api_key.clone());
    let timeout = Duration::from_secs(state.config.request_timeout_secs);
    let cors = cors_layer(&state.config);

    Router::new()
        .route("/", get(|| async { "giftshop-api up" }))
        .nest("/api/v1", api_v1_routes(admin_key))
        .merge(openapi::swagger_ui())
        .layer(TimeoutLayer::new(timeout))
        .layer(CompressionLayer::new())
        .layer(cors)
        .layer(crate::tracing::configure_http_tracing())
        // Outermost so the trace span and error bodies see the id
        .layer(axum::middleware::from_fn(
            middleware_helpers::request_id_middleware,
        ))
        .with_state(state)
}

/// Body of `GET /api/v1/status`.
#[derive(Debug, Serialize, ToSchema)]
pub struct ServiceStatus {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
    pub environment: String,
    pub currency: String,
    pub timestamp: String,
}

/// Body of `GET /api/v1/health`.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthStatus {
    pub status: &'static str,
    pub database: &'static str,
    pub timestamp: String,
}

#[utoipa::path(
    get,
    path = "/api/v1/status",
    summary = "Service status",
    responses(
        (status = 200, description = "Version and environment", body = ApiResponse<ServiceStatus>),
    ),
    tag = "health"
)]
pub async fn api_status(State(state): State<AppState>) -> Json<ApiResponse<ServiceStatus>> {
    Json(ApiResponse::success(ServiceStatus {
        status: "ok",
        service: "giftshop-api",
        version: env!("CARGO_PKG_VERSION"),
        environment: state.config.environment.clone(),
        currency: state.config.currency.clone(),
        timestamp: Utc::now().to_rfc3339(),
    }))
}

#[utoipa::path(
    get,
    path = "/api/v1/health",
    summary = "Health check",
    responses(
        (status = 200, description = "Database reachable", body = ApiResponse<HealthStatus>),
        (status = 503, description = "Database unreachable", body = ApiResponse<HealthStatus>),
    ),
    tag = "health"
)]
pub async fn health_check(
    State(state): State<AppState>,
) -> (StatusCode, Json<ApiResponse<HealthStatus>>) {
    let healthy = db::check_connection(&state.db).await.is_ok();
    let db_status = if healthy { "healthy" } else { "unhealthy" };
    let health = HealthStatus {
        status: db_status,
        database: db_status,
        timestamp: Utc::now().to_rfc3339(),
    };

    if healthy {
        (StatusCode::OK, Json(ApiResponse::success(health)))
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ApiResponse::failure(health, "Database unreachable")),
        )
    }
}
