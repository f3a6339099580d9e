use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    entities::{coupon, coupon_usage},
    errors::ServiceError,
    handlers::common::{AppJson, PaginatedResponse, PaginationParams},
    services::coupons::{AppliedCoupon, CouponInput, CouponQuery, TrackUsage},
    ApiResponse, AppState,
};

/// Accepted coupon returned to the storefront.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CouponValidationResponse {
    pub valid: bool,
    pub coupon: AppliedCoupon,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TrackUsageResponse {
    pub success: bool,
    pub usage_id: Uuid,
}

#[utoipa::path(
    post,
    path = "/api/v1/coupons/validate",
    summary = "Validate coupon",
    description = "Check a coupon code against the cart and compute its discount",
    request_body = CouponQuery,
    responses(
        (status = 200, description = "Coupon is valid", body = CouponValidationResponse),
        (status = 400, description = "Coupon rejected", body = crate::errors::CouponRejectionResponse),
        (status = 404, description = "Unknown coupon code", body = crate::errors::CouponRejectionResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    tag = "coupons"
)]
pub async fn validate_coupon(
    State(state): State<AppState>,
    AppJson(query): AppJson<CouponQuery>,
) -> Result<Json<CouponValidationResponse>, ServiceError> {
    let coupon = state.services.coupons.validate(&query).await?;
    Ok(Json(CouponValidationResponse {
        valid: true,
        coupon,
    }))
}

#[utoipa::path(
    post,
    path = "/api/v1/coupons/track-usage",
    summary = "Record coupon redemption",
    request_body = TrackUsage,
    responses(
        (status = 200, description = "Redemption recorded", body = TrackUsageResponse),
        (status = 400, description = "Invalid request or usage limit reached", body = crate::errors::ErrorResponse),
        (status = 404, description = "Coupon or order not found", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    tag = "coupons"
)]
pub async fn track_usage(
    State(state): State<AppState>,
    AppJson(usage): AppJson<TrackUsage>,
) -> Result<Json<TrackUsageResponse>, ServiceError> {
    let record = state.services.coupons.track_usage(usage).await?;
    Ok(Json(TrackUsageResponse {
        success: true,
        usage_id: record.id,
    }))
}

#[utoipa::path(
    get,
    path = "/api/v1/admin/coupons",
    summary = "List coupons",
    params(PaginationParams),
    responses(
        (status = 200, description = "Coupons retrieved", body = ApiResponse<PaginatedResponse<coupon::Model>>),
        (status = 401, description = "Missing or invalid admin key", body = crate::errors::ErrorResponse),
    ),
    security(("AdminKey" = [])),
    tag = "admin"
)]
pub async fn list_coupons(
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
) -> Result<Json<ApiResponse<PaginatedResponse<coupon::Model>>>, ServiceError> {
    let (page, per_page) = params.normalized();
    let (coupons, total) = state.services.coupons.list_coupons(page, per_page).await?;
    Ok(Json(ApiResponse::success(PaginatedResponse::new(
        coupons, page, per_page, total,
    ))))
}

#[utoipa::path(
    post,
    path = "/api/v1/admin/coupons",
    summary = "Create coupon",
    request_body = CouponInput,
    responses(
        (status = 201, description = "Coupon created", body = ApiResponse<coupon::Model>),
        (status = 400, description = "Invalid coupon definition", body = crate::errors::ErrorResponse),
        (status = 401, description = "Missing or invalid admin key", body = crate::errors::ErrorResponse),
        (status = 409, description = "Coupon code already exists", body = crate::errors::ErrorResponse),
    ),
    security(("AdminKey" = [])),
    tag = "admin"
)]
pub async fn create_coupon(
    State(state): State<AppState>,
    AppJson(input): AppJson<CouponInput>,
) -> Result<impl IntoResponse, ServiceError> {
    let coupon = state.services.coupons.create_coupon(input).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(coupon))))
}

#[utoipa::path(
    get,
    path = "/api/v1/admin/coupons/{id}",
    summary = "Get coupon",
    params(("id" = Uuid, Path, description = "Coupon ID")),
    responses(
        (status = 200, description = "Coupon retrieved", body = ApiResponse<coupon::Model>),
        (status = 401, description = "Missing or invalid admin key", body = crate::errors::ErrorResponse),
        (status = 404, description = "Coupon not found", body = crate::errors::ErrorResponse),
    ),
    security(("AdminKey" = [])),
    tag = "admin"
)]
pub async fn get_coupon(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<coupon::Model>>, ServiceError> {
    let coupon = state.services.coupons.get_coupon(id).await?;
    Ok(Json(ApiResponse::success(coupon)))
}

#[utoipa::path(
    put,
    path = "/api/v1/admin/coupons/{id}",
    summary = "Replace coupon",
    params(("id" = Uuid, Path, description = "Coupon ID")),
    request_body = CouponInput,
    responses(
        (status = 200, description = "Coupon updated", body = ApiResponse<coupon::Model>),
        (status = 400, description = "Invalid coupon definition", body = crate::errors::ErrorResponse),
        (status = 401, description = "Missing or invalid admin key", body = crate::errors::ErrorResponse),
        (status = 404, description = "Coupon not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Coupon code already exists", body = crate::errors::ErrorResponse),
    ),
    security(("AdminKey" = [])),
    tag = "admin"
)]
pub async fn update_coupon(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    AppJson(input): AppJson<CouponInput>,
) -> Result<Json<ApiResponse<coupon::Model>>, ServiceError> {
    let coupon = state.services.coupons.update_coupon(id, input).await?;
    Ok(Json(ApiResponse::success(coupon)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/admin/coupons/{id}",
    summary = "Delete coupon",
    description = "Deletes the coupon and its redemption history",
    params(("id" = Uuid, Path, description = "Coupon ID")),
    responses(
        (status = 204, description = "Coupon deleted"),
        (status = 401, description = "Missing or invalid admin key", body = crate::errors::ErrorResponse),
        (status = 404, description = "Coupon not found", body = crate::errors::ErrorResponse),
    ),
    security(("AdminKey" = [])),
    tag = "admin"
)]
pub async fn delete_coupon(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ServiceError> {
    state.services.coupons.delete_coupon(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/api/v1/admin/coupons/{id}/usage",
    summary = "Coupon redemption history",
    params(("id" = Uuid, Path, description = "Coupon ID")),
    responses(
        (status = 200, description = "Usage records", body = ApiResponse<Vec<coupon_usage::Model>>),
        (status = 401, description = "Missing or invalid admin key", body = crate::errors::ErrorResponse),
        (status = 404, description = "Coupon not found", body = crate::errors::ErrorResponse),
    ),
    security(("AdminKey" = [])),
    tag = "admin"
)]
pub async fn list_coupon_usage(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Vec<coupon_usage::Model>>>, ServiceError> {
    let usage = state.services.coupons.list_usage(id).await?;
    Ok(Json(ApiResponse::success(usage)))
}
