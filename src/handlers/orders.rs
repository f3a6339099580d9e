use axum::{
    extract::{Path, Query, State},
    response::Json,
};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::{
    entities::order::{self, OrderStatus},
    errors::ServiceError,
    handlers::common::{AppJson, PaginatedResponse, PaginationParams},
    services::orders::NewOrder,
    ApiResponse, AppState,
};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OrderPlacedResponse {
    pub success: bool,
    pub order: order::Model,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct OrderListQuery {
    pub page: Option<u64>,
    pub per_page: Option<u64>,
    /// One of pending, processing, paid, shipped, delivered, cancelled
    pub status: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateOrderStatusRequest {
    pub status: OrderStatus,
    #[validate(length(max = 128, message = "Tracking number is too long"))]
    pub tracking_number: Option<String>,
}

#[utoipa::path(
    post,
    path = "/api/v1/orders/cod",
    summary = "Place cash-on-delivery order",
    request_body = NewOrder,
    responses(
        (status = 200, description = "Order placed", body = OrderPlacedResponse,
            headers(("X-Request-Id" = String, description = "Unique request id"))
        ),
        (status = 400, description = "Missing customer details, bad items or negative amounts", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    tag = "orders"
)]
pub async fn place_cod_order(
    State(state): State<AppState>,
    AppJson(new_order): AppJson<NewOrder>,
) -> Result<Json<OrderPlacedResponse>, ServiceError> {
    let order = state.services.orders.place_cod_order(new_order).await?;
    Ok(Json(OrderPlacedResponse {
        success: true,
        order,
    }))
}

#[utoipa::path(
    get,
    path = "/api/v1/admin/orders",
    summary = "List orders",
    description = "Newest first, optionally filtered by status",
    params(OrderListQuery),
    responses(
        (status = 200, description = "Orders retrieved", body = ApiResponse<PaginatedResponse<order::Model>>),
        (status = 400, description = "Unknown status filter", body = crate::errors::ErrorResponse),
        (status = 401, description = "Missing or invalid admin key", body = crate::errors::ErrorResponse),
    ),
    security(("AdminKey" = [])),
    tag = "admin"
)]
pub async fn list_orders(
    State(state): State<AppState>,
    Query(query): Query<OrderListQuery>,
) -> Result<Json<ApiResponse<PaginatedResponse<order::Model>>>, ServiceError> {
    let status = query
        .status
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            OrderStatus::from_str(s)
                .map_err(|_| ServiceError::BadRequest(format!("Unknown order status: {}", s)))
        })
        .transpose()?;

    let defaults = PaginationParams::default();
    let (page, per_page) = PaginationParams {
        page: query.page.unwrap_or(defaults.page),
        per_page: query.per_page.unwrap_or(defaults.per_page),
    }
    .normalized();

    let (orders, total) = state
        .services
        .orders
        .list_orders(status, page, per_page)
        .await?;
    Ok(Json(ApiResponse::success(PaginatedResponse::new(
        orders, page, per_page, total,
    ))))
}

#[utoipa::path(
    get,
    path = "/api/v1/admin/orders/{id}",
    summary = "Get order",
    params(("id" = Uuid, Path, description = "Order ID")),
    responses(
        (status = 200, description = "Order retrieved", body = ApiResponse<order::Model>),
        (status = 401, description = "Missing or invalid admin key", body = crate::errors::ErrorResponse),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse),
    ),
    security(("AdminKey" = [])),
    tag = "admin"
)]
pub async fn get_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<order::Model>>, ServiceError> {
    let order = state.services.orders.get_order(id).await?;
    Ok(Json(ApiResponse::success(order)))
}

#[utoipa::path(
    put,
    path = "/api/v1/admin/orders/{id}/status",
    summary = "Update order status",
    description = "Any status may be set at any time",
    params(("id" = Uuid, Path, description = "Order ID")),
    request_body = UpdateOrderStatusRequest,
    responses(
        (status = 200, description = "Status updated", body = ApiResponse<order::Model>),
        (status = 400, description = "Invalid status", body = crate::errors::ErrorResponse),
        (status = 401, description = "Missing or invalid admin key", body = crate::errors::ErrorResponse),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse),
    ),
    security(("AdminKey" = [])),
    tag = "admin"
)]
pub async fn update_order_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    AppJson(request): AppJson<UpdateOrderStatusRequest>,
) -> Result<Json<ApiResponse<order::Model>>, ServiceError> {
    request.validate()?;
    let order = state
        .services
        .orders
        .update_status(id, request.status, request.tracking_number)
        .await?;
    Ok(Json(ApiResponse::success(order)))
}
