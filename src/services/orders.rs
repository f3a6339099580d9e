use crate::{
    db::DbPool,
    entities::order::{
        self, ActiveModel as OrderActiveModel, Entity as OrderEntity, Model as OrderModel,
        OrderItems, OrderLine, OrderStatus, PaymentMethod,
    },
    errors::ServiceError,
    services::{
        coupons::{CouponService, TrackUsage},
        email_like, field_error, not_blank,
    },
};
use chrono::Utc;
use metrics::counter;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

/// Checkout payload shared by the COD endpoint and the payment callback.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[validate(schema(function = "validate_amounts", skip_on_field_errors = false))]
pub struct NewOrder {
    #[serde(default)]
    #[validate(custom = "validate_items")]
    pub items: Vec<OrderLine>,
    pub subtotal: Decimal,
    #[serde(default)]
    pub shipping_charge: Decimal,
    /// COD orders fall back to the configured charge when absent.
    #[serde(default)]
    pub cod_charge: Option<Decimal>,
    #[serde(default)]
    pub coupon_id: Option<Uuid>,
    #[serde(default)]
    pub coupon_code: Option<String>,
    #[serde(default)]
    pub coupon_discount: Decimal,
    pub total_amount: Decimal,
    #[serde(default)]
    #[validate(custom = "not_blank")]
    pub customer_name: String,
    #[serde(default)]
    #[validate(custom = "email_like")]
    pub customer_email: String,
    #[serde(default)]
    #[validate(custom = "not_blank")]
    pub customer_phone: String,
    #[serde(default)]
    pub shipping_address: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub postal_code: Option<String>,
}

fn validate_items(items: &[OrderLine]) -> Result<(), ValidationError> {
    if items.is_empty() {
        return Err(field_error("items_empty", "at least one item is required"));
    }
    for line in items {
        if line.quantity <= 0 {
            return Err(field_error("quantity", "item quantity must be positive"));
        }
        if line.price < Decimal::ZERO {
            return Err(field_error("price", "item price must not be negative"));
        }
    }
    Ok(())
}

fn validate_amounts(order: &NewOrder) -> Result<(), ValidationError> {
    let amounts = [
        Some(order.subtotal),
        Some(order.shipping_charge),
        order.cod_charge,
        Some(order.coupon_discount),
        Some(order.total_amount),
    ];
    if amounts.iter().flatten().any(|amount| *amount < Decimal::ZERO) {
        return Err(field_error("negative_amount", "amounts must not be negative"));
    }
    Ok(())
}

/// Gateway identifiers stored on an online order.
#[derive(Debug, Clone)]
pub struct GatewayRef {
    pub order_id: String,
    pub payment_id: String,
}

/// Human-facing order reference, e.g. `GS-20241020-1A2B3C4D`.
pub fn order_number_for(id: Uuid, placed_at: chrono::DateTime<Utc>) -> String {
    let suffix = id.simple().to_string()[..8].to_uppercase();
    format!("GS-{}-{}", placed_at.format("%Y%m%d"), suffix)
}

/// Records checkout orders and serves the admin order views.
#[derive(Clone)]
pub struct OrderService {
    db_pool: Arc<DbPool>,
    coupons: Arc<CouponService>,
    default_cod_charge: Decimal,
}

impl OrderService {
    pub fn new(db_pool: Arc<DbPool>, coupons: Arc<CouponService>, default_cod_charge: Decimal) -> Self {
        Self {
            db_pool,
            coupons,
            default_cod_charge,
        }
    }

    /// Stores a cash-on-delivery order as `pending`. When the caller leaves
    /// out `cod_charge`, the configured charge is applied and added to the
    /// total.
    #[instrument(skip(self, new_order), fields(customer_email = %new_order.customer_email))]
    pub async fn place_cod_order(&self, mut new_order: NewOrder) -> Result<OrderModel, ServiceError> {
        if new_order.cod_charge.is_none() {
            new_order.cod_charge = Some(self.default_cod_charge);
            new_order.total_amount = new_order
                .total_amount
                .checked_add(self.default_cod_charge)
                .ok_or_else(|| {
                    ServiceError::ValidationError("total_amount is too large".to_string())
                })?;
        }
        self.record(new_order, PaymentMethod::Cod, OrderStatus::Pending, None)
            .await
    }

    /// Stores an online order whose payment has already been verified.
    #[instrument(skip(self, new_order, gateway), fields(gateway_payment_id = %gateway.payment_id))]
    pub async fn record_paid_order(
        &self,
        new_order: NewOrder,
        gateway: GatewayRef,
    ) -> Result<OrderModel, ServiceError> {
        self.record(new_order, PaymentMethod::Online, OrderStatus::Paid, Some(gateway))
            .await
    }

    async fn record(
        &self,
        new_order: NewOrder,
        payment_method: PaymentMethod,
        status: OrderStatus,
        gateway: Option<GatewayRef>,
    ) -> Result<OrderModel, ServiceError> {
        new_order.validate()?;

        let db = &*self.db_pool;
        let now = Utc::now();
        let order_id = Uuid::new_v4();
        let coupon_id = new_order.coupon_id;

        let model = OrderActiveModel {
            id: Set(order_id),
            order_number: Set(order_number_for(order_id, now)),
            items: Set(OrderItems(new_order.items)),
            subtotal: Set(new_order.subtotal),
            shipping_charge: Set(new_order.shipping_charge),
            cod_charge: Set(new_order.cod_charge.unwrap_or(Decimal::ZERO)),
            coupon_code: Set(new_order
                .coupon_code
                .map(|c| c.trim().to_uppercase())
                .filter(|c| !c.is_empty())),
            coupon_discount: Set(new_order.coupon_discount),
            total_amount: Set(new_order.total_amount),
            payment_method: Set(payment_method),
            customer_name: Set(new_order.customer_name.trim().to_string()),
            customer_email: Set(new_order.customer_email.trim().to_lowercase()),
            customer_phone: Set(new_order.customer_phone.trim().to_string()),
            shipping_address: Set(new_order.shipping_address),
            city: Set(new_order.city),
            state: Set(new_order.state),
            postal_code: Set(new_order.postal_code),
            status: Set(status),
            tracking_number: Set(None),
            gateway_order_id: Set(gateway.as_ref().map(|g| g.order_id.clone())),
            gateway_payment_id: Set(gateway.map(|g| g.payment_id)),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let order = model.insert(db).await.map_err(|e| {
            error!(error = %e, order_id = %order_id, "Failed to create order in database");
            ServiceError::DatabaseError(e)
        })?;

        counter!("giftshop.orders.placed", 1, "payment_method" => payment_method.as_str());
        info!(order_id = %order.id, order_number = %order.order_number, "Order created");

        if let Some(coupon_id) = coupon_id {
            self.redeem_coupon(&order, coupon_id).await;
        }

        Ok(order)
    }

    /// Usage tracking after checkout never fails the order.
    async fn redeem_coupon(&self, order: &OrderModel, coupon_id: Uuid) {
        let usage = TrackUsage {
            coupon_id,
            order_id: order.id,
            customer_email: order.customer_email.clone(),
            discount_amount: order.coupon_discount,
        };
        if let Err(e) = self.coupons.track_usage(usage).await {
            counter!("giftshop.coupon.tracking_failed", 1);
            warn!(error = %e, order_id = %order.id, coupon_id = %coupon_id, "Failed to record coupon usage for order");
        }
    }

    pub async fn get_order(&self, order_id: Uuid) -> Result<OrderModel, ServiceError> {
        let db = &*self.db_pool;
        OrderEntity::find_by_id(order_id)
            .one(db)
            .await
            .map_err(|e| {
                error!(error = %e, order_id = %order_id, "Failed to fetch order from database");
                ServiceError::DatabaseError(e)
            })?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", order_id)))
    }

    /// Lists orders newest first, optionally narrowed to one status. `page` is 1-based.
    #[instrument(skip(self))]
    pub async fn list_orders(
        &self,
        status: Option<OrderStatus>,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<OrderModel>, u64), ServiceError> {
        let db = &*self.db_pool;
        let mut query = OrderEntity::find().order_by_desc(order::Column::CreatedAt);
        if let Some(status) = status {
            query = query.filter(order::Column::Status.eq(status));
        }

        let paginator = query.paginate(db, per_page.max(1));
        let total = paginator.num_items().await.map_err(|e| {
            error!(error = %e, "Failed to count orders");
            ServiceError::DatabaseError(e)
        })?;
        let orders = paginator
            .fetch_page(page.saturating_sub(1))
            .await
            .map_err(|e| {
                error!(error = %e, page = page, per_page = per_page, "Failed to fetch orders page");
                ServiceError::DatabaseError(e)
            })?;

        Ok((orders, total))
    }

    /// Sets any status; there is no transition graph. A supplied tracking
    /// number replaces the stored one.
    #[instrument(skip(self), fields(order_id = %order_id, new_status = status.as_str()))]
    pub async fn update_status(
        &self,
        order_id: Uuid,
        status: OrderStatus,
        tracking_number: Option<String>,
    ) -> Result<OrderModel, ServiceError> {
        let db = &*self.db_pool;
        let order = self.get_order(order_id).await?;
        let old_status = order.status;

        let mut model: OrderActiveModel = order.into();
        model.status = Set(status);
        if let Some(tracking) = tracking_number.filter(|t| !t.trim().is_empty()) {
            model.tracking_number = Set(Some(tracking.trim().to_string()));
        }
        model.updated_at = Set(Utc::now());

        let updated = model.update(db).await.map_err(|e| {
            error!(error = %e, order_id = %order_id, "Failed to update order status");
            ServiceError::DatabaseError(e)
        })?;

        info!(old_status = old_status.as_str(), "Order status updated");
        Ok(updated)
    }
}
