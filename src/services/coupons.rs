use crate::{
    db::DbPool,
    entities::coupon::{
        self, ActiveModel as CouponActiveModel, CategoryList, DiscountType, Entity as CouponEntity,
        Model as CouponModel,
    },
    entities::coupon_usage::{
        self, ActiveModel as CouponUsageActiveModel, Entity as CouponUsageEntity,
        Model as CouponUsageModel,
    },
    entities::order::Entity as OrderEntity,
    errors::ServiceError,
    services::{email_like, field_error},
};
use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use metrics::counter;
use rust_decimal::{Decimal, RoundingStrategy};
use sea_orm::{
    sea_query::{Expr, Func},
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

/// Reasons a coupon code can be turned away at checkout.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CouponRejection {
    #[error("Coupon code is required")]
    MissingCode,
    #[error("Invalid coupon code")]
    UnknownCode,
    #[error("Coupon is not active yet")]
    NotStarted,
    #[error("Coupon has expired")]
    Expired,
    #[error("Minimum order amount of {0:.2} required for this coupon")]
    BelowMinimum(Decimal),
    #[error("Coupon usage limit exceeded")]
    UsageLimitReached,
    #[error("You have already used this coupon {0} time(s)")]
    PerUserLimitReached(u64),
    #[error("Coupon not applicable for items in your cart")]
    CategoryMismatch,
}

impl CouponRejection {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::UnknownCode => StatusCode::NOT_FOUND,
            _ => StatusCode::BAD_REQUEST,
        }
    }

    fn reason(&self) -> &'static str {
        match self {
            Self::MissingCode => "missing_code",
            Self::UnknownCode => "unknown_code",
            Self::NotStarted => "not_started",
            Self::Expired => "expired",
            Self::BelowMinimum(_) => "below_minimum",
            Self::UsageLimitReached => "usage_limit",
            Self::PerUserLimitReached(_) => "per_user_limit",
            Self::CategoryMismatch => "category_mismatch",
        }
    }
}

/// What the shopper presents at checkout.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct CouponQuery {
    #[serde(default)]
    pub code: String,
    pub subtotal: Decimal,
    #[serde(default)]
    pub email: Option<String>,
    /// Categories of the items in the cart.
    #[serde(default)]
    pub categories: Vec<String>,
}

/// An accepted coupon and the discount it yields for the given subtotal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct AppliedCoupon {
    pub id: Uuid,
    pub code: String,
    pub description: Option<String>,
    pub discount_type: DiscountType,
    pub discount_value: Decimal,
    pub discount_amount: Decimal,
}

/// A redemption to record once an order exists.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct TrackUsage {
    pub coupon_id: Uuid,
    pub order_id: Uuid,
    #[validate(custom = "email_like")]
    pub customer_email: String,
    pub discount_amount: Decimal,
}

/// Admin payload for creating or replacing a coupon.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[validate(schema(function = "validate_coupon_input", skip_on_field_errors = false))]
pub struct CouponInput {
    #[validate(length(min = 1, max = 64, message = "Coupon code must be 1-64 characters"))]
    pub code: String,
    pub description: Option<String>,
    pub discount_type: DiscountType,
    pub discount_value: Decimal,
    pub min_order_amount: Option<Decimal>,
    pub max_discount_amount: Option<Decimal>,
    #[validate(range(min = 0, message = "Usage limit cannot be negative"))]
    pub usage_limit: Option<i32>,
    #[validate(range(min = 1, message = "Per-user limit must be at least 1"))]
    pub per_user_limit: Option<i32>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub applicable_categories: Option<Vec<String>>,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

fn validate_coupon_input(input: &CouponInput) -> Result<(), ValidationError> {
    if input.code.trim().is_empty() {
        return Err(field_error("code_blank", "Coupon code must not be blank"));
    }
    match input.discount_type {
        DiscountType::Percentage => {
            if input.discount_value.fract() != Decimal::ZERO
                || input.discount_value < Decimal::ONE
                || input.discount_value > Decimal::ONE_HUNDRED
            {
                return Err(field_error(
                    "percentage_out_of_range",
                    "Percentage discounts must be whole numbers from 1 to 100",
                ));
            }
        }
        DiscountType::Fixed => {
            if input.discount_value <= Decimal::ZERO {
                return Err(field_error(
                    "fixed_not_positive",
                    "Fixed discounts must be positive",
                ));
            }
        }
    }
    let negative = [input.min_order_amount, input.max_discount_amount]
        .iter()
        .flatten()
        .any(|amount| *amount < Decimal::ZERO);
    if negative {
        return Err(field_error("negative_amount", "Amounts must not be negative"));
    }
    if let (Some(start), Some(end)) = (input.start_date, input.end_date) {
        if end < start {
            return Err(field_error("end_before_start", "end_date must not precede start_date"));
        }
    }
    Ok(())
}

/// Rounds a money amount to two places, halves away from zero.
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Date window, minimum order and global usage checks. Needs no storage access.
pub fn check_eligibility(
    coupon: &CouponModel,
    subtotal: Decimal,
    now: DateTime<Utc>,
) -> Result<(), CouponRejection> {
    if coupon.end_date.is_some_and(|end| now > end) {
        return Err(CouponRejection::Expired);
    }
    if coupon.start_date.is_some_and(|start| now < start) {
        return Err(CouponRejection::NotStarted);
    }
    if let Some(min) = coupon.min_order_amount {
        if subtotal < min {
            return Err(CouponRejection::BelowMinimum(min));
        }
    }
    if let Some(limit) = coupon.usage_limit {
        if coupon.used_count >= limit {
            return Err(CouponRejection::UsageLimitReached);
        }
    }
    Ok(())
}

pub fn check_per_user_limit(coupon: &CouponModel, prior_uses: u64) -> Result<(), CouponRejection> {
    match coupon.per_user_limit {
        Some(limit) if prior_uses >= u64::try_from(limit.max(0)).unwrap_or(0) => {
            Err(CouponRejection::PerUserLimitReached(prior_uses))
        }
        _ => Ok(()),
    }
}

/// Only enforced when both the coupon and the cart name categories; then at
/// least one must be shared.
pub fn check_categories(coupon: &CouponModel, categories: &[String]) -> Result<(), CouponRejection> {
    if categories.iter().all(|c| c.trim().is_empty()) {
        return Ok(());
    }
    match &coupon.applicable_categories {
        Some(allowed) if !allowed.is_unrestricted() => {
            if allowed.overlaps(categories) {
                Ok(())
            } else {
                Err(CouponRejection::CategoryMismatch)
            }
        }
        _ => Ok(()),
    }
}

/// Discount for `subtotal`. Percentage discounts are rounded before the cap
/// applies; fixed discounts are returned as configured. Fails when the
/// product does not fit in a `Decimal`.
pub fn compute_discount(coupon: &CouponModel, subtotal: Decimal) -> Result<Decimal, ServiceError> {
    match coupon.discount_type {
        DiscountType::Percentage => {
            let product = subtotal.checked_mul(coupon.discount_value).ok_or_else(|| {
                ServiceError::ValidationError("subtotal is too large".to_string())
            })?;
            let raw = round_money(product / Decimal::ONE_HUNDRED);
            Ok(match coupon.max_discount_amount {
                Some(cap) => raw.min(cap),
                None => raw,
            })
        }
        DiscountType::Fixed => Ok(coupon.discount_value),
    }
}

fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Coupon validation, redemption tracking and administration.
#[derive(Clone)]
pub struct CouponService {
    db_pool: Arc<DbPool>,
}

impl CouponService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    /// Validates a coupon against the shopper's cart at the current time.
    #[instrument(skip(self, query), fields(code = %query.code))]
    pub async fn validate(&self, query: &CouponQuery) -> Result<AppliedCoupon, ServiceError> {
        let result = self.validate_at(query, Utc::now()).await;
        match &result {
            Ok(applied) => {
                counter!("giftshop.coupon.validated", 1, "outcome" => "accepted");
                info!(coupon_id = %applied.id, discount = %applied.discount_amount, "Coupon accepted");
            }
            Err(ServiceError::CouponRejected(rejection)) => {
                counter!("giftshop.coupon.validated", 1, "outcome" => rejection.reason());
                info!(reason = rejection.reason(), "Coupon rejected");
            }
            Err(_) => {}
        }
        result
    }

    /// Same as [`validate`](Self::validate) with an explicit clock.
    pub async fn validate_at(
        &self,
        query: &CouponQuery,
        now: DateTime<Utc>,
    ) -> Result<AppliedCoupon, ServiceError> {
        if query.code.trim().is_empty() {
            return Err(CouponRejection::MissingCode.into());
        }
        if query.subtotal < Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "subtotal must not be negative".to_string(),
            ));
        }

        let coupon = self
            .find_active_by_code(&query.code)
            .await?
            .ok_or(CouponRejection::UnknownCode)?;

        check_eligibility(&coupon, query.subtotal, now)?;

        let email = query
            .email
            .as_deref()
            .map(str::trim)
            .filter(|e| !e.is_empty());
        if let (Some(email), Some(_)) = (email, coupon.per_user_limit) {
            let prior_uses = self.count_uses_by_email(coupon.id, email).await?;
            check_per_user_limit(&coupon, prior_uses)?;
        }

        check_categories(&coupon, &query.categories)?;

        let discount_amount = compute_discount(&coupon, query.subtotal)?;
        Ok(AppliedCoupon {
            id: coupon.id,
            code: coupon.code,
            description: coupon.description,
            discount_type: coupon.discount_type,
            discount_value: coupon.discount_value,
            discount_amount,
        })
    }

    /// Looks up an active coupon, ignoring case and surrounding whitespace.
    pub async fn find_active_by_code(&self, code: &str) -> Result<Option<CouponModel>, ServiceError> {
        let db = &*self.db_pool;
        let coupon = CouponEntity::find()
            .filter(Expr::expr(Func::upper(Expr::col(coupon::Column::Code))).eq(normalize_code(code)))
            .filter(coupon::Column::IsActive.eq(true))
            .one(db)
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to look up coupon by code");
                ServiceError::DatabaseError(e)
            })?;
        Ok(coupon)
    }

    /// Number of recorded redemptions of a coupon by one email address.
    pub async fn count_uses_by_email(&self, coupon_id: Uuid, email: &str) -> Result<u64, ServiceError> {
        let db = &*self.db_pool;
        let count = CouponUsageEntity::find()
            .filter(coupon_usage::Column::CouponId.eq(coupon_id))
            .filter(
                Expr::expr(Func::lower(Expr::col(coupon_usage::Column::CustomerEmail)))
                    .eq(normalize_email(email)),
            )
            .count(db)
            .await
            .map_err(|e| {
                error!(error = %e, coupon_id = %coupon_id, "Failed to count coupon usage");
                ServiceError::DatabaseError(e)
            })?;
        Ok(count)
    }

    /// Records a redemption and bumps the coupon's used count in one
    /// transaction. The increment only happens while the count is below the
    /// usage limit, so concurrent redemptions cannot overshoot it.
    #[instrument(skip(self, usage), fields(coupon_id = %usage.coupon_id, order_id = %usage.order_id))]
    pub async fn track_usage(&self, usage: TrackUsage) -> Result<CouponUsageModel, ServiceError> {
        usage.validate()?;
        if usage.discount_amount < Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "discount_amount must not be negative".to_string(),
            ));
        }

        let db = &*self.db_pool;
        let now = Utc::now();
        let txn = db.begin().await.map_err(|e| {
            error!(error = %e, "Failed to start transaction for coupon usage");
            ServiceError::DatabaseError(e)
        })?;

        let coupon = CouponEntity::find_by_id(usage.coupon_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Coupon {} not found", usage.coupon_id)))?;

        if OrderEntity::find_by_id(usage.order_id).one(&txn).await?.is_none() {
            return Err(ServiceError::NotFound(format!(
                "Order {} not found",
                usage.order_id
            )));
        }

        let updated = CouponEntity::update_many()
            .col_expr(
                coupon::Column::UsedCount,
                Expr::col(coupon::Column::UsedCount).add(1),
            )
            .col_expr(coupon::Column::UpdatedAt, Expr::value(now))
            .filter(coupon::Column::Id.eq(coupon.id))
            .filter(
                Condition::any()
                    .add(coupon::Column::UsageLimit.is_null())
                    .add(Expr::col(coupon::Column::UsedCount).lt(Expr::col(coupon::Column::UsageLimit))),
            )
            .exec(&txn)
            .await?;

        if updated.rows_affected == 0 {
            txn.rollback().await?;
            warn!(coupon_id = %coupon.id, "Coupon usage limit reached while recording redemption");
            return Err(CouponRejection::UsageLimitReached.into());
        }

        let record = CouponUsageActiveModel {
            id: Set(Uuid::new_v4()),
            coupon_id: Set(coupon.id),
            order_id: Set(usage.order_id),
            customer_email: Set(normalize_email(&usage.customer_email)),
            discount_amount: Set(usage.discount_amount),
            used_at: Set(now),
        }
        .insert(&txn)
        .await
        .map_err(|e| {
            error!(error = %e, coupon_id = %coupon.id, "Failed to insert coupon usage");
            ServiceError::DatabaseError(e)
        })?;

        txn.commit().await.map_err(|e| {
            error!(error = %e, coupon_id = %coupon.id, "Failed to commit coupon usage");
            ServiceError::DatabaseError(e)
        })?;

        counter!("giftshop.coupon.redeemed", 1);
        info!(usage_id = %record.id, "Coupon redemption recorded");
        Ok(record)
    }

    #[instrument(skip(self, input), fields(code = %input.code))]
    pub async fn create_coupon(&self, input: CouponInput) -> Result<CouponModel, ServiceError> {
        input.validate()?;
        let db = &*self.db_pool;
        let code = normalize_code(&input.code);
        self.ensure_code_free(&code, None).await?;

        let now = Utc::now();
        let model = CouponActiveModel {
            id: Set(Uuid::new_v4()),
            code: Set(code),
            description: Set(input.description),
            discount_type: Set(input.discount_type),
            discount_value: Set(input.discount_value),
            min_order_amount: Set(input.min_order_amount),
            max_discount_amount: Set(input.max_discount_amount),
            usage_limit: Set(input.usage_limit),
            used_count: Set(0),
            per_user_limit: Set(input.per_user_limit),
            start_date: Set(input.start_date),
            end_date: Set(input.end_date),
            applicable_categories: Set(input.applicable_categories.map(CategoryList)),
            is_active: Set(input.is_active),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(db)
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to create coupon");
            ServiceError::DatabaseError(e)
        })?;

        info!(coupon_id = %model.id, "Coupon created");
        Ok(model)
    }

    /// Replaces a coupon's definition. The used count is left untouched.
    #[instrument(skip(self, input), fields(coupon_id = %id))]
    pub async fn update_coupon(&self, id: Uuid, input: CouponInput) -> Result<CouponModel, ServiceError> {
        input.validate()?;
        let db = &*self.db_pool;
        let existing = self.get_coupon(id).await?;
        let code = normalize_code(&input.code);
        self.ensure_code_free(&code, Some(id)).await?;

        let mut model: CouponActiveModel = existing.into();
        model.code = Set(code);
        model.description = Set(input.description);
        model.discount_type = Set(input.discount_type);
        model.discount_value = Set(input.discount_value);
        model.min_order_amount = Set(input.min_order_amount);
        model.max_discount_amount = Set(input.max_discount_amount);
        model.usage_limit = Set(input.usage_limit);
        model.per_user_limit = Set(input.per_user_limit);
        model.start_date = Set(input.start_date);
        model.end_date = Set(input.end_date);
        model.applicable_categories = Set(input.applicable_categories.map(CategoryList));
        model.is_active = Set(input.is_active);
        model.updated_at = Set(Utc::now());

        let updated = model.update(db).await.map_err(|e| {
            error!(error = %e, "Failed to update coupon");
            ServiceError::DatabaseError(e)
        })?;
        info!("Coupon updated");
        Ok(updated)
    }

    pub async fn get_coupon(&self, id: Uuid) -> Result<CouponModel, ServiceError> {
        let db = &*self.db_pool;
        CouponEntity::find_by_id(id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Coupon {} not found", id)))
    }

    /// Lists coupons newest first. `page` is 1-based.
    pub async fn list_coupons(
        &self,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<CouponModel>, u64), ServiceError> {
        let db = &*self.db_pool;
        let paginator = CouponEntity::find()
            .order_by_desc(coupon::Column::CreatedAt)
            .paginate(db, per_page.max(1));
        let total = paginator.num_items().await?;
        let coupons = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok((coupons, total))
    }

    /// Deletes a coupon together with its redemption history.
    #[instrument(skip(self), fields(coupon_id = %id))]
    pub async fn delete_coupon(&self, id: Uuid) -> Result<(), ServiceError> {
        let db = &*self.db_pool;
        let txn = db.begin().await?;

        let removed_usage = CouponUsageEntity::delete_many()
            .filter(coupon_usage::Column::CouponId.eq(id))
            .exec(&txn)
            .await?;
        let removed = CouponEntity::delete_by_id(id).exec(&txn).await?;
        if removed.rows_affected == 0 {
            txn.rollback().await?;
            return Err(ServiceError::NotFound(format!("Coupon {} not found", id)));
        }

        txn.commit().await?;
        info!(usage_rows = removed_usage.rows_affected, "Coupon deleted");
        Ok(())
    }

    /// Redemption history of a coupon, most recent first.
    pub async fn list_usage(&self, coupon_id: Uuid) -> Result<Vec<CouponUsageModel>, ServiceError> {
        self.get_coupon(coupon_id).await?;
        let db = &*self.db_pool;
        let usage = CouponUsageEntity::find()
            .filter(coupon_usage::Column::CouponId.eq(coupon_id))
            .order_by_desc(coupon_usage::Column::UsedAt)
            .all(db)
            .await?;
        Ok(usage)
    }

    async fn ensure_code_free(&self, code: &str, except: Option<Uuid>) -> Result<(), ServiceError> {
        let db = &*self.db_pool;
        let mut query = CouponEntity::find()
            .filter(Expr::expr(Func::upper(Expr::col(coupon::Column::Code))).eq(code.to_string()));
        if let Some(id) = except {
            query = query.filter(coupon::Column::Id.ne(id));
        }
        if query.one(db).await?.is_some() {
            return Err(ServiceError::Conflict(format!(
                "Coupon code {} already exists",
                code
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use chrono::Duration;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    fn coupon(discount_type: DiscountType, value: Decimal) -> CouponModel {
        let now = Utc::now();
        CouponModel {
            id: Uuid::new_v4(),
            code: "SAVE10".to_string(),
            description: None,
            discount_type,
            discount_value: value,
            min_order_amount: None,
            max_discount_amount: None,
            usage_limit: None,
            used_count: 0,
            per_user_limit: None,
            start_date: None,
            end_date: None,
            applicable_categories: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[rstest]
    #[case(dec!(1000), dec!(10), None, dec!(100))]
    #[case(dec!(999.99), dec!(10), None, dec!(100.00))]
    #[case(dec!(1000), dec!(20), Some(dec!(150)), dec!(150))]
    #[case(dec!(500), dec!(20), Some(dec!(150)), dec!(100))]
    #[case(dec!(0.25), dec!(10), None, dec!(0.03))]
    fn percentage_discount(
        #[case] subtotal: Decimal,
        #[case] percent: Decimal,
        #[case] cap: Option<Decimal>,
        #[case] expected: Decimal,
    ) {
        let mut c = coupon(DiscountType::Percentage, percent);
        c.max_discount_amount = cap;
        assert_eq!(compute_discount(&c, subtotal).unwrap(), expected);
    }

    #[test]
    fn fixed_discount_ignores_cap_and_subtotal() {
        let mut c = coupon(DiscountType::Fixed, dec!(200));
        c.max_discount_amount = Some(dec!(50));
        assert_eq!(compute_discount(&c, dec!(100)).unwrap(), dec!(200));
    }

    #[test]
    fn oversized_subtotal_is_a_validation_error() {
        let c = coupon(DiscountType::Percentage, dec!(50));
        assert_matches!(
            compute_discount(&c, Decimal::MAX),
            Err(ServiceError::ValidationError(_))
        );
        let fixed = coupon(DiscountType::Fixed, dec!(50));
        assert_eq!(compute_discount(&fixed, Decimal::MAX).unwrap(), dec!(50));
    }

    #[test]
    fn rejects_outside_date_window() {
        let now = Utc::now();
        let mut c = coupon(DiscountType::Fixed, dec!(50));
        c.start_date = Some(now + Duration::days(1));
        assert_eq!(
            check_eligibility(&c, dec!(100), now),
            Err(CouponRejection::NotStarted)
        );

        c.start_date = None;
        c.end_date = Some(now - Duration::seconds(1));
        assert_eq!(
            check_eligibility(&c, dec!(100), now),
            Err(CouponRejection::Expired)
        );
    }

    #[test]
    fn window_bounds_are_inclusive() {
        let now = Utc::now();
        let mut c = coupon(DiscountType::Fixed, dec!(50));
        c.start_date = Some(now);
        c.end_date = Some(now);
        assert_eq!(check_eligibility(&c, dec!(100), now), Ok(()));
    }

    #[test]
    fn minimum_order_amount_is_inclusive() {
        let mut c = coupon(DiscountType::Fixed, dec!(50));
        c.min_order_amount = Some(dec!(500));
        let now = Utc::now();
        assert_eq!(
            check_eligibility(&c, dec!(499.99), now),
            Err(CouponRejection::BelowMinimum(dec!(500)))
        );
        assert_eq!(check_eligibility(&c, dec!(500), now), Ok(()));
    }

    #[test]
    fn usage_limit_blocks_once_reached() {
        let mut c = coupon(DiscountType::Fixed, dec!(50));
        c.usage_limit = Some(2);
        c.used_count = 1;
        assert_eq!(check_eligibility(&c, dec!(100), Utc::now()), Ok(()));
        c.used_count = 2;
        assert_eq!(
            check_eligibility(&c, dec!(100), Utc::now()),
            Err(CouponRejection::UsageLimitReached)
        );
    }

    #[test]
    fn per_user_limit_reports_prior_uses() {
        let mut c = coupon(DiscountType::Fixed, dec!(50));
        assert_eq!(check_per_user_limit(&c, 10), Ok(()));
        c.per_user_limit = Some(1);
        assert_eq!(check_per_user_limit(&c, 0), Ok(()));
        let err = check_per_user_limit(&c, 1).unwrap_err();
        assert_eq!(err.to_string(), "You have already used this coupon 1 time(s)");
    }

    #[test]
    fn category_restriction_needs_overlap() {
        let mut c = coupon(DiscountType::Fixed, dec!(50));
        c.applicable_categories = Some(CategoryList(vec!["mugs".into(), "cards".into()]));
        assert_eq!(check_categories(&c, &["cards".to_string()]), Ok(()));
        assert_eq!(
            check_categories(&c, &["toys".to_string()]),
            Err(CouponRejection::CategoryMismatch)
        );
        assert_eq!(check_categories(&c, &[]), Ok(()));
    }

    #[test]
    fn empty_category_list_is_unrestricted() {
        let mut c = coupon(DiscountType::Fixed, dec!(50));
        c.applicable_categories = Some(CategoryList(vec![]));
        assert_eq!(check_categories(&c, &["toys".to_string()]), Ok(()));
    }

    #[test]
    fn rejection_status_codes() {
        assert_eq!(CouponRejection::UnknownCode.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(CouponRejection::MissingCode.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            CouponRejection::CategoryMismatch.status_code(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn coupon_input_rules() {
        let mut input = CouponInput {
            code: "WELCOME".into(),
            description: None,
            discount_type: DiscountType::Percentage,
            discount_value: dec!(15),
            min_order_amount: None,
            max_discount_amount: None,
            usage_limit: None,
            per_user_limit: None,
            start_date: None,
            end_date: None,
            applicable_categories: None,
            is_active: true,
        };
        assert!(input.validate().is_ok());

        input.discount_value = dec!(150);
        assert!(input.validate().is_err());

        input.discount_value = dec!(12.5);
        assert!(input.validate().is_err());

        input.discount_type = DiscountType::Fixed;
        assert!(input.validate().is_ok());

        input.end_date = Some(Utc::now());
        input.start_date = Some(Utc::now() + Duration::days(1));
        assert!(input.validate().is_err());
    }
}
