use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use sea_orm::FromJsonQueryResult;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
pub enum DiscountType {
    #[sea_orm(string_value = "percentage")]
    Percentage,
    #[sea_orm(string_value = "fixed")]
    Fixed,
}

/// Category names a coupon is restricted to. Empty means every category.
#[derive(
    Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, FromJsonQueryResult, ToSchema,
)]
pub struct CategoryList(pub Vec<String>);

impl CategoryList {
    pub fn is_unrestricted(&self) -> bool {
        self.0.iter().all(|c| c.trim().is_empty())
    }

    pub fn overlaps(&self, categories: &[String]) -> bool {
        self.0.iter().any(|allowed| categories.iter().any(|c| c == allowed))
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "coupons")]
#[schema(as = Coupon)]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub code: String,
    pub description: Option<String>,
    pub discount_type: DiscountType,
    pub discount_value: Decimal,
    pub min_order_amount: Option<Decimal>,
    /// Only honoured for percentage coupons.
    pub max_discount_amount: Option<Decimal>,
    pub usage_limit: Option<i32>,
    pub used_count: i32,
    pub per_user_limit: Option<i32>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    #[sea_orm(column_type = "Json", nullable)]
    pub applicable_categories: Option<CategoryList>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::coupon_usage::Entity")]
    CouponUsage,
}

impl Related<super::coupon_usage::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CouponUsage.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
