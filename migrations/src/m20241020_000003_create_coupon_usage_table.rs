use sea_orm_migration::prelude::*;

use crate::m20241020_000001_create_coupons_table::Coupons;
use crate::m20241020_000002_create_orders_table::Orders;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(CouponUsage::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CouponUsage::Id)
                            .uuid()
                            .primary_key()
                            .not_null(),
                    )
                    .col(ColumnDef::new(CouponUsage::CouponId).uuid().not_null())
                    .col(ColumnDef::new(CouponUsage::OrderId).uuid().not_null())
                    .col(ColumnDef::new(CouponUsage::CustomerEmail).string().not_null())
                    .col(
                        ColumnDef::new(CouponUsage::DiscountAmount)
                            .decimal_len(12, 2)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CouponUsage::UsedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    // No cascade: usage rows are removed explicitly before their coupon.
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_coupon_usage_coupon_id")
                            .from(CouponUsage::Table, CouponUsage::CouponId)
                            .to(Coupons::Table, Coupons::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_coupon_usage_order_id")
                            .from(CouponUsage::Table, CouponUsage::OrderId)
                            .to(Orders::Table, Orders::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_coupon_usage_coupon_email")
                    .table(CouponUsage::Table)
                    .col(CouponUsage::CouponId)
                    .col(CouponUsage::CustomerEmail)
                    .if_not_exists()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(CouponUsage::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum CouponUsage {
    Table,
    Id,
    CouponId,
    OrderId,
    CustomerEmail,
    DiscountAmount,
    UsedAt,
}
