use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Orders::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Orders::Id).uuid().primary_key().not_null())
                    .col(
                        ColumnDef::new(Orders::OrderNumber)
                            .string_len(32)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Orders::Items).json().not_null())
                    .col(ColumnDef::new(Orders::Subtotal).decimal_len(12, 2).not_null())
                    .col(
                        ColumnDef::new(Orders::ShippingCharge)
                            .decimal_len(12, 2)
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Orders::CodCharge)
                            .decimal_len(12, 2)
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(Orders::CouponCode).string_len(64).null())
                    .col(
                        ColumnDef::new(Orders::CouponDiscount)
                            .decimal_len(12, 2)
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Orders::TotalAmount)
                            .decimal_len(12, 2)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Orders::PaymentMethod).string_len(16).not_null())
                    .col(ColumnDef::new(Orders::CustomerName).string().not_null())
                    .col(ColumnDef::new(Orders::CustomerEmail).string().not_null())
                    .col(ColumnDef::new(Orders::CustomerPhone).string_len(32).not_null())
                    .col(ColumnDef::new(Orders::ShippingAddress).text().null())
                    .col(ColumnDef::new(Orders::City).string().null())
                    .col(ColumnDef::new(Orders::State).string().null())
                    .col(ColumnDef::new(Orders::PostalCode).string_len(16).null())
                    .col(
                        ColumnDef::new(Orders::Status)
                            .string_len(16)
                            .not_null()
                            .default("pending"),
                    )
                    .col(ColumnDef::new(Orders::TrackingNumber).string().null())
                    .col(ColumnDef::new(Orders::GatewayOrderId).string().null())
                    .col(ColumnDef::new(Orders::GatewayPaymentId).string().null())
                    .col(
                        ColumnDef::new(Orders::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Orders::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_orders_status")
                    .table(Orders::Table)
                    .col(Orders::Status)
                    .if_not_exists()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Orders::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Orders {
    Table,
    Id,
    OrderNumber,
    Items,
    Subtotal,
    ShippingCharge,
    CodCharge,
    CouponCode,
    CouponDiscount,
    TotalAmount,
    PaymentMethod,
    CustomerName,
    CustomerEmail,
    CustomerPhone,
    ShippingAddress,
    City,
    State,
    PostalCode,
    Status,
    TrackingNumber,
    GatewayOrderId,
    GatewayPaymentId,
    CreatedAt,
    UpdatedAt,
}
