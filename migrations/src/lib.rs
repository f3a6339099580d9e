pub use sea_orm_migration::prelude::*;

mod m20241020_000001_create_coupons_table;
mod m20241020_000002_create_orders_table;
mod m20241020_000003_create_coupon_usage_table;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20241020_000001_create_coupons_table::Migration),
            Box::new(m20241020_000002_create_orders_table::Migration),
            Box::new(m20241020_000003_create_coupon_usage_table::Migration),
        ]
    }
}
