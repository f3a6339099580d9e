pub mod coupon;
pub mod coupon_usage;
pub mod order;
