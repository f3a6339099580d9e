pub mod common;
pub mod coupons;
pub mod orders;
pub mod payments;

use crate::{
    config::AppConfig,
    db::DbPool,
    errors::ServiceError,
    services::{
        coupons::CouponService,
        orders::OrderService,
        payments::{PaymentService, SignatureVerifier},
    },
};
use std::sync::Arc;

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub coupons: Arc<CouponService>,
    pub orders: Arc<OrderService>,
    pub payments: Arc<PaymentService>,
}

impl AppServices {
    /// Wires every service onto the shared connection pool.
    pub fn new(db_pool: Arc<DbPool>, config: &AppConfig) -> Result<Self, ServiceError> {
        let coupons = Arc::new(CouponService::new(db_pool.clone()));
        let orders = Arc::new(OrderService::new(
            db_pool,
            coupons.clone(),
            config.cod_charge,
        ));
        let verifier = SignatureVerifier::new(&config.payment_gateway_secret)?;
        let payments = Arc::new(PaymentService::new(verifier, orders.clone()));

        Ok(Self {
            coupons,
            orders,
            payments,
        })
    }
}
