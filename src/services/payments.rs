use crate::{
    auth::constant_time_eq,
    entities::order::Model as OrderModel,
    errors::ServiceError,
    services::orders::{GatewayRef, NewOrder, OrderService},
};
use hmac::{Hmac, Mac};
use metrics::counter;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use utoipa::ToSchema;

type HmacSha256 = Hmac<Sha256>;

/// Signs and checks gateway callbacks of the form `order_id|payment_id`.
#[derive(Clone)]
pub struct SignatureVerifier {
    mac: HmacSha256,
}

impl SignatureVerifier {
    pub fn new(secret: &str) -> Result<Self, ServiceError> {
        let mac = HmacSha256::new_from_slice(secret.as_bytes())
            .map_err(|e| ServiceError::InternalError(format!("invalid gateway secret: {}", e)))?;
        Ok(Self { mac })
    }

    /// Lowercase hex HMAC-SHA256 of `order_id|payment_id`.
    pub fn sign(&self, gateway_order_id: &str, gateway_payment_id: &str) -> String {
        let mut mac = self.mac.clone();
        mac.update(gateway_order_id.as_bytes());
        mac.update(b"|");
        mac.update(gateway_payment_id.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    pub fn verify(&self, gateway_order_id: &str, gateway_payment_id: &str, signature: &str) -> bool {
        let expected = self.sign(gateway_order_id, gateway_payment_id);
        constant_time_eq(expected.as_bytes(), signature.as_bytes())
    }
}

/// Gateway callback posted by the storefront after an online payment.
///
/// Every field is optional at the wire level: a missing id or signature
/// fails the signature check, and `order_data` is only parsed once the
/// payment is known to be genuine.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct VerifyPayment {
    #[serde(default)]
    pub gateway_order_id: String,
    #[serde(default)]
    pub gateway_payment_id: String,
    #[serde(default)]
    pub gateway_signature: String,
    #[serde(default)]
    #[schema(value_type = NewOrder)]
    pub order_data: serde_json::Value,
}

#[derive(Debug)]
pub enum PaymentOutcome {
    /// Signature matched and the order was stored as paid.
    Recorded(Box<OrderModel>),
    /// Signature matched but the order could not be stored. The payment
    /// itself still went through.
    SaveFailed {
        gateway_order_id: String,
        gateway_payment_id: String,
        error: String,
    },
    /// Signature did not match; nothing was stored.
    Rejected,
}

#[derive(Clone)]
pub struct PaymentService {
    verifier: SignatureVerifier,
    orders: Arc<OrderService>,
}

impl PaymentService {
    pub fn new(verifier: SignatureVerifier, orders: Arc<OrderService>) -> Self {
        Self { verifier, orders }
    }

    #[instrument(skip(self, request), fields(gateway_order_id = %request.gateway_order_id))]
    pub async fn verify_and_record(&self, request: VerifyPayment) -> PaymentOutcome {
        let VerifyPayment {
            gateway_order_id,
            gateway_payment_id,
            gateway_signature,
            order_data,
        } = request;

        if !self
            .verifier
            .verify(&gateway_order_id, &gateway_payment_id, gateway_signature.trim())
        {
            counter!("giftshop.payment.signature_rejected", 1);
            warn!("Payment signature mismatch");
            return PaymentOutcome::Rejected;
        }

        let gateway = GatewayRef {
            order_id: gateway_order_id.clone(),
            payment_id: gateway_payment_id.clone(),
        };
        let recorded = match serde_json::from_value::<NewOrder>(order_data) {
            Ok(new_order) => self.orders.record_paid_order(new_order, gateway).await,
            Err(e) => Err(ServiceError::ValidationError(format!("order_data: {}", e))),
        };
        match recorded {
            Ok(order) => {
                info!(order_id = %order.id, "Paid order recorded");
                PaymentOutcome::Recorded(Box::new(order))
            }
            Err(e) => {
                counter!("giftshop.payment.save_failed", 1);
                error!(error = %e, gateway_payment_id = %gateway_payment_id, "Payment verified but order save failed");
                PaymentOutcome::SaveFailed {
                    gateway_order_id,
                    gateway_payment_id,
                    error: e.response_message(),
                }
            }
        }
    }
}
