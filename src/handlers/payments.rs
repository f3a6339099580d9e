use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    entities::order,
    errors::ServiceError,
    handlers::common::AppJson,
    services::payments::{PaymentOutcome, VerifyPayment},
    AppState,
};

pub const SAVE_FAILED_MESSAGE: &str = "payment verified but order save failed";
pub const INVALID_SIGNATURE_MESSAGE: &str = "Invalid payment signature";

/// Body of a verify-payment response. Which fields are present depends on
/// the outcome.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct VerifyPaymentResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<order::Model>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gateway_order_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gateway_payment_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl IntoResponse for PaymentOutcome {
    fn into_response(self) -> Response {
        let empty = VerifyPaymentResponse {
            success: true,
            order: None,
            message: None,
            gateway_order_id: None,
            gateway_payment_id: None,
            error: None,
        };
        match self {
            PaymentOutcome::Recorded(order) => Json(VerifyPaymentResponse {
                order: Some(*order),
                ..empty
            })
            .into_response(),
            PaymentOutcome::SaveFailed {
                gateway_order_id,
                gateway_payment_id,
                error,
            } => Json(VerifyPaymentResponse {
                message: Some(SAVE_FAILED_MESSAGE.to_string()),
                gateway_order_id: Some(gateway_order_id),
                gateway_payment_id: Some(gateway_payment_id),
                error: Some(error),
                ..empty
            })
            .into_response(),
            PaymentOutcome::Rejected => (
                StatusCode::BAD_REQUEST,
                Json(VerifyPaymentResponse {
                    success: false,
                    error: Some(INVALID_SIGNATURE_MESSAGE.to_string()),
                    ..empty
                }),
            )
                .into_response(),
        }
    }
}

#[utoipa::path(
    post,
    path = "/api/v1/payment/verify-payment",
    summary = "Verify online payment and record the order",
    description = "Checks the gateway signature over `order_id|payment_id`. A verified payment whose order cannot be stored still answers 200 with success=true and a save-failed message.",
    request_body = VerifyPayment,
    responses(
        (status = 200, description = "Payment verified; order recorded or save failed", body = VerifyPaymentResponse),
        (status = 400, description = "Invalid payment signature or malformed body", body = VerifyPaymentResponse),
    ),
    tag = "payments"
)]
pub async fn verify_payment(
    State(state): State<AppState>,
    AppJson(request): AppJson<VerifyPayment>,
) -> Result<Response, ServiceError> {
    let outcome = state.services.payments.verify_and_record(request).await;
    Ok(outcome.into_response())
}
