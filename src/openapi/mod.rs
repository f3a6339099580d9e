use utoipa::{
    openapi::security::{ApiKey, ApiKeyValue, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Gift Shop API",
        version = "1.0.0",
        description = r#"
# Gift Shop Storefront API

Checkout backend for the gift shop storefront.

## Features

- **Coupons**: validate discount codes against a cart and record redemptions
- **Cash on delivery**: place COD orders directly
- **Online payments**: verify gateway signatures and record paid orders
- **Administration**: manage coupons and move orders through fulfilment

## Authentication

Storefront endpoints are public. Admin endpoints under `/api/v1/admin` require
the shared admin key:

```
X-Admin-Key: <admin key>
```

## Error Handling

Coupon rejections answer with `{"valid": false, "message": "..."}`. Other
errors use a common body:

```json
{
  "error": "Bad Request",
  "message": "Validation error: customer_name: must not be blank",
  "request_id": "2f1c...",
  "timestamp": "2024-10-20T00:00:00Z"
}
```

## Pagination

Admin list endpoints accept `page` (default 1) and `per_page` (default 20, max 100).
        "#,
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development")
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "coupons", description = "Coupon validation and redemption"),
        (name = "orders", description = "Checkout order placement"),
        (name = "payments", description = "Online payment verification"),
        (name = "admin", description = "Coupon and order administration"),
        (name = "health", description = "Health check endpoints")
    ),
    paths(
        // Storefront
        crate::handlers::coupons::validate_coupon,
        crate::handlers::coupons::track_usage,
        crate::handlers::orders::place_cod_order,
        crate::handlers::payments::verify_payment,

        // Admin
        crate::handlers::coupons::list_coupons,
        crate::handlers::coupons::create_coupon,
        crate::handlers::coupons::get_coupon,
        crate::handlers::coupons::update_coupon,
        crate::handlers::coupons::delete_coupon,
        crate::handlers::coupons::list_coupon_usage,
        crate::handlers::orders::list_orders,
        crate::handlers::orders::get_order,
        crate::handlers::orders::update_order_status,

        // Health
        crate::health_check,
        crate::api_status,
    ),
    components(
        schemas(
            crate::entities::coupon::DiscountType,
            crate::entities::order::OrderStatus,
            crate::entities::order::PaymentMethod,
            crate::entities::order::OrderLine,
            crate::errors::ErrorResponse,
            crate::errors::CouponRejectionResponse
        )
    )
)]
pub struct ApiDocV1;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "AdminKey",
                SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::new("X-Admin-Key"))),
            );
        }
    }
}

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDocV1::openapi())
        .config(utoipa_swagger_ui::Config::from("/api-docs/openapi.json").try_it_out_enabled(true))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_document_lists_checkout_and_admin_paths() {
        let openapi = ApiDocV1::openapi();
        let json = serde_json::to_string_pretty(&openapi).unwrap();
        assert!(json.contains("Gift Shop API"));
        assert!(json.contains("/api/v1/coupons/validate"));
        assert!(json.contains("/api/v1/payment/verify-payment"));
        assert!(json.contains("/api/v1/admin/orders/{id}/status"));
        assert!(json.contains("AdminKey"));
    }
}
