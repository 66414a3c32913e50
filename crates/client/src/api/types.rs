//! Wire types for the backend REST services.
//!
//! Field names follow the backend's camelCase convention. Cart line price
//! and quantity decode leniently: a non-numeric value becomes `None` rather
//! than failing the whole cart fetch, and the cart store excludes such
//! lines from totals with a data-integrity warning.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::de::Deserializer;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use quickbite_core::{
    CartId, DeliveryId, DeliveryStatus, DriverId, GeoPoint, MenuItemId, OrderId, OrderStatus,
    PaymentId, PaymentMethod, RestaurantId, UserId,
};

// =============================================================================
// Lenient numeric decoding
// =============================================================================

fn decimal_from_value(value: &serde_json::Value) -> Option<Decimal> {
    match value {
        serde_json::Value::Number(n) => n.to_string().parse().ok(),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn lenient_decimal<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<Decimal>, D::Error> {
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(decimal_from_value(&value))
}

fn lenient_quantity<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u32>, D::Error> {
    let value = serde_json::Value::deserialize(deserializer)?;
    let quantity = match &value {
        serde_json::Value::Number(n) => n.as_u64().and_then(|q| u32::try_from(q).ok()),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    };
    Ok(quantity)
}

// =============================================================================
// Cart
// =============================================================================

/// A cart as returned by the cart service.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartDto {
    pub cart_id: CartId,
    pub user_id: UserId,
    #[serde(default)]
    pub items: Vec<CartLineDto>,
}

/// One cart line as returned by the cart service.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLineDto {
    pub menu_item_id: MenuItemId,
    pub restaurant_id: RestaurantId,
    pub name: String,
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub unit_price: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient_quantity")]
    pub quantity: Option<u32>,
    #[serde(default)]
    pub image_refs: Vec<String>,
}

/// A line to append to the backend cart.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCartLine {
    pub menu_item_id: MenuItemId,
    pub restaurant_id: RestaurantId,
    pub name: String,
    pub unit_price: Decimal,
    pub quantity: u32,
    pub image_refs: Vec<String>,
}

/// Quantity update for an existing cart line.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuantityUpdate {
    pub quantity: u32,
}

// =============================================================================
// Catalog
// =============================================================================

/// A menu item from the catalog service.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuItemDto {
    pub menu_item_id: MenuItemId,
    pub restaurant_id: RestaurantId,
    pub name: String,
    pub price: Decimal,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image_refs: Vec<String>,
    #[serde(default = "default_available")]
    pub available: bool,
}

const fn default_available() -> bool {
    true
}

// =============================================================================
// Orders
// =============================================================================

/// Delivery address collected at checkout.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub street: String,
    pub city: String,
    pub postal_code: String,
    pub phone: String,
}

impl Address {
    /// Whether every field is present and non-blank.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        ![&self.street, &self.city, &self.postal_code, &self.phone]
            .iter()
            .any(|field| field.trim().is_empty())
    }
}

/// The payload assembled client-side to request order creation.
///
/// Sent exactly once per checkout attempt; only the consequences of
/// creation (assignment, payment) are ever retried.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftOrder {
    pub user_id: UserId,
    pub restaurant_id: RestaurantId,
    pub items: Vec<DraftOrderItem>,
    pub delivery_address: Address,
    pub payment_method: PaymentMethod,
}

/// One line of a draft order.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftOrderItem {
    pub menu_item_id: MenuItemId,
    pub name: String,
    pub unit_price: Decimal,
    pub quantity: u32,
}

/// Response to order creation.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedOrder {
    pub order_id: OrderId,
}

/// An order as read back from the order service.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDto {
    pub order_id: OrderId,
    pub status: OrderStatus,
    pub total_amount: Decimal,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub items: Vec<OrderItemDto>,
}

/// One line of a persisted order.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemDto {
    pub menu_item_id: MenuItemId,
    pub name: String,
    pub unit_price: Decimal,
    pub quantity: u32,
}

/// Explicit status-transition request body.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusUpdate {
    pub status: OrderStatus,
}

// =============================================================================
// Delivery
// =============================================================================

/// Driver assignment request: `POST /deliveries/assign`.
///
/// The backend answers 404 when no driver is in range of
/// `customer_location`; that is a distinct business signal, not an error.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignRequest {
    pub order_id: OrderId,
    pub customer_location: GeoPoint,
}

/// A delivery record owned by the delivery service.
///
/// The client holds a read-mostly cached copy refreshed by polling.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryRecordDto {
    pub delivery_id: DeliveryId,
    pub order_id: OrderId,
    pub driver_id: DriverId,
    pub status: DeliveryStatus,
    pub customer_location: GeoPoint,
    pub driver_location: GeoPoint,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub actual_delivery_time: Option<DateTime<Utc>>,
}

/// Driver-side status/location update: `PUT /deliveries/{id}`.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryUpdate {
    pub status: DeliveryStatus,
    pub driver_location: GeoPoint,
}

// =============================================================================
// Drivers
// =============================================================================

/// Driver profile details.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriverDto {
    pub driver_id: DriverId,
    pub name: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub vehicle: Option<String>,
    #[serde(default)]
    pub rating: Option<f64>,
}

// =============================================================================
// Payments
// =============================================================================

/// Payment processing request.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequest {
    pub order_id: OrderId,
    pub amount: Decimal,
    pub method: PaymentMethod,
}

/// Gateway handoff material returned by the payment service.
///
/// `fields` become hidden inputs of the auto-submitting form; `hash` is the
/// server-computed integrity signature over them. Both are validated by the
/// payment adapter before any handoff is built.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewaySession {
    pub gateway_url: String,
    #[serde(default)]
    pub fields: BTreeMap<String, String>,
    #[serde(default)]
    pub hash: Option<String>,
}

/// Payment record status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentRecordStatus {
    Initiated,
    Succeeded,
    Failed,
    Refunded,
}

/// A settled or in-flight payment.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRecordDto {
    pub payment_id: PaymentId,
    pub order_id: OrderId,
    pub amount: Decimal,
    pub status: PaymentRecordStatus,
    pub transaction_ref: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Query filter for payment listings.
#[derive(Debug, Clone, Copy, Default)]
pub struct PaymentFilter {
    pub user_id: Option<UserId>,
    pub order_id: Option<OrderId>,
    pub status: Option<PaymentRecordStatus>,
}

/// Refund request body.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefundRequest {
    pub payment_id: PaymentId,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cart_line_decodes_numeric_and_string_price() {
        let line: CartLineDto = serde_json::from_str(
            r#"{"menuItemId":1,"restaurantId":2,"name":"Dosa","unitPrice":500,"quantity":2}"#,
        )
        .expect("decode");
        assert_eq!(line.unit_price, Some(Decimal::new(500, 0)));
        assert_eq!(line.quantity, Some(2));

        let line: CartLineDto = serde_json::from_str(
            r#"{"menuItemId":1,"restaurantId":2,"name":"Dosa","unitPrice":"250.50","quantity":"3"}"#,
        )
        .expect("decode");
        assert_eq!(line.unit_price, Some(Decimal::new(25050, 2)));
        assert_eq!(line.quantity, Some(3));
    }

    #[test]
    fn test_cart_line_tolerates_garbage_numbers() {
        let line: CartLineDto = serde_json::from_str(
            r#"{"menuItemId":1,"restaurantId":2,"name":"Dosa","unitPrice":"N/A","quantity":null}"#,
        )
        .expect("decode must not fail");
        assert_eq!(line.unit_price, None);
        assert_eq!(line.quantity, None);
    }

    #[test]
    fn test_address_completeness() {
        let address = Address {
            street: "12 MG Road".into(),
            city: "Bengaluru".into(),
            postal_code: "560001".into(),
            phone: "9900112233".into(),
        };
        assert!(address.is_complete());

        let mut blank_city = address.clone();
        blank_city.city = "   ".into();
        assert!(!blank_city.is_complete());
    }

    #[test]
    fn test_assign_request_wire_shape() {
        let request = AssignRequest {
            order_id: OrderId::new(77),
            customer_location: GeoPoint::new(77.59, 12.97),
        };
        let json = serde_json::to_value(&request).expect("serialize");
        assert_eq!(json["orderId"], 77);
        assert_eq!(json["customerLocation"][0], 77.59);
        assert_eq!(json["customerLocation"][1], 12.97);
    }

    #[test]
    fn test_delivery_record_decodes() {
        let record: DeliveryRecordDto = serde_json::from_str(
            r#"{
                "deliveryId": 5,
                "orderId": 77,
                "driverId": 9,
                "status": "ON_THE_WAY",
                "customerLocation": [77.59, 12.97],
                "driverLocation": [77.60, 12.95],
                "createdAt": "2026-08-27T10:00:00Z",
                "updatedAt": "2026-08-27T10:05:00Z"
            }"#,
        )
        .expect("decode");
        assert_eq!(record.status, DeliveryStatus::OnTheWay);
        assert!(record.actual_delivery_time.is_none());
    }
}
