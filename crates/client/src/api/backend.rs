//! Backend service seams.
//!
//! The engine's services are generic over these traits so the coordination
//! logic can be exercised against in-memory backends in tests. Production
//! wiring uses the `reqwest`-backed clients in this module's siblings.

use std::future::Future;

use quickbite_core::{
    DeliveryId, DriverId, GeoPoint, MenuItemId, OrderId, OrderStatus, PaymentId, RestaurantId,
    UserId,
};

use super::ApiError;
use super::delivery::AssignOutcome;
use super::types::{
    CartDto, CreatedOrder, DeliveryRecordDto, DeliveryUpdate, DraftOrder, DriverDto, GatewaySession,
    MenuItemDto, NewCartLine, OrderDto, PaymentFilter, PaymentRecordDto, PaymentRequest,
};

/// Cart-by-user resource and its items sub-resource.
pub trait CartBackend: Send + Sync {
    /// Fetch the user's cart; `None` if one has not been created yet.
    fn get_cart(
        &self,
        user: UserId,
    ) -> impl Future<Output = Result<Option<CartDto>, ApiError>> + Send;

    /// Append or merge a line; creates the cart lazily server-side.
    fn add_item(
        &self,
        user: UserId,
        line: &NewCartLine,
    ) -> impl Future<Output = Result<(), ApiError>> + Send;

    fn update_item(
        &self,
        user: UserId,
        menu_item: MenuItemId,
        quantity: u32,
    ) -> impl Future<Output = Result<(), ApiError>> + Send;

    fn remove_item(
        &self,
        user: UserId,
        menu_item: MenuItemId,
    ) -> impl Future<Output = Result<(), ApiError>> + Send;

    fn clear(&self, user: UserId) -> impl Future<Output = Result<(), ApiError>> + Send;
}

/// Menu catalog reads.
pub trait CatalogBackend: Send + Sync {
    fn menu_item(
        &self,
        item: MenuItemId,
    ) -> impl Future<Output = Result<MenuItemDto, ApiError>> + Send;

    fn restaurant_menu(
        &self,
        restaurant: RestaurantId,
    ) -> impl Future<Output = Result<Vec<MenuItemDto>, ApiError>> + Send;
}

/// Order service operations.
pub trait OrderBackend: Send + Sync {
    fn create(
        &self,
        draft: &DraftOrder,
    ) -> impl Future<Output = Result<CreatedOrder, ApiError>> + Send;

    fn get(&self, order: OrderId) -> impl Future<Output = Result<OrderDto, ApiError>> + Send;

    fn by_user(&self, user: UserId)
    -> impl Future<Output = Result<Vec<OrderDto>, ApiError>> + Send;

    fn by_restaurant(
        &self,
        restaurant: RestaurantId,
    ) -> impl Future<Output = Result<Vec<OrderDto>, ApiError>> + Send;

    fn update_status(
        &self,
        order: OrderId,
        status: OrderStatus,
    ) -> impl Future<Output = Result<(), ApiError>> + Send;

    fn cancel(&self, order: OrderId) -> impl Future<Output = Result<(), ApiError>> + Send;

    fn delete(&self, order: OrderId) -> impl Future<Output = Result<(), ApiError>> + Send;
}

/// Delivery service operations.
pub trait DeliveryBackend: Send + Sync {
    /// Attempt to bind a driver to an order at a geo-point.
    ///
    /// Idempotent per order: repeated calls re-attempt matching and never
    /// create a duplicate delivery record.
    fn assign(
        &self,
        order: OrderId,
        customer_location: GeoPoint,
    ) -> impl Future<Output = Result<AssignOutcome, ApiError>> + Send;

    fn by_order(
        &self,
        order: OrderId,
    ) -> impl Future<Output = Result<DeliveryRecordDto, ApiError>> + Send;

    /// Driver-side status/location update. The customer engine never calls
    /// this outside tests.
    fn update(
        &self,
        delivery: DeliveryId,
        update: &DeliveryUpdate,
    ) -> impl Future<Output = Result<(), ApiError>> + Send;
}

/// Driver profile reads.
pub trait DriverBackend: Send + Sync {
    fn driver(&self, driver: DriverId)
    -> impl Future<Output = Result<DriverDto, ApiError>> + Send;
}

/// Payment service operations.
pub trait PaymentBackend: Send + Sync {
    fn process(
        &self,
        request: &PaymentRequest,
    ) -> impl Future<Output = Result<GatewaySession, ApiError>> + Send;

    fn list(
        &self,
        filter: &PaymentFilter,
    ) -> impl Future<Output = Result<Vec<PaymentRecordDto>, ApiError>> + Send;

    fn refund(&self, payment: PaymentId) -> impl Future<Output = Result<(), ApiError>> + Send;
}
