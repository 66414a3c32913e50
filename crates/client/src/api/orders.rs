//! Order service client.

use tracing::instrument;

use quickbite_core::{OrderId, OrderStatus, RestaurantId, UserId};

use super::backend::OrderBackend;
use super::types::{CreatedOrder, DraftOrder, OrderDto, StatusUpdate};
use super::{ApiError, RestClient};

/// Client for the order service.
#[derive(Clone)]
pub struct OrderClient {
    rest: RestClient,
}

impl OrderClient {
    #[must_use]
    pub const fn new(rest: RestClient) -> Self {
        Self { rest }
    }
}

impl OrderBackend for OrderClient {
    #[instrument(skip(self, draft), fields(user = %draft.user_id, restaurant = %draft.restaurant_id))]
    async fn create(&self, draft: &DraftOrder) -> Result<CreatedOrder, ApiError> {
        self.rest.post_json("orders", draft).await
    }

    #[instrument(skip(self), fields(order = %order))]
    async fn get(&self, order: OrderId) -> Result<OrderDto, ApiError> {
        self.rest.get_json(&format!("orders/{order}")).await
    }

    #[instrument(skip(self), fields(user = %user))]
    async fn by_user(&self, user: UserId) -> Result<Vec<OrderDto>, ApiError> {
        self.rest.get_json(&format!("orders/user/{user}")).await
    }

    #[instrument(skip(self), fields(restaurant = %restaurant))]
    async fn by_restaurant(&self, restaurant: RestaurantId) -> Result<Vec<OrderDto>, ApiError> {
        self.rest
            .get_json(&format!("orders/restaurant/{restaurant}"))
            .await
    }

    #[instrument(skip(self), fields(order = %order, status = %status))]
    async fn update_status(&self, order: OrderId, status: OrderStatus) -> Result<(), ApiError> {
        self.rest
            .patch_unit(&format!("orders/{order}/status"), &StatusUpdate { status })
            .await
    }

    #[instrument(skip(self), fields(order = %order))]
    async fn cancel(&self, order: OrderId) -> Result<(), ApiError> {
        self.rest.post_unit(&format!("orders/{order}/cancel")).await
    }

    #[instrument(skip(self), fields(order = %order))]
    async fn delete(&self, order: OrderId) -> Result<(), ApiError> {
        self.rest.delete_unit(&format!("orders/{order}")).await
    }
}
