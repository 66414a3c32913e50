//! Delivery service client.
//!
//! The one place in the API layer where a 404 is decoded as a business
//! signal: `POST /deliveries/assign` answers 404 when no driver is in
//! range, and that must stay distinct from generic failure because the
//! whole checkout retry flow hangs off it.

use tracing::instrument;

use quickbite_core::{DeliveryId, GeoPoint, OrderId};

use super::backend::DeliveryBackend;
use super::types::{AssignRequest, DeliveryRecordDto, DeliveryUpdate};
use super::{ApiError, RestClient};

/// Result of a driver assignment attempt.
#[derive(Debug, Clone)]
pub enum AssignOutcome {
    /// A driver was bound to the order.
    Assigned(DeliveryRecordDto),
    /// No driver in range of the given point; retry-eligible with a new
    /// geo-point. The order is untouched.
    NoDriversAvailable,
}

/// Client for the delivery service.
#[derive(Clone)]
pub struct DeliveryClient {
    rest: RestClient,
}

impl DeliveryClient {
    #[must_use]
    pub const fn new(rest: RestClient) -> Self {
        Self { rest }
    }
}

impl DeliveryBackend for DeliveryClient {
    #[instrument(skip(self), fields(order = %order, location = %customer_location))]
    async fn assign(
        &self,
        order: OrderId,
        customer_location: GeoPoint,
    ) -> Result<AssignOutcome, ApiError> {
        let request = AssignRequest {
            order_id: order,
            customer_location,
        };
        let record: Option<DeliveryRecordDto> =
            self.rest.post_json_opt("deliveries/assign", &request).await?;
        Ok(record.map_or(AssignOutcome::NoDriversAvailable, AssignOutcome::Assigned))
    }

    #[instrument(skip(self), fields(order = %order))]
    async fn by_order(&self, order: OrderId) -> Result<DeliveryRecordDto, ApiError> {
        self.rest
            .get_json(&format!("deliveries/order/{order}"))
            .await
    }

    #[instrument(skip(self, update), fields(delivery = %delivery))]
    async fn update(&self, delivery: DeliveryId, update: &DeliveryUpdate) -> Result<(), ApiError> {
        self.rest
            .put_unit(&format!("deliveries/{delivery}"), update)
            .await
    }
}
