//! Driver assignment retry protocol.
//!
//! Binds a created order to a delivery agent given a geo-point. "No driver
//! in range" is a recoverable business condition, not an error: the caller
//! parks a [`PendingAssignment`] and retries with a new point when the
//! customer's location changes. The order itself is never re-created; the
//! backend keeps assignment idempotent per order id.

use quickbite_core::{GeoPoint, OrderId};
use tokio::sync::Mutex;
use tracing::{info, instrument};

use crate::api::backend::DeliveryBackend;
use crate::api::{ApiError, AssignOutcome};

/// Ephemeral client-local record of an order awaiting a driver.
///
/// Exists only between "order created" and "driver bound"; destroyed when
/// assignment succeeds or the user abandons checkout.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PendingAssignment {
    pub order_id: OrderId,
    pub last_attempted_location: GeoPoint,
}

/// Errors from assignment attempts.
#[derive(Debug, thiserror::Error)]
pub enum AssignmentError {
    /// The backend no longer recognizes the order; retrying is pointless.
    #[error("order {0} is no longer valid for driver assignment")]
    InvalidOrder(OrderId),

    /// Network or server failure; surfaced, not auto-retried.
    #[error(transparent)]
    Backend(ApiError),
}

/// The retry protocol around the delivery service's assign call.
pub struct AssignmentProtocol<D> {
    delivery: D,
    // One assignment attempt in flight at a time; a location update
    // arriving mid-attempt queues behind the lock rather than overlapping.
    in_flight: Mutex<()>,
}

impl<D: DeliveryBackend> AssignmentProtocol<D> {
    pub fn new(delivery: D) -> Self {
        Self {
            delivery,
            in_flight: Mutex::new(()),
        }
    }

    #[cfg(test)]
    pub(crate) const fn backend(&self) -> &D {
        &self.delivery
    }

    /// Attempt to bind a driver to `order` at `location`.
    ///
    /// Safe to call repeatedly for the same order with different points;
    /// no duplicate order or delivery record results.
    ///
    /// # Errors
    ///
    /// [`AssignmentError::InvalidOrder`] when the backend rejects the order
    /// id itself; [`AssignmentError::Backend`] for transport and server
    /// failures. "No drivers" is an `Ok` outcome, not an error.
    #[instrument(skip(self), fields(order = %order, location = %location))]
    pub async fn assign(
        &self,
        order: OrderId,
        location: GeoPoint,
    ) -> Result<AssignOutcome, AssignmentError> {
        let _guard = self.in_flight.lock().await;

        match self.delivery.assign(order, location).await {
            Ok(AssignOutcome::Assigned(record)) => {
                info!(order = %order, driver = %record.driver_id, "Driver assigned");
                Ok(AssignOutcome::Assigned(record))
            }
            Ok(AssignOutcome::NoDriversAvailable) => {
                info!(order = %order, "No drivers in range; retry-eligible");
                Ok(AssignOutcome::NoDriversAvailable)
            }
            Err(e) if e.is_client_rejection() => Err(AssignmentError::InvalidOrder(order)),
            Err(e) => Err(AssignmentError::Backend(e)),
        }
    }
}
