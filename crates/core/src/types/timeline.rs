//! Delivery display timeline.
//!
//! A five-stage progress view derived from the order status on every
//! render. This is presentation state only - the client never drives
//! transitions here; the order service owns the real lifecycle.

use serde::{Deserialize, Serialize};

use super::status::OrderStatus;

/// One milestone in the delivery progress display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TimelineStage {
    Placed,
    Preparing,
    ReadyForPickup,
    OnTheWay,
    Delivered,
}

impl TimelineStage {
    /// All stages in display order.
    pub const ALL: [Self; 5] = [
        Self::Placed,
        Self::Preparing,
        Self::ReadyForPickup,
        Self::OnTheWay,
        Self::Delivered,
    ];
}

/// The display timeline for one order.
///
/// `current` is `None` for cancelled orders, which show no progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timeline {
    pub current: Option<TimelineStage>,
}

impl Timeline {
    /// Derive the timeline from an order status.
    #[must_use]
    pub const fn from_status(status: OrderStatus) -> Self {
        let current = match status {
            OrderStatus::Pending | OrderStatus::Confirmed => Some(TimelineStage::Placed),
            OrderStatus::Preparing => Some(TimelineStage::Preparing),
            OrderStatus::ReadyForPickup => Some(TimelineStage::ReadyForPickup),
            OrderStatus::OutForDelivery => Some(TimelineStage::OnTheWay),
            OrderStatus::Delivered => Some(TimelineStage::Delivered),
            OrderStatus::Cancelled => None,
        };
        Self { current }
    }

    /// Whether the given stage has been reached.
    #[must_use]
    pub fn reached(&self, stage: TimelineStage) -> bool {
        self.current.is_some_and(|current| current >= stage)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_maps_to_stage() {
        assert_eq!(
            Timeline::from_status(OrderStatus::Pending).current,
            Some(TimelineStage::Placed)
        );
        assert_eq!(
            Timeline::from_status(OrderStatus::Confirmed).current,
            Some(TimelineStage::Placed)
        );
        assert_eq!(
            Timeline::from_status(OrderStatus::OutForDelivery).current,
            Some(TimelineStage::OnTheWay)
        );
        assert_eq!(
            Timeline::from_status(OrderStatus::Delivered).current,
            Some(TimelineStage::Delivered)
        );
        assert_eq!(Timeline::from_status(OrderStatus::Cancelled).current, None);
    }

    #[test]
    fn test_reached_is_cumulative() {
        let timeline = Timeline::from_status(OrderStatus::OutForDelivery);
        assert!(timeline.reached(TimelineStage::Placed));
        assert!(timeline.reached(TimelineStage::Preparing));
        assert!(timeline.reached(TimelineStage::OnTheWay));
        assert!(!timeline.reached(TimelineStage::Delivered));
    }

    #[test]
    fn test_cancelled_reaches_nothing() {
        let timeline = Timeline::from_status(OrderStatus::Cancelled);
        for stage in TimelineStage::ALL {
            assert!(!timeline.reached(stage));
        }
    }
}
