//! Live delivery tracking feed.
//!
//! Poll-based: each tick re-fetches the order, delivery record, and driver
//! profile, publishes a fresh [`TrackingSnapshot`] on a watch channel, and
//! re-renders the map with customer and driver markers joined by a
//! polyline. Consumers always see the latest snapshot; intermediate frames
//! are not queued. Polling stops on its own once the delivery reaches a
//! terminal status, and the [`TrackingHandle`] aborts the task when the
//! tracking view goes away.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{info, instrument, warn};

use quickbite_core::{OrderId, Timeline};

use crate::api::ApiError;
use crate::api::backend::{DeliveryBackend, DriverBackend, OrderBackend};
use crate::api::types::{DeliveryRecordDto, DriverDto, OrderDto};
use crate::surface::{MapSurface, MapView, Marker, MarkerKind};

const TRACKING_MAP_ZOOM: u8 = 14;

/// Errors opening a tracking feed.
#[derive(Debug, thiserror::Error)]
pub enum TrackingError {
    #[error(transparent)]
    Backend(#[from] ApiError),
}

/// One frame of tracking state.
///
/// The driver profile is best-effort: a failed profile lookup degrades to
/// `None` rather than blocking the feed.
#[derive(Debug, Clone)]
pub struct TrackingSnapshot {
    pub order: OrderDto,
    pub delivery: DeliveryRecordDto,
    pub driver: Option<DriverDto>,
    pub timeline: Timeline,
}

/// Handle to a running feed. Aborts the polling task on drop; the UI does
/// not need to remember to stop tracking when the view unmounts.
pub struct TrackingHandle {
    task: JoinHandle<()>,
}

impl TrackingHandle {
    /// Stop polling explicitly.
    pub fn stop(&self) {
        self.task.abort();
    }
}

impl Drop for TrackingHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

struct FeedInner<O, D, R> {
    orders: O,
    delivery: D,
    drivers: R,
    map: Arc<dyn MapSurface>,
    poll_interval: Duration,
}

/// The tracking feed factory. One [`TrackingFeed::open`] call per tracked
/// order; each feed polls independently.
pub struct TrackingFeed<O, D, R> {
    inner: Arc<FeedInner<O, D, R>>,
}

impl<O, D, R> Clone for TrackingFeed<O, D, R> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<O, D, R> TrackingFeed<O, D, R>
where
    O: OrderBackend + Send + Sync + 'static,
    D: DeliveryBackend + Send + Sync + 'static,
    R: DriverBackend + Send + Sync + 'static,
{
    pub fn new(
        orders: O,
        delivery: D,
        drivers: R,
        map: Arc<dyn MapSurface>,
        poll_interval: Duration,
    ) -> Self {
        Self {
            inner: Arc::new(FeedInner {
                orders,
                delivery,
                drivers,
                map,
                poll_interval,
            }),
        }
    }

    async fn fetch(
        inner: &FeedInner<O, D, R>,
        order_id: OrderId,
    ) -> Result<TrackingSnapshot, TrackingError> {
        let order = inner.orders.get(order_id).await?;
        let delivery = inner.delivery.by_order(order_id).await?;
        let driver = match inner.drivers.driver(delivery.driver_id).await {
            Ok(driver) => Some(driver),
            Err(e) => {
                warn!(driver = %delivery.driver_id, error = %e, "Driver profile unavailable");
                None
            }
        };
        Ok(TrackingSnapshot {
            timeline: Timeline::from_status(order.status),
            order,
            delivery,
            driver,
        })
    }

    fn render(inner: &FeedInner<O, D, R>, snapshot: &TrackingSnapshot) {
        let driver = snapshot.delivery.driver_location;
        let customer = snapshot.delivery.customer_location;
        inner.map.render(&MapView {
            center: driver,
            zoom: TRACKING_MAP_ZOOM,
            markers: vec![
                Marker {
                    position: customer,
                    kind: MarkerKind::Customer,
                },
                Marker {
                    position: driver,
                    kind: MarkerKind::Driver,
                },
            ],
            polyline: Some((driver, customer)),
        });
    }

    /// Open a feed for `order`: fetch the initial snapshot, render it, and
    /// start the polling task.
    ///
    /// The returned receiver always holds the latest snapshot; the handle
    /// owns the task lifetime.
    ///
    /// # Errors
    ///
    /// Fails if the initial order or delivery fetch fails; tracking an
    /// order with no delivery record is a [`TrackingError::Backend`] with
    /// the underlying not-found.
    #[instrument(skip(self), fields(order = %order))]
    pub async fn open(
        &self,
        order: OrderId,
    ) -> Result<(watch::Receiver<TrackingSnapshot>, TrackingHandle), TrackingError> {
        let initial = Self::fetch(&self.inner, order).await?;
        Self::render(&self.inner, &initial);

        let (tx, rx) = watch::channel(initial);
        let inner = self.inner.clone();
        let task = tokio::spawn(async move {
            let mut interval = tokio::time::interval(inner.poll_interval);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            // First tick resolves immediately; the initial snapshot already
            // covers it.
            interval.tick().await;
            loop {
                interval.tick().await;
                match Self::fetch(&inner, order).await {
                    Ok(snapshot) => {
                        let terminal = snapshot.delivery.status.is_terminal();
                        Self::render(&inner, &snapshot);
                        if tx.send(snapshot).is_err() {
                            // All receivers dropped
                            break;
                        }
                        if terminal {
                            info!(order = %order, "Delivery reached terminal status; tracking stopped");
                            break;
                        }
                    }
                    Err(e) => {
                        // Keep the last snapshot; retry on the next tick
                        warn!(order = %order, error = %e, "Tracking poll failed");
                    }
                }
            }
        });

        Ok((rx, TrackingHandle { task }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex as StdMutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use chrono::Utc;
    use rust_decimal::Decimal;
    use quickbite_core::{
        DeliveryId, DeliveryStatus, DriverId, GeoPoint, OrderStatus, RestaurantId, TimelineStage,
        UserId,
    };

    use crate::api::AssignOutcome;
    use crate::api::types::DeliveryUpdate;

    #[derive(Default)]
    struct RecordingMap {
        renders: StdMutex<Vec<MapView>>,
    }

    impl MapSurface for RecordingMap {
        fn render(&self, view: &MapView) {
            self.renders.lock().expect("lock").push(view.clone());
        }
    }

    #[derive(Clone)]
    struct FixedOrders {
        status: Arc<StdMutex<OrderStatus>>,
    }

    impl FixedOrders {
        fn with_status(status: OrderStatus) -> Self {
            Self {
                status: Arc::new(StdMutex::new(status)),
            }
        }
    }

    impl OrderBackend for FixedOrders {
        async fn create(
            &self,
            _draft: &crate::api::types::DraftOrder,
        ) -> Result<crate::api::types::CreatedOrder, ApiError> {
            Err(ApiError::NotFound("orders".into()))
        }

        async fn get(&self, order: OrderId) -> Result<OrderDto, ApiError> {
            Ok(OrderDto {
                order_id: order,
                status: *self.status.lock().expect("lock"),
                total_amount: Decimal::new(1250, 0),
                created_at: Utc::now(),
                items: vec![],
            })
        }

        async fn by_user(&self, _user: UserId) -> Result<Vec<OrderDto>, ApiError> {
            Ok(vec![])
        }

        async fn by_restaurant(&self, _r: RestaurantId) -> Result<Vec<OrderDto>, ApiError> {
            Ok(vec![])
        }

        async fn update_status(&self, _order: OrderId, status: OrderStatus) -> Result<(), ApiError> {
            *self.status.lock().expect("lock") = status;
            Ok(())
        }

        async fn cancel(&self, _order: OrderId) -> Result<(), ApiError> {
            Ok(())
        }

        async fn delete(&self, _order: OrderId) -> Result<(), ApiError> {
            Ok(())
        }
    }

    /// Delivery backend that replays a scripted sequence of records, one
    /// per `by_order` call, clamping at the last.
    #[derive(Clone)]
    struct ScriptedDelivery {
        script: Arc<Vec<DeliveryRecordDto>>,
        calls: Arc<AtomicUsize>,
    }

    impl ScriptedDelivery {
        fn new(script: Vec<DeliveryRecordDto>) -> Self {
            Self {
                script: Arc::new(script),
                calls: Arc::new(AtomicUsize::new(0)),
            }
        }
    }

    impl DeliveryBackend for ScriptedDelivery {
        async fn assign(
            &self,
            _order: OrderId,
            _location: GeoPoint,
        ) -> Result<AssignOutcome, ApiError> {
            Ok(AssignOutcome::NoDriversAvailable)
        }

        async fn by_order(&self, _order: OrderId) -> Result<DeliveryRecordDto, ApiError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            let index = call.min(self.script.len() - 1);
            Ok(self.script[index].clone())
        }

        async fn update(
            &self,
            _delivery: DeliveryId,
            _update: &DeliveryUpdate,
        ) -> Result<(), ApiError> {
            Ok(())
        }
    }

    #[derive(Clone)]
    struct FixedDriver {
        missing: bool,
    }

    impl DriverBackend for FixedDriver {
        async fn driver(&self, driver: DriverId) -> Result<DriverDto, ApiError> {
            if self.missing {
                return Err(ApiError::NotFound(format!("drivers/{driver}")));
            }
            Ok(DriverDto {
                driver_id: driver,
                name: "Ravi".into(),
                phone: Some("9900112233".into()),
                vehicle: Some("KA-01-AB-1234".into()),
                rating: Some(4.8),
            })
        }
    }

    fn record(status: DeliveryStatus, driver_lng: f64) -> DeliveryRecordDto {
        DeliveryRecordDto {
            delivery_id: DeliveryId::new(5),
            order_id: OrderId::new(77),
            driver_id: DriverId::new(9),
            status,
            customer_location: GeoPoint::new(77.59, 12.97),
            driver_location: GeoPoint::new(driver_lng, 12.95),
            created_at: Utc::now(),
            updated_at: Utc::now(),
            actual_delivery_time: None,
        }
    }

    fn feed(
        status: OrderStatus,
        script: Vec<DeliveryRecordDto>,
        missing_driver: bool,
    ) -> (
        TrackingFeed<FixedOrders, ScriptedDelivery, FixedDriver>,
        Arc<RecordingMap>,
        ScriptedDelivery,
    ) {
        let map = Arc::new(RecordingMap::default());
        let delivery = ScriptedDelivery::new(script);
        let feed = TrackingFeed::new(
            FixedOrders::with_status(status),
            delivery.clone(),
            FixedDriver {
                missing: missing_driver,
            },
            map.clone(),
            Duration::from_secs(10),
        );
        (feed, map, delivery)
    }

    #[tokio::test(start_paused = true)]
    async fn test_open_renders_initial_snapshot_with_polyline() {
        let (feed, map, _) = feed(
            OrderStatus::OutForDelivery,
            vec![record(DeliveryStatus::OnTheWay, 77.60)],
            false,
        );

        let (rx, _handle) = feed.open(OrderId::new(77)).await.expect("open");
        let snapshot = rx.borrow().clone();
        assert_eq!(snapshot.timeline.current, Some(TimelineStage::OnTheWay));
        assert_eq!(snapshot.driver.as_ref().map(|d| d.name.as_str()), Some("Ravi"));

        let renders = map.renders.lock().expect("lock");
        assert_eq!(renders.len(), 1);
        let view = &renders[0];
        assert_eq!(view.markers.len(), 2);
        assert!(view.polyline.is_some());
        // Centered on the driver
        assert_eq!(view.center, GeoPoint::new(77.60, 12.95));
    }

    #[tokio::test(start_paused = true)]
    async fn test_polling_publishes_updates_until_terminal() {
        let (feed, _map, delivery) = feed(
            OrderStatus::OutForDelivery,
            vec![
                record(DeliveryStatus::OnTheWay, 77.60),
                record(DeliveryStatus::OnTheWay, 77.595),
                record(DeliveryStatus::Delivered, 77.59),
            ],
            false,
        );

        let (mut rx, _handle) = feed.open(OrderId::new(77)).await.expect("open");

        rx.changed().await.expect("first poll");
        assert_eq!(
            rx.borrow().delivery.driver_location,
            GeoPoint::new(77.595, 12.95)
        );

        rx.changed().await.expect("second poll");
        assert_eq!(rx.borrow().delivery.status, DeliveryStatus::Delivered);

        // Terminal status stops polling; further time passes with no fetch
        let calls = delivery.calls.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(delivery.calls.load(Ordering::SeqCst), calls);
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_driver_profile_degrades_to_none() {
        let (feed, _map, _) = feed(
            OrderStatus::OutForDelivery,
            vec![record(DeliveryStatus::OnTheWay, 77.60)],
            true,
        );

        let (rx, _handle) = feed.open(OrderId::new(77)).await.expect("open");
        assert!(rx.borrow().driver.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropping_handle_stops_polling() {
        let (feed, _map, delivery) = feed(
            OrderStatus::OutForDelivery,
            vec![record(DeliveryStatus::OnTheWay, 77.60)],
            false,
        );

        let (_rx, handle) = feed.open(OrderId::new(77)).await.expect("open");
        drop(handle);
        tokio::task::yield_now().await;

        let calls = delivery.calls.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(delivery.calls.load(Ordering::SeqCst), calls);
    }

    #[tokio::test(start_paused = true)]
    async fn test_tracking_unassigned_order_fails_to_open() {
        let map = Arc::new(RecordingMap::default());
        struct NoDelivery;
        impl DeliveryBackend for NoDelivery {
            async fn assign(
                &self,
                _order: OrderId,
                _location: GeoPoint,
            ) -> Result<AssignOutcome, ApiError> {
                Ok(AssignOutcome::NoDriversAvailable)
            }
            async fn by_order(&self, order: OrderId) -> Result<DeliveryRecordDto, ApiError> {
                Err(ApiError::NotFound(format!("deliveries/order/{order}")))
            }
            async fn update(
                &self,
                _delivery: DeliveryId,
                _update: &DeliveryUpdate,
            ) -> Result<(), ApiError> {
                Ok(())
            }
        }

        let feed = TrackingFeed::new(
            FixedOrders::with_status(OrderStatus::Confirmed),
            NoDelivery,
            FixedDriver { missing: false },
            map,
            Duration::from_secs(10),
        );
        let result = feed.open(OrderId::new(77)).await;
        assert!(matches!(
            result,
            Err(TrackingError::Backend(ApiError::NotFound(_)))
        ));
    }
}
