//! Narrow surfaces the UI shell implements.
//!
//! The engine treats map rendering, toast notifications, and device
//! geolocation as external capabilities consumed through these interfaces.
//! Any provider satisfying the contract is substitutable; tests install
//! recording fakes.

use std::time::Duration;

use quickbite_core::GeoPoint;

/// Notification severity for the toast surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Success,
    Warning,
    Error,
}

/// Toast/notification plumbing seam.
///
/// Every user-visible success or failure in the engine goes through here;
/// there are no silent failures.
pub trait Notifier: Send + Sync {
    fn notify(&self, severity: Severity, message: &str);
}

/// What a marker on the map represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerKind {
    Customer,
    Driver,
}

/// A single marker to render.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Marker {
    pub position: GeoPoint,
    pub kind: MarkerKind,
}

/// One frame of map state.
#[derive(Debug, Clone, PartialEq)]
pub struct MapView {
    pub center: GeoPoint,
    pub zoom: u8,
    pub markers: Vec<Marker>,
    /// Driver-to-customer line while live tracking is active.
    pub polyline: Option<(GeoPoint, GeoPoint)>,
}

impl MapView {
    /// A view centered on one point with a single customer marker.
    #[must_use]
    pub fn centered(center: GeoPoint, zoom: u8) -> Self {
        Self {
            center,
            zoom,
            markers: vec![Marker {
                position: center,
                kind: MarkerKind::Customer,
            }],
            polyline: None,
        }
    }
}

/// Map rendering seam: `render(center, zoom, markers, polyline?)`.
///
/// Click/tap coordinates flow back into the engine as
/// [`LocationSource::MapClick`] events via the checkout facade.
pub trait MapSurface: Send + Sync {
    fn render(&self, view: &MapView);
}

/// Where a customer location update came from.
///
/// All three sources funnel through the same update path, which re-centers
/// the map and retries a pending driver assignment if one exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocationSource {
    /// Automatic device geolocation on mount.
    DeviceGeolocation,
    /// Explicit "use current location" action.
    UseCurrentLocation,
    /// Map click/tap.
    MapClick,
}

/// Errors acquiring a device position.
#[derive(Debug, thiserror::Error)]
pub enum GeoError {
    /// The device did not report a position within the timeout.
    #[error("timed out waiting for device position")]
    Timeout,
    /// The user denied the location permission.
    #[error("location permission denied")]
    PermissionDenied,
    /// The provider failed for another reason.
    #[error("geolocation unavailable: {0}")]
    Unavailable(String),
}

/// Device geolocation seam.
///
/// `current_position` should request a high-accuracy fix; the engine
/// applies its own timeout on top because the underlying call may never
/// resolve.
pub trait GeolocationProvider: Send + Sync {
    fn current_position(
        &self,
    ) -> impl std::future::Future<Output = Result<GeoPoint, GeoError>> + Send;
}

/// Acquire a device position, bounded by `timeout`.
///
/// # Errors
///
/// Returns [`GeoError::Timeout`] if the provider does not resolve in time,
/// or the provider's own error otherwise.
pub async fn locate_with_timeout<G: GeolocationProvider>(
    provider: &G,
    timeout: Duration,
) -> Result<GeoPoint, GeoError> {
    match tokio::time::timeout(timeout, provider.current_position()).await {
        Ok(result) => result,
        Err(_) => Err(GeoError::Timeout),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NeverResolves;

    impl GeolocationProvider for NeverResolves {
        async fn current_position(&self) -> Result<GeoPoint, GeoError> {
            std::future::pending().await
        }
    }

    struct Fixed(GeoPoint);

    impl GeolocationProvider for Fixed {
        async fn current_position(&self) -> Result<GeoPoint, GeoError> {
            Ok(self.0)
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_locate_times_out() {
        let result = locate_with_timeout(&NeverResolves, Duration::from_secs(5)).await;
        assert!(matches!(result, Err(GeoError::Timeout)));
    }

    #[tokio::test]
    async fn test_locate_returns_position() {
        let point = GeoPoint::new(77.6, 12.9);
        let result = locate_with_timeout(&Fixed(point), Duration::from_secs(5)).await;
        assert_eq!(result.expect("position"), point);
    }

    #[test]
    fn test_centered_view_has_customer_marker() {
        let view = MapView::centered(GeoPoint::new(1.0, 2.0), 15);
        assert_eq!(view.markers.len(), 1);
        assert_eq!(view.markers[0].kind, MarkerKind::Customer);
        assert!(view.polyline.is_none());
    }
}
