//! Geographic coordinates.
//!
//! The delivery service exchanges positions as `[longitude, latitude]`
//! arrays, so `GeoPoint` serializes to exactly that shape.

use serde::de::{Deserialize, Deserializer};
use serde::ser::{Serialize, SerializeTuple, Serializer};

/// A longitude/latitude pair.
///
/// Used for both customer positions (set at checkout, refreshed by device
/// geolocation or map click) and driver positions (polled, server-owned).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    /// Longitude in degrees, east-positive.
    pub lng: f64,
    /// Latitude in degrees, north-positive.
    pub lat: f64,
}

impl GeoPoint {
    /// Create a point from a longitude/latitude pair.
    #[must_use]
    pub const fn new(lng: f64, lat: f64) -> Self {
        Self { lng, lat }
    }
}

impl From<[f64; 2]> for GeoPoint {
    fn from([lng, lat]: [f64; 2]) -> Self {
        Self { lng, lat }
    }
}

impl From<GeoPoint> for [f64; 2] {
    fn from(point: GeoPoint) -> Self {
        [point.lng, point.lat]
    }
}

impl std::fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {}]", self.lng, self.lat)
    }
}

// Wire shape is a two-element array, longitude first.
impl Serialize for GeoPoint {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut tuple = serializer.serialize_tuple(2)?;
        tuple.serialize_element(&self.lng)?;
        tuple.serialize_element(&self.lat)?;
        tuple.end()
    }
}

impl<'de> Deserialize<'de> for GeoPoint {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let pair = <[f64; 2]>::deserialize(deserializer)?;
        Ok(Self::from(pair))
    }
}
