//! Core types for QuickBite.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod geo;
pub mod id;
pub mod money;
pub mod status;
pub mod timeline;

pub use geo::GeoPoint;
pub use id::*;
pub use money::display_amount;
pub use status::*;
pub use timeline::{Timeline, TimelineStage};
