//! QuickBite storefront client engine.
//!
//! A headless client for the QuickBite food-ordering backend: cart
//! management, the order placement pipeline (create, verify, driver
//! assignment with retry, payment handoff or direct confirmation), and
//! live delivery tracking. The UI shell provides map rendering, toast
//! notifications, and device geolocation through the narrow traits in
//! [`surface`]; everything else lives here.
//!
//! Entry point is [`AppState::from_config`] (or [`Storefront::assemble`]
//! with custom backends); the facade in [`state`] exposes the operations a
//! shell needs.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod config;
pub mod error;
pub mod services;
pub mod session;
pub mod state;
pub mod surface;

pub use config::{ClientConfig, ConfigError};
pub use error::AppError;
pub use services::{
    CardDetails, CartSnapshot, CheckoutForm, CheckoutState, GatewayHandoff, SubmitOutcome,
    TrackingHandle, TrackingSnapshot,
};
pub use session::Session;
pub use state::{AppState, Storefront};
pub use surface::{
    GeoError, GeolocationProvider, LocationSource, MapSurface, MapView, Marker, MarkerKind,
    Notifier, Severity,
};
