//! Unified application error.
//!
//! Provides a single `AppError` the facade surfaces to the UI shell. All
//! facade operations return `Result<T, AppError>`; each variant carries a
//! user-presentable message via [`AppError::user_message`], so no backend
//! failure is ever silent.

use thiserror::Error;

use crate::api::ApiError;
use crate::config::ConfigError;
use crate::services::{CartError, CheckoutError, PaymentError, TrackingError};
use crate::session::SessionError;
use crate::surface::GeoError;

/// Application-level error type for the storefront engine.
#[derive(Debug, Error)]
pub enum AppError {
    /// Cart operation failed.
    #[error("Cart error: {0}")]
    Cart(#[from] CartError),

    /// Checkout pipeline failed.
    #[error("Checkout error: {0}")]
    Checkout(#[from] CheckoutError),

    /// Payment initiation failed.
    #[error("Payment error: {0}")]
    Payment(#[from] PaymentError),

    /// Tracking feed failed.
    #[error("Tracking error: {0}")]
    Tracking(#[from] TrackingError),

    /// Session operation failed.
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    /// Device geolocation failed.
    #[error("Geolocation error: {0}")]
    Geolocation(#[from] GeoError),

    /// Backend request failed outside a service flow.
    #[error("Backend error: {0}")]
    Backend(#[from] ApiError),

    /// Configuration is invalid.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl AppError {
    /// The message to show the user for this error.
    ///
    /// Business errors carry their own phrasing; transport and server
    /// failures collapse to a generic message, with the detail kept for
    /// logs only.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Cart(CartError::Backend(e))
            | Self::Payment(PaymentError::Backend(e))
            | Self::Tracking(TrackingError::Backend(e))
            | Self::Backend(e) => e.user_message(),
            // Checkout wraps payment and assignment failures of its own;
            // its collapse handles the nested backend cases.
            Self::Checkout(e) => e.user_message(),
            Self::Config(_) => "The application is misconfigured.".to_string(),
            Self::Cart(e) => e.to_string(),
            Self::Payment(e) => e.to_string(),
            Self::Session(e) => e.to_string(),
            Self::Geolocation(e) => e.to_string(),
        }
    }
}
