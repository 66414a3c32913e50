//! QuickBite Core - Shared types library.
//!
//! This crate provides the domain types used across the QuickBite storefront
//! engine:
//! - `client` - The storefront client engine (cart, checkout, tracking)
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients, no async.
//! This keeps it lightweight and allows it to be used anywhere, including
//! inside a UI shell.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, geo points, money formatting, status enums,
//!   and the delivery display timeline

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
