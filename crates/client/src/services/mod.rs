//! Application services: the stateful layer between the REST clients and
//! the UI surfaces.

pub mod assignment;
pub mod cart;
pub mod checkout;
pub mod payment;
pub mod tracking;

pub use assignment::{AssignmentError, AssignmentProtocol, PendingAssignment};
pub use cart::{CartError, CartLine, CartSnapshot, CartStore};
pub use checkout::{
    CheckoutCoordinator, CheckoutError, CheckoutForm, CheckoutState, LocationOutcome,
    SubmitOutcome,
};
pub use payment::{CardDetails, GatewayHandoff, PaymentAdapter, PaymentError, validate_card};
pub use tracking::{TrackingError, TrackingFeed, TrackingHandle, TrackingSnapshot};
