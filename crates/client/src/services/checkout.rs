//! Order submission coordinator.
//!
//! Reconciles three independently-failing asynchronous steps - order
//! creation, driver assignment, payment/confirmation - into one
//! user-visible outcome. Steps are strictly sequential; no step begins
//! before the previous resolves.
//!
//! The state machine:
//!
//! ```text
//! Idle -> Creating -> Verifying -> AssigningDriver
//!     -> { NoDriverFound -> AwaitingResumeConfirmation, Paying, Confirming }
//!     -> Done | Failed
//! ```
//!
//! "No driver found" is a recoverable business condition: the order is
//! parked, not failed, and location updates retry assignment against the
//! same order id. A found driver surfaces a confirmation prompt before
//! payment resumes - the user is never silently charged.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use rust_decimal::Decimal;
use tokio::sync::{Mutex, RwLock};
use tracing::{info, instrument, warn};

use quickbite_core::{GeoPoint, OrderId, OrderStatus, PaymentMethod};

use crate::api::backend::{DeliveryBackend, OrderBackend, PaymentBackend};
use crate::api::types::{Address, DraftOrder, DraftOrderItem};
use crate::api::{ApiError, AssignOutcome};
use crate::services::assignment::{AssignmentError, AssignmentProtocol, PendingAssignment};
use crate::services::cart::CartSnapshot;
use crate::services::payment::{
    CardDetails, GatewayHandoff, PaymentAdapter, PaymentError, validate_card,
};
use crate::session::Session;
use crate::surface::{LocationSource, MapSurface, MapView, Notifier, Severity};

const CHECKOUT_MAP_ZOOM: u8 = 15;

/// Coordinator state. One coordinator drives one checkout at a time.
#[derive(Debug, Clone, PartialEq)]
pub enum CheckoutState {
    Idle,
    Creating,
    Verifying,
    AssigningDriver,
    /// Order created, no driver bound yet; retried on location updates.
    NoDriverFound(PendingAssignment),
    /// A driver was found after a no-driver pause; waiting for the user's
    /// explicit "proceed" before payment/confirmation resumes.
    AwaitingResumeConfirmation(OrderId),
    Paying,
    Confirming,
    Done(OrderId),
    Failed,
}

/// Checkout form state collected from the UI.
#[derive(Debug, Clone)]
pub struct CheckoutForm {
    pub address: Address,
    pub payment_method: PaymentMethod,
    pub card: Option<CardDetails>,
}

/// What a submit produced.
#[derive(Debug)]
pub enum SubmitOutcome {
    /// First submit with a card method: the card sub-form was revealed and
    /// the submit consumed; no network call was made.
    CardFormRevealed,
    /// Order created but no driver in range; parked for retry.
    AwaitingDriver(PendingAssignment),
    /// Card path: hand browser control to the gateway.
    PaymentHandoff(GatewayHandoff),
    /// Non-card path: order confirmed.
    Confirmed(OrderId),
}

/// What a location update produced.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LocationOutcome {
    /// Location stored and map re-centered; no assignment was pending.
    Updated,
    /// A pending assignment was retried and still found no driver.
    StillNoDriver,
    /// A pending assignment succeeded; awaiting the user's confirmation.
    DriverFound(OrderId),
}

/// Errors from checkout.
#[derive(Debug, thiserror::Error)]
pub enum CheckoutError {
    #[error("sign in to place an order")]
    NotAuthenticated,

    #[error("your cart is empty")]
    EmptyCart,

    #[error("select a delivery location before checking out")]
    MissingLocation,

    #[error("complete all delivery address fields")]
    IncompleteAddress,

    #[error("enter your card details")]
    MissingCardDetails,

    #[error("a checkout is already in progress")]
    Busy,

    #[error("could not verify order {0} after creation")]
    VerificationFailed(OrderId),

    #[error("nothing to resume")]
    NoPendingResume,

    #[error(transparent)]
    Payment(#[from] PaymentError),

    #[error(transparent)]
    Assignment(AssignmentError),

    #[error(transparent)]
    Backend(ApiError),
}

impl From<ApiError> for CheckoutError {
    fn from(e: ApiError) -> Self {
        match e {
            ApiError::NotAuthenticated => Self::NotAuthenticated,
            other => Self::Backend(other),
        }
    }
}

impl CheckoutError {
    /// The message to show the user for this error.
    ///
    /// Validation errors carry their own phrasing; backend failures
    /// collapse to the transport layer's generic message so raw body text
    /// never reaches a toast.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Backend(e)
            | Self::Payment(PaymentError::Backend(e))
            | Self::Assignment(AssignmentError::Backend(e)) => e.user_message(),
            other => other.to_string(),
        }
    }
}

/// Context carried across a paused attempt so payment/confirmation can
/// resume after a driver is found.
#[derive(Debug, Clone)]
struct AttemptContext {
    order_id: OrderId,
    payment_method: PaymentMethod,
    card: Option<CardDetails>,
    total: Decimal,
}

/// The order submission coordinator.
pub struct CheckoutCoordinator<O, D, P> {
    orders: O,
    assignment: AssignmentProtocol<D>,
    payments: PaymentAdapter<P>,
    session: Session,
    notifier: Arc<dyn Notifier>,
    map: Arc<dyn MapSurface>,
    verify_delay: Duration,
    state: RwLock<CheckoutState>,
    customer_location: RwLock<Option<GeoPoint>>,
    card_form_revealed: AtomicBool,
    attempt: Mutex<Option<AttemptContext>>,
}

impl<O, D, P> CheckoutCoordinator<O, D, P>
where
    O: OrderBackend,
    D: DeliveryBackend,
    P: PaymentBackend,
{
    pub fn new(
        orders: O,
        delivery: D,
        payments: P,
        session: Session,
        notifier: Arc<dyn Notifier>,
        map: Arc<dyn MapSurface>,
        verify_delay: Duration,
    ) -> Self {
        Self {
            orders,
            assignment: AssignmentProtocol::new(delivery),
            payments: PaymentAdapter::new(payments),
            session,
            notifier,
            map,
            verify_delay,
            state: RwLock::new(CheckoutState::Idle),
            customer_location: RwLock::new(None),
            card_form_revealed: AtomicBool::new(false),
            attempt: Mutex::new(None),
        }
    }

    /// Current coordinator state.
    pub async fn state(&self) -> CheckoutState {
        self.state.read().await.clone()
    }

    /// The customer location used for driver assignment, if set.
    pub async fn customer_location(&self) -> Option<GeoPoint> {
        *self.customer_location.read().await
    }

    async fn set_state(&self, next: CheckoutState) {
        *self.state.write().await = next;
    }

    /// Surface an error and settle into `next`, leaving any created order
    /// intact server-side.
    async fn fail_with(&self, next: CheckoutState, error: CheckoutError) -> CheckoutError {
        self.notifier.notify(Severity::Error, &error.user_message());
        self.set_state(next).await;
        error
    }

    /// Drive a checkout submit through the state machine.
    ///
    /// # Errors
    ///
    /// Validation errors short-circuit before any network call. Backend
    /// errors are surfaced via the notifier and reset the coordinator to
    /// `Idle`; a created order is never deleted automatically.
    #[instrument(skip(self, cart, form), fields(method = ?form.payment_method))]
    pub async fn submit(
        &self,
        cart: &CartSnapshot,
        form: &CheckoutForm,
    ) -> Result<SubmitOutcome, CheckoutError> {
        match self.state().await {
            CheckoutState::Idle | CheckoutState::Done(_) | CheckoutState::Failed => {}
            _ => return Err(CheckoutError::Busy),
        }

        // Preconditions, enforced before any network call
        let (user_id, _) = self.session.bearer().ok_or(CheckoutError::NotAuthenticated)?;
        if cart.is_empty() {
            return Err(self.precondition_failed(CheckoutError::EmptyCart));
        }
        let Some(location) = self.customer_location().await else {
            return Err(self.precondition_failed(CheckoutError::MissingLocation));
        };
        if !form.address.is_complete() {
            return Err(self.precondition_failed(CheckoutError::IncompleteAddress));
        }

        if form.payment_method.is_card() {
            // First submit with a card method only reveals the card
            // sub-form; it is consumed without touching the network.
            if !self.card_form_revealed.swap(true, Ordering::SeqCst) {
                return Ok(SubmitOutcome::CardFormRevealed);
            }
            let Some(card) = form.card.as_ref() else {
                return Err(self.precondition_failed(CheckoutError::MissingCardDetails));
            };
            if let Err(e) = validate_card(card) {
                return Err(self.precondition_failed(e.into()));
            }
        }

        let Some(restaurant_id) = cart.restaurant_id else {
            return Err(self.precondition_failed(CheckoutError::EmptyCart));
        };

        // Creating
        self.set_state(CheckoutState::Creating).await;
        let draft = DraftOrder {
            user_id,
            restaurant_id,
            items: cart
                .lines
                .iter()
                .map(|line| DraftOrderItem {
                    menu_item_id: line.menu_item_id,
                    name: line.name.clone(),
                    unit_price: line.unit_price,
                    quantity: line.quantity,
                })
                .collect(),
            delivery_address: form.address.clone(),
            payment_method: form.payment_method,
        };
        let created = match self.orders.create(&draft).await {
            Ok(created) => created,
            Err(e) => return Err(self.fail_with(CheckoutState::Idle, e.into()).await),
        };
        let order_id = created.order_id;
        info!(order = %order_id, "Order created");

        // Verifying: re-fetch once after a short delay to guard against
        // read-after-write lag. A failed verification fails the attempt;
        // the order is not re-created.
        self.set_state(CheckoutState::Verifying).await;
        tokio::time::sleep(self.verify_delay).await;
        let order = match self.orders.get(order_id).await {
            Ok(order) => order,
            Err(e) => {
                warn!(order = %order_id, error = %e, "Order verification failed");
                return Err(self
                    .fail_with(
                        CheckoutState::Failed,
                        CheckoutError::VerificationFailed(order_id),
                    )
                    .await);
            }
        };

        let context = AttemptContext {
            order_id,
            payment_method: form.payment_method,
            card: form.card.clone(),
            total: order.total_amount,
        };
        *self.attempt.lock().await = Some(context.clone());

        // AssigningDriver
        self.set_state(CheckoutState::AssigningDriver).await;
        match self.assignment.assign(order_id, location).await {
            Ok(AssignOutcome::Assigned(_)) => self.finish(context).await,
            Ok(AssignOutcome::NoDriversAvailable) => {
                let pending = PendingAssignment {
                    order_id,
                    last_attempted_location: location,
                };
                self.set_state(CheckoutState::NoDriverFound(pending)).await;
                self.notifier.notify(
                    Severity::Warning,
                    "No delivery drivers are nearby right now. Update your location to try again.",
                );
                Ok(SubmitOutcome::AwaitingDriver(pending))
            }
            Err(e @ AssignmentError::InvalidOrder(_)) => Err(self
                .fail_with(CheckoutState::Failed, CheckoutError::Assignment(e))
                .await),
            Err(e) => Err(self
                .fail_with(CheckoutState::Idle, CheckoutError::Assignment(e))
                .await),
        }
    }

    fn precondition_failed(&self, error: CheckoutError) -> CheckoutError {
        self.notifier.notify(Severity::Error, &error.user_message());
        error
    }

    /// Complete the attempt after a driver is bound: card methods hand off
    /// to the gateway, everything else confirms directly.
    async fn finish(&self, context: AttemptContext) -> Result<SubmitOutcome, CheckoutError> {
        let outcome = if context.payment_method.is_card() {
            self.set_state(CheckoutState::Paying).await;
            let card = context.card.as_ref().ok_or(CheckoutError::MissingCardDetails)?;
            let handoff = match self.payments.initiate(context.order_id, context.total, card).await
            {
                Ok(handoff) => handoff,
                Err(e) => return Err(self.fail_with(CheckoutState::Idle, e.into()).await),
            };
            self.notifier
                .notify(Severity::Info, "Redirecting to your payment provider");
            SubmitOutcome::PaymentHandoff(handoff)
        } else {
            self.set_state(CheckoutState::Confirming).await;
            if let Err(e) = self
                .orders
                .update_status(context.order_id, OrderStatus::Confirmed)
                .await
            {
                return Err(self.fail_with(CheckoutState::Idle, e.into()).await);
            }
            self.notifier.notify(Severity::Success, "Order confirmed");
            SubmitOutcome::Confirmed(context.order_id)
        };

        self.set_state(CheckoutState::Done(context.order_id)).await;
        *self.attempt.lock().await = None;
        self.card_form_revealed.store(false, Ordering::SeqCst);
        info!(order = %context.order_id, "Checkout complete");
        Ok(outcome)
    }

    /// Funnel for every customer location change: device geolocation on
    /// mount, explicit "use current location", and map clicks.
    ///
    /// Updates the held geo-point, re-centers the map, and - only if an
    /// assignment is pending - retries assignment with the new point.
    #[instrument(skip(self), fields(source = ?source, location = %point))]
    pub async fn handle_location_update(
        &self,
        source: LocationSource,
        point: GeoPoint,
    ) -> Result<LocationOutcome, CheckoutError> {
        *self.customer_location.write().await = Some(point);
        self.map.render(&MapView::centered(point, CHECKOUT_MAP_ZOOM));

        let CheckoutState::NoDriverFound(pending) = self.state().await else {
            return Ok(LocationOutcome::Updated);
        };

        match self.assignment.assign(pending.order_id, point).await {
            Ok(AssignOutcome::Assigned(_)) => {
                self.set_state(CheckoutState::AwaitingResumeConfirmation(pending.order_id))
                    .await;
                self.notifier.notify(
                    Severity::Info,
                    "A driver was found. Confirm to continue with your order.",
                );
                Ok(LocationOutcome::DriverFound(pending.order_id))
            }
            Ok(AssignOutcome::NoDriversAvailable) => {
                self.set_state(CheckoutState::NoDriverFound(PendingAssignment {
                    order_id: pending.order_id,
                    last_attempted_location: point,
                }))
                .await;
                Ok(LocationOutcome::StillNoDriver)
            }
            Err(e @ AssignmentError::InvalidOrder(_)) => {
                *self.attempt.lock().await = None;
                Err(self
                    .fail_with(CheckoutState::Failed, CheckoutError::Assignment(e))
                    .await)
            }
            Err(e) => {
                // Transient failure: stay parked, retry-eligible
                let error = CheckoutError::Assignment(e);
                self.notifier.notify(Severity::Error, &error.user_message());
                Err(error)
            }
        }
    }

    /// Resume payment/confirmation after the user explicitly confirms the
    /// found driver.
    ///
    /// # Errors
    ///
    /// [`CheckoutError::NoPendingResume`] when no attempt is waiting.
    #[instrument(skip(self))]
    pub async fn confirm_resume(&self) -> Result<SubmitOutcome, CheckoutError> {
        let CheckoutState::AwaitingResumeConfirmation(_) = self.state().await else {
            return Err(CheckoutError::NoPendingResume);
        };
        let context = self
            .attempt
            .lock()
            .await
            .clone()
            .ok_or(CheckoutError::NoPendingResume)?;
        self.finish(context).await
    }

    /// Abandon a parked attempt.
    ///
    /// Deliberate soft-cancel: the created order stays server-side,
    /// unconfirmed and visible to operators; no cancellation call is made.
    #[instrument(skip(self))]
    pub async fn abandon(&self) {
        match self.state().await {
            CheckoutState::NoDriverFound(_) | CheckoutState::AwaitingResumeConfirmation(_) => {
                *self.attempt.lock().await = None;
                self.card_form_revealed.store(false, Ordering::SeqCst);
                self.set_state(CheckoutState::Idle).await;
                info!("Checkout abandoned; order left unconfirmed");
            }
            _ => {}
        }
    }
}
