//! Application state: wires configuration, session, clients, and services
//! into one facade the UI shell drives.

use std::sync::Arc;
use std::time::Duration;

use tracing::{instrument, warn};

use quickbite_core::{OrderId, UserId};

use crate::api::backend::{
    CartBackend, CatalogBackend, DeliveryBackend, DriverBackend, OrderBackend, PaymentBackend,
};
use crate::api::types::OrderDto;
use crate::api::{
    CartClient, CatalogClient, DeliveryClient, DriverClient, OrderClient, PaymentClient,
    RestClient,
};
use crate::config::ClientConfig;
use crate::error::AppError;
use crate::services::checkout::LocationOutcome;
use crate::services::{
    CartStore, CheckoutCoordinator, CheckoutForm, SubmitOutcome, TrackingFeed, TrackingHandle,
    TrackingSnapshot,
};
use crate::session::Session;
use crate::surface::{
    GeolocationProvider, LocationSource, MapSurface, Notifier, locate_with_timeout,
};
use secrecy::SecretString;
use tokio::sync::watch;

/// The storefront engine facade, generic over backend implementations so
/// the whole pipeline runs against in-memory fakes in tests.
pub struct Storefront<C, K, O, D, R, P> {
    session: Session,
    cart: CartStore<C, K>,
    checkout: CheckoutCoordinator<O, D, P>,
    tracking: TrackingFeed<O, D, R>,
    orders: O,
    geolocation_timeout: Duration,
}

/// The production engine, wired to the REST clients.
pub type AppState = Storefront<
    CartClient,
    CatalogClient,
    OrderClient,
    DeliveryClient,
    DriverClient,
    PaymentClient,
>;

impl AppState {
    /// Build the production engine from configuration.
    ///
    /// If the configuration carries a pre-provisioned session token along
    /// with `user_id`, the session is installed immediately.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Session`] if a pre-provisioned token is blank.
    pub fn from_config(
        config: &ClientConfig,
        user_id: Option<UserId>,
        notifier: Arc<dyn Notifier>,
        map: Arc<dyn MapSurface>,
    ) -> Result<Self, AppError> {
        let session = Session::anonymous();
        if let (Some(user), Some(token)) = (user_id, config.session_token.clone()) {
            session.sign_in(user, token)?;
        }

        let rest = RestClient::new(config, session.clone());
        Ok(Self::assemble(
            CartClient::new(rest.clone()),
            CatalogClient::new(rest.clone()),
            OrderClient::new(rest.clone()),
            DeliveryClient::new(rest.clone()),
            DriverClient::new(rest.clone()),
            PaymentClient::new(rest),
            session,
            notifier,
            map,
            config.poll_interval,
            config.verify_delay,
            config.geolocation_timeout,
        ))
    }
}

impl<C, K, O, D, R, P> Storefront<C, K, O, D, R, P>
where
    C: CartBackend,
    K: CatalogBackend,
    O: OrderBackend + Clone + Send + Sync + 'static,
    D: DeliveryBackend + Clone + Send + Sync + 'static,
    R: DriverBackend + Send + Sync + 'static,
    P: PaymentBackend,
{
    /// Wire backends, session, and surfaces into a full engine.
    #[allow(clippy::too_many_arguments)]
    pub fn assemble(
        cart: C,
        catalog: K,
        orders: O,
        delivery: D,
        drivers: R,
        payments: P,
        session: Session,
        notifier: Arc<dyn Notifier>,
        map: Arc<dyn MapSurface>,
        poll_interval: Duration,
        verify_delay: Duration,
        geolocation_timeout: Duration,
    ) -> Self {
        Self {
            cart: CartStore::new(cart, catalog, session.clone(), notifier.clone()),
            checkout: CheckoutCoordinator::new(
                orders.clone(),
                delivery.clone(),
                payments,
                session.clone(),
                notifier,
                map.clone(),
                verify_delay,
            ),
            tracking: TrackingFeed::new(orders.clone(), delivery, drivers, map, poll_interval),
            orders,
            session,
            geolocation_timeout,
        }
    }

    /// The session handle shared by every client.
    #[must_use]
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Install credentials after the shell completes sign-in.
    ///
    /// # Errors
    ///
    /// Rejects blank tokens.
    pub fn sign_in(&self, user: UserId, token: SecretString) -> Result<(), AppError> {
        self.session.sign_in(user, token)?;
        Ok(())
    }

    /// Discard the session. Cart and order state on the server is
    /// untouched; the local snapshot simply stops refreshing.
    pub fn sign_out(&self) {
        self.session.sign_out();
    }

    /// The cart store.
    #[must_use]
    pub fn cart(&self) -> &CartStore<C, K> {
        &self.cart
    }

    /// The checkout coordinator.
    #[must_use]
    pub fn checkout(&self) -> &CheckoutCoordinator<O, D, P> {
        &self.checkout
    }

    /// Submit the current cart through checkout.
    ///
    /// On a confirmed order or a gateway handoff the cart is cleared; a
    /// clear failure is logged and swallowed because the order itself has
    /// already succeeded.
    ///
    /// # Errors
    ///
    /// Checkout validation and pipeline errors per
    /// [`crate::services::CheckoutError`].
    #[instrument(skip(self, form))]
    pub async fn place_order(&self, form: &CheckoutForm) -> Result<SubmitOutcome, AppError> {
        let snapshot = self.cart.snapshot().await;
        let outcome = self.checkout.submit(&snapshot, form).await?;
        if matches!(
            outcome,
            SubmitOutcome::Confirmed(_) | SubmitOutcome::PaymentHandoff(_)
        ) {
            self.clear_cart_after_order().await;
        }
        Ok(outcome)
    }

    /// Resume a parked checkout after the user confirms the found driver.
    ///
    /// # Errors
    ///
    /// Same surface as [`Storefront::place_order`].
    #[instrument(skip(self))]
    pub async fn resume_checkout(&self) -> Result<SubmitOutcome, AppError> {
        let outcome = self.checkout.confirm_resume().await?;
        if matches!(
            outcome,
            SubmitOutcome::Confirmed(_) | SubmitOutcome::PaymentHandoff(_)
        ) {
            self.clear_cart_after_order().await;
        }
        Ok(outcome)
    }

    async fn clear_cart_after_order(&self) {
        if let Err(e) = self.cart.clear().await {
            warn!(error = %e, "Failed to clear cart after successful order");
        }
    }

    /// Route a customer location change into the checkout coordinator.
    ///
    /// # Errors
    ///
    /// Assignment errors when a pending retry fails fatally.
    pub async fn update_location(
        &self,
        source: LocationSource,
        point: quickbite_core::GeoPoint,
    ) -> Result<LocationOutcome, AppError> {
        Ok(self.checkout.handle_location_update(source, point).await?)
    }

    /// Acquire a device position (bounded by the configured timeout) and
    /// route it as a location update.
    ///
    /// # Errors
    ///
    /// Geolocation timeout or provider failure, then the same surface as
    /// [`Storefront::update_location`].
    pub async fn locate_device<G: GeolocationProvider>(
        &self,
        provider: &G,
    ) -> Result<LocationOutcome, AppError> {
        let point = locate_with_timeout(provider, self.geolocation_timeout).await?;
        self.update_location(LocationSource::DeviceGeolocation, point)
            .await
    }

    /// Open a live tracking feed for an order.
    ///
    /// # Errors
    ///
    /// Fails if the order has no delivery record yet.
    pub async fn track_order(
        &self,
        order: OrderId,
    ) -> Result<(watch::Receiver<TrackingSnapshot>, TrackingHandle), AppError> {
        Ok(self.tracking.open(order).await?)
    }

    /// The signed-in user's order history, newest first per the backend's
    /// ordering.
    ///
    /// # Errors
    ///
    /// [`AppError::Backend`] with `NotAuthenticated` when signed out.
    pub async fn order_history(&self) -> Result<Vec<OrderDto>, AppError> {
        let user = self
            .session
            .user_id()
            .ok_or(AppError::Backend(crate::api::ApiError::NotAuthenticated))?;
        Ok(self.orders.by_user(user).await?)
    }

    /// Cancel an order that has not yet been picked up.
    ///
    /// # Errors
    ///
    /// Backend rejection when the order is past the cancellable window.
    pub async fn cancel_order(&self, order: OrderId) -> Result<(), AppError> {
        Ok(self.orders.cancel(order).await?)
    }
}
