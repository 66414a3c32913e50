//! Cart store: single source of truth for the active cart.
//!
//! Consistency model is mutate-then-refetch: every mutation goes to the
//! backend first, then the full cart is re-read and the local snapshot is
//! replaced wholesale. That trades a round trip for agreement with
//! server-computed state; the latest completed fetch always wins.

use std::sync::Arc;

use rust_decimal::Decimal;
use tokio::sync::RwLock;
use tracing::{instrument, warn};

use quickbite_core::{CartId, MenuItemId, RestaurantId, display_amount};

use crate::api::ApiError;
use crate::api::backend::{CartBackend, CatalogBackend};
use crate::api::types::{CartDto, NewCartLine};
use crate::session::Session;
use crate::surface::{Notifier, Severity};

/// Errors from cart operations.
#[derive(Debug, thiserror::Error)]
pub enum CartError {
    /// No session; cart mutations never fall back to a guest cart.
    #[error("sign in to modify your cart")]
    NotAuthenticated,

    /// The cart already holds items from another restaurant.
    ///
    /// Policy decision: cross-restaurant adds are rejected rather than
    /// silently replacing the cart.
    #[error("your cart already has items from another restaurant")]
    RestaurantMismatch {
        cart: RestaurantId,
        requested: RestaurantId,
    },

    /// The catalog marks this item as unavailable.
    #[error("this item is currently unavailable")]
    ItemUnavailable(MenuItemId),

    #[error(transparent)]
    Backend(#[from] ApiError),
}

impl CartError {
    /// The message to show the user for this error. Backend failures
    /// collapse to the transport layer's generic message.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Backend(e) => e.user_message(),
            other => other.to_string(),
        }
    }
}

/// One display line of the local cart snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct CartLine {
    pub menu_item_id: MenuItemId,
    pub restaurant_id: RestaurantId,
    pub name: String,
    pub unit_price: Decimal,
    pub quantity: u32,
    pub line_total: Decimal,
    pub image: Option<String>,
}

/// Local cache of the last-fetched cart state.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CartSnapshot {
    pub cart_id: Option<CartId>,
    /// All lines share one restaurant (single-restaurant cart invariant).
    pub restaurant_id: Option<RestaurantId>,
    pub lines: Vec<CartLine>,
    pub total: Decimal,
}

impl CartSnapshot {
    /// An empty cart.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Total formatted for display.
    #[must_use]
    pub fn display_total(&self) -> String {
        display_amount(self.total)
    }
}

/// Build a snapshot from a fetched cart, excluding lines whose price or
/// quantity failed numeric decoding. Such lines are a data-integrity
/// problem on the backend side; they are logged and skipped, never thrown.
fn build_snapshot(dto: Option<&CartDto>) -> CartSnapshot {
    let Some(cart) = dto else {
        return CartSnapshot::empty();
    };

    let mut lines = Vec::with_capacity(cart.items.len());
    let mut total = Decimal::ZERO;

    for item in &cart.items {
        let (Some(unit_price), Some(quantity)) = (item.unit_price, item.quantity) else {
            warn!(
                cart = %cart.cart_id,
                menu_item = %item.menu_item_id,
                "Cart line has non-numeric price or quantity; excluding from total"
            );
            continue;
        };

        let line_total = unit_price * Decimal::from(quantity);
        total += line_total;
        lines.push(CartLine {
            menu_item_id: item.menu_item_id,
            restaurant_id: item.restaurant_id,
            name: item.name.clone(),
            unit_price,
            quantity,
            line_total,
            image: item.image_refs.first().cloned(),
        });
    }

    let restaurant_id = lines.first().map(|line| line.restaurant_id);

    CartSnapshot {
        cart_id: Some(cart.cart_id),
        restaurant_id,
        lines,
        total,
    }
}

/// Single-writer store for the active cart.
///
/// The rest of the application reads through [`CartStore::snapshot`] and
/// mutates through the small API here; there is no other path to cart
/// state.
pub struct CartStore<C, K> {
    backend: C,
    catalog: K,
    session: Session,
    notifier: Arc<dyn Notifier>,
    snapshot: RwLock<CartSnapshot>,
}

impl<C: CartBackend, K: CatalogBackend> CartStore<C, K> {
    pub fn new(backend: C, catalog: K, session: Session, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            backend,
            catalog,
            session,
            notifier,
            snapshot: RwLock::new(CartSnapshot::empty()),
        }
    }

    /// The last-fetched cart state.
    pub async fn snapshot(&self) -> CartSnapshot {
        self.snapshot.read().await.clone()
    }

    fn require_user(&self) -> Result<quickbite_core::UserId, CartError> {
        self.session.user_id().ok_or(CartError::NotAuthenticated)
    }

    /// Re-read the cart from the backend and replace the local snapshot.
    #[instrument(skip(self))]
    pub async fn refresh(&self) -> Result<CartSnapshot, CartError> {
        let user = self.require_user()?;
        let dto = self.backend.get_cart(user).await?;
        let snapshot = build_snapshot(dto.as_ref());
        *self.snapshot.write().await = snapshot.clone();
        Ok(snapshot)
    }

    /// Add an item to the cart.
    ///
    /// Fetches canonical item data (price, name, images) from the catalog
    /// so the cart never trusts UI-supplied prices, then appends/merges on
    /// the backend and resyncs.
    #[instrument(skip(self), fields(menu_item = %menu_item, quantity))]
    pub async fn add_item(
        &self,
        menu_item: MenuItemId,
        quantity: u32,
    ) -> Result<CartSnapshot, CartError> {
        let result = self.add_item_inner(menu_item, quantity).await;
        match &result {
            Ok(_) => self.notifier.notify(Severity::Success, "Added to cart"),
            Err(e) => self.notifier.notify(Severity::Error, &e.user_message()),
        }
        result
    }

    async fn add_item_inner(
        &self,
        menu_item: MenuItemId,
        quantity: u32,
    ) -> Result<CartSnapshot, CartError> {
        let user = self.require_user()?;

        let item = self.catalog.menu_item(menu_item).await?;
        if !item.available {
            return Err(CartError::ItemUnavailable(menu_item));
        }

        // Single-restaurant cart: reject cross-restaurant adds
        let current = self.snapshot.read().await.restaurant_id;
        if let Some(cart_restaurant) = current
            && cart_restaurant != item.restaurant_id
        {
            return Err(CartError::RestaurantMismatch {
                cart: cart_restaurant,
                requested: item.restaurant_id,
            });
        }

        let line = NewCartLine {
            menu_item_id: item.menu_item_id,
            restaurant_id: item.restaurant_id,
            name: item.name,
            unit_price: item.price,
            quantity,
            image_refs: item.image_refs,
        };
        self.backend.add_item(user, &line).await?;
        self.refresh().await
    }

    /// Change the quantity of an existing line.
    #[instrument(skip(self), fields(menu_item = %menu_item, quantity))]
    pub async fn update_quantity(
        &self,
        menu_item: MenuItemId,
        quantity: u32,
    ) -> Result<CartSnapshot, CartError> {
        let result = async {
            let user = self.require_user()?;
            self.backend.update_item(user, menu_item, quantity).await?;
            self.refresh().await
        }
        .await;
        match &result {
            Ok(_) => self.notifier.notify(Severity::Success, "Cart updated"),
            Err(e) => self.notifier.notify(Severity::Error, &e.user_message()),
        }
        result
    }

    /// Remove a line from the cart.
    #[instrument(skip(self), fields(menu_item = %menu_item))]
    pub async fn remove_item(&self, menu_item: MenuItemId) -> Result<CartSnapshot, CartError> {
        let result = async {
            let user = self.require_user()?;
            self.backend.remove_item(user, menu_item).await?;
            self.refresh().await
        }
        .await;
        match &result {
            Ok(_) => self.notifier.notify(Severity::Success, "Removed from cart"),
            Err(e) => self.notifier.notify(Severity::Error, &e.user_message()),
        }
        result
    }

    /// Clear the cart entirely.
    ///
    /// Called by the user explicitly, or by the checkout facade after a
    /// confirmed order - never speculatively.
    #[instrument(skip(self))]
    pub async fn clear(&self) -> Result<CartSnapshot, CartError> {
        let user = self.require_user()?;
        self.backend.clear(user).await?;
        self.refresh().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use quickbite_core::UserId;
    use secrecy::SecretString;

    use crate::api::types::{CartLineDto, MenuItemDto};

    struct SilentNotifier;
    impl Notifier for SilentNotifier {
        fn notify(&self, _: Severity, _: &str) {}
    }

    /// In-memory cart backend with add-merge semantics.
    #[derive(Default)]
    struct FakeCartBackend {
        lines: Mutex<Vec<NewCartLine>>,
        calls: AtomicUsize,
    }

    impl FakeCartBackend {
        fn to_dto(&self, user: UserId) -> Option<CartDto> {
            let lines = self.lines.lock().expect("lock");
            if lines.is_empty() {
                return None;
            }
            Some(CartDto {
                cart_id: CartId::new(1),
                user_id: user,
                items: lines
                    .iter()
                    .map(|line| CartLineDto {
                        menu_item_id: line.menu_item_id,
                        restaurant_id: line.restaurant_id,
                        name: line.name.clone(),
                        unit_price: Some(line.unit_price),
                        quantity: Some(line.quantity),
                        image_refs: line.image_refs.clone(),
                    })
                    .collect(),
            })
        }
    }

    impl CartBackend for FakeCartBackend {
        async fn get_cart(&self, user: UserId) -> Result<Option<CartDto>, ApiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.to_dto(user))
        }

        async fn add_item(&self, _user: UserId, line: &NewCartLine) -> Result<(), ApiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let mut lines = self.lines.lock().expect("lock");
            if let Some(existing) = lines
                .iter_mut()
                .find(|l| l.menu_item_id == line.menu_item_id)
            {
                existing.quantity += line.quantity;
            } else {
                lines.push(line.clone());
            }
            Ok(())
        }

        async fn update_item(
            &self,
            _user: UserId,
            menu_item: MenuItemId,
            quantity: u32,
        ) -> Result<(), ApiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let mut lines = self.lines.lock().expect("lock");
            for line in lines.iter_mut() {
                if line.menu_item_id == menu_item {
                    line.quantity = quantity;
                }
            }
            Ok(())
        }

        async fn remove_item(&self, _user: UserId, menu_item: MenuItemId) -> Result<(), ApiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.lines
                .lock()
                .expect("lock")
                .retain(|line| line.menu_item_id != menu_item);
            Ok(())
        }

        async fn clear(&self, _user: UserId) -> Result<(), ApiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.lines.lock().expect("lock").clear();
            Ok(())
        }
    }

    struct FakeCatalog {
        items: HashMap<i64, MenuItemDto>,
    }

    impl FakeCatalog {
        fn with_items(items: Vec<MenuItemDto>) -> Self {
            Self {
                items: items
                    .into_iter()
                    .map(|item| (item.menu_item_id.as_i64(), item))
                    .collect(),
            }
        }
    }

    impl CatalogBackend for FakeCatalog {
        async fn menu_item(&self, item: MenuItemId) -> Result<MenuItemDto, ApiError> {
            self.items
                .get(&item.as_i64())
                .cloned()
                .ok_or_else(|| ApiError::NotFound(format!("menu-items/{item}")))
        }

        async fn restaurant_menu(
            &self,
            restaurant: RestaurantId,
        ) -> Result<Vec<MenuItemDto>, ApiError> {
            Ok(self
                .items
                .values()
                .filter(|item| item.restaurant_id == restaurant)
                .cloned()
                .collect())
        }
    }

    fn menu_item(id: i64, restaurant: i64, price: i64) -> MenuItemDto {
        MenuItemDto {
            menu_item_id: MenuItemId::new(id),
            restaurant_id: RestaurantId::new(restaurant),
            name: format!("Item {id}"),
            price: Decimal::new(price, 0),
            description: None,
            image_refs: vec![],
            available: true,
        }
    }

    fn signed_in_session() -> Session {
        let session = Session::anonymous();
        session
            .sign_in(UserId::new(1), SecretString::from("tok"))
            .expect("sign in");
        session
    }

    fn store(
        catalog_items: Vec<MenuItemDto>,
        session: Session,
    ) -> CartStore<FakeCartBackend, FakeCatalog> {
        CartStore::new(
            FakeCartBackend::default(),
            FakeCatalog::with_items(catalog_items),
            session,
            Arc::new(SilentNotifier),
        )
    }

    #[tokio::test]
    async fn test_running_total_scenario() {
        let store = store(
            vec![menu_item(10, 1, 500), menu_item(11, 1, 250)],
            signed_in_session(),
        );

        let snapshot = store.add_item(MenuItemId::new(10), 2).await.expect("add");
        assert_eq!(snapshot.total, Decimal::new(1000, 0));

        let snapshot = store.add_item(MenuItemId::new(11), 1).await.expect("add");
        assert_eq!(snapshot.total, Decimal::new(1250, 0));

        let snapshot = store.remove_item(MenuItemId::new(10)).await.expect("remove");
        assert_eq!(snapshot.total, Decimal::new(250, 0));
        assert_eq!(snapshot.display_total(), "$250.00");
    }

    #[tokio::test]
    async fn test_unauthenticated_add_makes_no_backend_calls() {
        let store = store(vec![menu_item(10, 1, 500)], Session::anonymous());

        let result = store.add_item(MenuItemId::new(10), 1).await;
        assert!(matches!(result, Err(CartError::NotAuthenticated)));
        assert_eq!(store.backend.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_cross_restaurant_add_rejected() {
        let store = store(
            vec![menu_item(10, 1, 500), menu_item(20, 2, 300)],
            signed_in_session(),
        );

        store.add_item(MenuItemId::new(10), 1).await.expect("add");
        let result = store.add_item(MenuItemId::new(20), 1).await;
        assert!(matches!(
            result,
            Err(CartError::RestaurantMismatch { .. })
        ));

        // Cart is untouched by the rejected add
        let snapshot = store.snapshot().await;
        assert_eq!(snapshot.lines.len(), 1);
        assert_eq!(snapshot.restaurant_id, Some(RestaurantId::new(1)));
    }

    #[tokio::test]
    async fn test_unavailable_item_rejected() {
        let mut item = menu_item(10, 1, 500);
        item.available = false;
        let store = store(vec![item], signed_in_session());

        let result = store.add_item(MenuItemId::new(10), 1).await;
        assert!(matches!(result, Err(CartError::ItemUnavailable(_))));
    }

    #[test]
    fn test_snapshot_excludes_non_numeric_lines() {
        let cart = CartDto {
            cart_id: CartId::new(1),
            user_id: UserId::new(1),
            items: vec![
                CartLineDto {
                    menu_item_id: MenuItemId::new(10),
                    restaurant_id: RestaurantId::new(1),
                    name: "Good".into(),
                    unit_price: Some(Decimal::new(500, 0)),
                    quantity: Some(2),
                    image_refs: vec![],
                },
                CartLineDto {
                    menu_item_id: MenuItemId::new(11),
                    restaurant_id: RestaurantId::new(1),
                    name: "Bad price".into(),
                    unit_price: None,
                    quantity: Some(1),
                    image_refs: vec![],
                },
            ],
        };

        let snapshot = build_snapshot(Some(&cart));
        assert_eq!(snapshot.lines.len(), 1);
        assert_eq!(snapshot.total, Decimal::new(1000, 0));
    }

    #[test]
    fn test_snapshot_of_missing_cart_is_empty() {
        let snapshot = build_snapshot(None);
        assert!(snapshot.is_empty());
        assert_eq!(snapshot.total, Decimal::ZERO);
        assert!(snapshot.cart_id.is_none());
    }
}
