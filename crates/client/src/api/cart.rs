//! Cart service client.

use tracing::instrument;

use quickbite_core::{MenuItemId, UserId};

use super::backend::CartBackend;
use super::types::{CartDto, NewCartLine, QuantityUpdate};
use super::{ApiError, RestClient};

/// Client for the cart-by-user resource.
///
/// Never cached: the cart is mutable state and the store's consistency
/// model is mutate-then-refetch.
#[derive(Clone)]
pub struct CartClient {
    rest: RestClient,
}

impl CartClient {
    #[must_use]
    pub const fn new(rest: RestClient) -> Self {
        Self { rest }
    }
}

impl CartBackend for CartClient {
    #[instrument(skip(self), fields(user = %user))]
    async fn get_cart(&self, user: UserId) -> Result<Option<CartDto>, ApiError> {
        self.rest.get_json_opt(&format!("carts/user/{user}")).await
    }

    #[instrument(skip(self, line), fields(user = %user, menu_item = %line.menu_item_id))]
    async fn add_item(&self, user: UserId, line: &NewCartLine) -> Result<(), ApiError> {
        let path = format!("carts/user/{user}/items");
        let _: CartDto = self.rest.post_json(&path, line).await?;
        Ok(())
    }

    #[instrument(skip(self), fields(user = %user, menu_item = %menu_item))]
    async fn update_item(
        &self,
        user: UserId,
        menu_item: MenuItemId,
        quantity: u32,
    ) -> Result<(), ApiError> {
        let path = format!("carts/user/{user}/items/{menu_item}");
        self.rest.patch_unit(&path, &QuantityUpdate { quantity }).await
    }

    #[instrument(skip(self), fields(user = %user, menu_item = %menu_item))]
    async fn remove_item(&self, user: UserId, menu_item: MenuItemId) -> Result<(), ApiError> {
        self.rest
            .delete_unit(&format!("carts/user/{user}/items/{menu_item}"))
            .await
    }

    #[instrument(skip(self), fields(user = %user))]
    async fn clear(&self, user: UserId) -> Result<(), ApiError> {
        self.rest.delete_unit(&format!("carts/user/{user}")).await
    }
}
