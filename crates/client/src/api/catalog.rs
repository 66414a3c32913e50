//! Catalog service client with read caching.
//!
//! Menu data is read-mostly, so lookups are cached with `moka`
//! (5-minute TTL). Carts and orders are never cached.

use std::time::Duration;

use moka::future::Cache;
use tracing::{debug, instrument};

use quickbite_core::{MenuItemId, RestaurantId};

use super::backend::CatalogBackend;
use super::types::MenuItemDto;
use super::{ApiError, RestClient};

/// Cached catalog values.
#[derive(Clone)]
enum CacheValue {
    Item(Box<MenuItemDto>),
    Menu(Vec<MenuItemDto>),
}

/// Client for the menu catalog.
#[derive(Clone)]
pub struct CatalogClient {
    rest: RestClient,
    cache: Cache<String, CacheValue>,
}

impl CatalogClient {
    #[must_use]
    pub fn new(rest: RestClient) -> Self {
        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(Duration::from_secs(300)) // 5 minutes
            .build();
        Self { rest, cache }
    }

    /// Invalidate all cached catalog data.
    pub async fn invalidate_all(&self) {
        self.cache.invalidate_all();
        self.cache.run_pending_tasks().await;
    }
}

impl CatalogBackend for CatalogClient {
    #[instrument(skip(self), fields(item = %item))]
    async fn menu_item(&self, item: MenuItemId) -> Result<MenuItemDto, ApiError> {
        let cache_key = format!("item:{item}");

        if let Some(CacheValue::Item(cached)) = self.cache.get(&cache_key).await {
            debug!("Cache hit for menu item");
            return Ok(*cached);
        }

        let dto: MenuItemDto = self.rest.get_json(&format!("menu-items/{item}")).await?;

        self.cache
            .insert(cache_key, CacheValue::Item(Box::new(dto.clone())))
            .await;

        Ok(dto)
    }

    #[instrument(skip(self), fields(restaurant = %restaurant))]
    async fn restaurant_menu(
        &self,
        restaurant: RestaurantId,
    ) -> Result<Vec<MenuItemDto>, ApiError> {
        let cache_key = format!("menu:{restaurant}");

        if let Some(CacheValue::Menu(cached)) = self.cache.get(&cache_key).await {
            debug!("Cache hit for restaurant menu");
            return Ok(cached);
        }

        let items: Vec<MenuItemDto> = self
            .rest
            .get_json(&format!("restaurants/{restaurant}/menu-items"))
            .await?;

        self.cache
            .insert(cache_key, CacheValue::Menu(items.clone()))
            .await;

        Ok(items)
    }
}
