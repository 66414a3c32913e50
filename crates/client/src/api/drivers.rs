//! Driver profile client.

use tracing::instrument;

use quickbite_core::DriverId;

use super::backend::DriverBackend;
use super::types::DriverDto;
use super::{ApiError, RestClient};

/// Client for driver profile reads.
#[derive(Clone)]
pub struct DriverClient {
    rest: RestClient,
}

impl DriverClient {
    #[must_use]
    pub const fn new(rest: RestClient) -> Self {
        Self { rest }
    }
}

impl DriverBackend for DriverClient {
    #[instrument(skip(self), fields(driver = %driver))]
    async fn driver(&self, driver: DriverId) -> Result<DriverDto, ApiError> {
        self.rest.get_json(&format!("drivers/{driver}")).await
    }
}
