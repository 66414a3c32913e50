//! Typed REST clients for the backend services.
//!
//! One client per service, all sharing [`RestClient`]: a `reqwest`-backed
//! base that injects the session bearer token, inspects status codes before
//! parsing, and captures response bodies for diagnostics. Backend seams are
//! the traits in [`backend`]; tests substitute in-memory implementations.

pub mod backend;
pub mod types;

mod cart;
mod catalog;
mod delivery;
mod drivers;
mod orders;
mod payments;

pub use cart::CartClient;
pub use catalog::CatalogClient;
pub use delivery::{AssignOutcome, DeliveryClient};
pub use drivers::DriverClient;
pub use orders::OrderClient;
pub use payments::PaymentClient;

use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use url::Url;

use crate::config::ClientConfig;
use crate::session::Session;

/// Errors from the backend API layer.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Transport-level failure.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Backend returned a non-success status.
    #[error("API error: {status} - {message}")]
    Status { status: u16, message: String },

    /// Resource does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// No session, or the backend rejected the token.
    #[error("not authenticated")]
    NotAuthenticated,

    /// Response body did not match the expected shape.
    #[error("Parse error: {0}")]
    Parse(String),

    /// A path could not be joined onto the base URL.
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),
}

impl ApiError {
    /// Whether this error is the backend saying the referenced resource is
    /// invalid (as opposed to a transient or server-side failure).
    #[must_use]
    pub const fn is_client_rejection(&self) -> bool {
        matches!(self, Self::Status { status: 400 | 409 | 410 | 422, .. })
    }

    /// The message to show the user for this error. Transport and server
    /// detail (status lines, captured body text) stays in the logs.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::NotAuthenticated => "Please sign in and try again.".to_string(),
            Self::NotFound(_) => "That item could not be found.".to_string(),
            _ => "Something went wrong. Please try again.".to_string(),
        }
    }
}

/// Shared REST transport for all service clients.
///
/// Cheaply cloneable via `Arc`.
#[derive(Clone)]
pub struct RestClient {
    inner: Arc<RestClientInner>,
}

struct RestClientInner {
    http: reqwest::Client,
    base: Url,
    session: Session,
}

impl RestClient {
    /// Create a transport for the configured gateway.
    #[must_use]
    pub fn new(config: &ClientConfig, session: Session) -> Self {
        let mut base = config.api_base.clone();
        // Url::join treats a base without a trailing slash as a file path
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        Self {
            inner: Arc::new(RestClientInner {
                http: reqwest::Client::new(),
                base,
                session,
            }),
        }
    }

    /// The session this transport authenticates with.
    #[must_use]
    pub fn session(&self) -> &Session {
        &self.inner.session
    }

    fn url(&self, path: &str) -> Result<Url, ApiError> {
        Ok(self.inner.base.join(path)?)
    }

    fn authorize(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.inner.session.bearer() {
            Some((_, bearer)) => builder.header("Authorization", bearer),
            None => builder,
        }
    }

    /// Send a request and return `(status, body text)`.
    ///
    /// Maps 401 to `NotAuthenticated`; all other statuses are returned to
    /// the caller for interpretation.
    async fn dispatch(
        &self,
        builder: reqwest::RequestBuilder,
    ) -> Result<(u16, String), ApiError> {
        let response = self.authorize(builder).send().await?;
        let status = response.status().as_u16();

        // Body text is captured up front for error diagnostics
        let body = response.text().await?;

        if status == 401 {
            return Err(ApiError::NotAuthenticated);
        }
        Ok((status, body))
    }

    fn parse<T: DeserializeOwned>(path: &str, body: &str) -> Result<T, ApiError> {
        serde_json::from_str(body).map_err(|e| {
            tracing::error!(
                path = %path,
                error = %e,
                body = %body.chars().take(500).collect::<String>(),
                "Failed to parse backend response"
            );
            ApiError::Parse(e.to_string())
        })
    }

    fn status_error(path: &str, status: u16, body: &str) -> ApiError {
        let message = body.chars().take(200).collect::<String>();
        tracing::error!(path = %path, status, body = %message, "Backend returned non-success status");
        ApiError::Status { status, message }
    }

    /// `GET` a JSON resource.
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let url = self.url(path)?;
        let (status, body) = self.dispatch(self.inner.http.get(url)).await?;
        match status {
            200..=299 => Self::parse(path, &body),
            404 => Err(ApiError::NotFound(path.to_string())),
            _ => Err(Self::status_error(path, status, &body)),
        }
    }

    /// `GET` a JSON resource that may legitimately not exist (404 -> `None`).
    pub async fn get_json_opt<T: DeserializeOwned>(
        &self,
        path: &str,
    ) -> Result<Option<T>, ApiError> {
        match self.get_json(path).await {
            Ok(value) => Ok(Some(value)),
            Err(ApiError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// `POST` a JSON body and parse a JSON response.
    pub async fn post_json<B: Serialize + Sync, T: DeserializeOwned>(
        &self,
        path: &str,
        request: &B,
    ) -> Result<T, ApiError> {
        let url = self.url(path)?;
        let (status, body) = self
            .dispatch(self.inner.http.post(url).json(request))
            .await?;
        match status {
            200..=299 => Self::parse(path, &body),
            404 => Err(ApiError::NotFound(path.to_string())),
            _ => Err(Self::status_error(path, status, &body)),
        }
    }

    /// `POST` a JSON body where 404 is a meaningful business signal
    /// rather than an error (`Ok(None)`).
    pub async fn post_json_opt<B: Serialize + Sync, T: DeserializeOwned>(
        &self,
        path: &str,
        request: &B,
    ) -> Result<Option<T>, ApiError> {
        let url = self.url(path)?;
        let (status, body) = self
            .dispatch(self.inner.http.post(url).json(request))
            .await?;
        match status {
            200..=299 => Self::parse(path, &body).map(Some),
            404 => Ok(None),
            _ => Err(Self::status_error(path, status, &body)),
        }
    }

    /// `POST` with no body, discarding any response payload.
    pub async fn post_unit(&self, path: &str) -> Result<(), ApiError> {
        let url = self.url(path)?;
        let (status, body) = self.dispatch(self.inner.http.post(url)).await?;
        match status {
            200..=299 => Ok(()),
            404 => Err(ApiError::NotFound(path.to_string())),
            _ => Err(Self::status_error(path, status, &body)),
        }
    }

    /// `PATCH` a JSON body, discarding any response payload.
    pub async fn patch_unit<B: Serialize + Sync>(
        &self,
        path: &str,
        request: &B,
    ) -> Result<(), ApiError> {
        let url = self.url(path)?;
        let (status, body) = self
            .dispatch(self.inner.http.patch(url).json(request))
            .await?;
        match status {
            200..=299 => Ok(()),
            404 => Err(ApiError::NotFound(path.to_string())),
            _ => Err(Self::status_error(path, status, &body)),
        }
    }

    /// `PUT` a JSON body, discarding any response payload.
    pub async fn put_unit<B: Serialize + Sync>(
        &self,
        path: &str,
        request: &B,
    ) -> Result<(), ApiError> {
        let url = self.url(path)?;
        let (status, body) = self
            .dispatch(self.inner.http.put(url).json(request))
            .await?;
        match status {
            200..=299 => Ok(()),
            404 => Err(ApiError::NotFound(path.to_string())),
            _ => Err(Self::status_error(path, status, &body)),
        }
    }

    /// `DELETE` a resource.
    pub async fn delete_unit(&self, path: &str) -> Result<(), ApiError> {
        let url = self.url(path)?;
        let (status, body) = self.dispatch(self.inner.http.delete(url)).await?;
        match status {
            200..=299 => Ok(()),
            404 => Err(ApiError::NotFound(path.to_string())),
            _ => Err(Self::status_error(path, status, &body)),
        }
    }
}
