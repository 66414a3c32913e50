//! Payment initiation adapter.
//!
//! Translates order, amount, and card details into the external gateway's
//! submission payload. Card fields are validated locally before any network
//! call; a malformed gateway response blocks the handoff entirely rather
//! than redirecting the user with an incomplete payload.

use std::sync::OnceLock;

use regex::Regex;
use rust_decimal::Decimal;
use secrecy::{ExposeSecret, SecretString};
use tracing::instrument;

use quickbite_core::{OrderId, PaymentMethod};

use crate::api::ApiError;
use crate::api::backend::PaymentBackend;
use crate::api::types::{GatewaySession, PaymentRequest};

/// Payload fields the gateway contract requires; a session missing any of
/// these is unusable.
const REQUIRED_SESSION_FIELDS: &[&str] = &["merchantId", "orderId", "amount"];

fn expiry_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        #[allow(clippy::unwrap_used)] // pattern is a literal, checked by tests
        Regex::new(r"^(0[1-9]|1[0-2])/\d{2}$").unwrap()
    })
}

/// Errors from payment initiation.
#[derive(Debug, thiserror::Error)]
pub enum PaymentError {
    /// Card details failed local validation; nothing was sent.
    #[error("invalid card details: {0}")]
    Validation(String),

    /// The backend's gateway payload is incomplete; handoff blocked.
    #[error("invalid payment session: {0}")]
    InvalidSession(String),

    #[error(transparent)]
    Backend(#[from] ApiError),
}

/// Card details from the checkout sub-form.
///
/// Number and CVV never appear in logs or `Debug` output.
#[derive(Clone)]
pub struct CardDetails {
    number: SecretString,
    expiry: String,
    cvv: SecretString,
}

impl CardDetails {
    #[must_use]
    pub fn new(number: impl Into<String>, expiry: impl Into<String>, cvv: impl Into<String>) -> Self {
        Self {
            number: SecretString::from(number.into()),
            expiry: expiry.into(),
            cvv: SecretString::from(cvv.into()),
        }
    }
}

impl std::fmt::Debug for CardDetails {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CardDetails")
            .field("number", &"[REDACTED]")
            .field("expiry", &self.expiry)
            .field("cvv", &"[REDACTED]")
            .finish()
    }
}

/// Validate card fields locally. Fails fast with a descriptive message on
/// the first violation; no partial submission.
///
/// # Errors
///
/// Returns [`PaymentError::Validation`] describing the offending field.
pub fn validate_card(card: &CardDetails) -> Result<(), PaymentError> {
    let digits: String = card
        .number
        .expose_secret()
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();
    if digits.len() != 16 || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(PaymentError::Validation(
            "card number must be exactly 16 digits".into(),
        ));
    }

    if !expiry_pattern().is_match(&card.expiry) {
        return Err(PaymentError::Validation(
            "expiry must be in MM/YY format".into(),
        ));
    }

    let cvv = card.cvv.expose_secret();
    if !(3..=4).contains(&cvv.len()) || !cvv.chars().all(|c| c.is_ascii_digit()) {
        return Err(PaymentError::Validation("CVV must be 3 or 4 digits".into()));
    }

    Ok(())
}

/// A one-time auto-submitting form for the gateway's hosted checkout.
///
/// Consuming it via [`GatewayHandoff::into_fields`] hands browser control
/// to the gateway; the result arrives later via return-redirect, outside
/// this subsystem.
#[derive(Debug, Clone)]
pub struct GatewayHandoff {
    pub action_url: String,
    fields: Vec<(String, String)>,
}

impl GatewayHandoff {
    /// The hidden form fields, in submission order, hash last.
    #[must_use]
    pub fn into_fields(self) -> Vec<(String, String)> {
        self.fields
    }
}

/// Check the gateway session for completeness and build the handoff form.
///
/// # Errors
///
/// Returns [`PaymentError::InvalidSession`] when the payload is missing the
/// gateway URL, the integrity hash, or any required field.
pub fn build_handoff(session: GatewaySession) -> Result<GatewayHandoff, PaymentError> {
    if session.gateway_url.trim().is_empty() {
        return Err(PaymentError::InvalidSession("missing gateway URL".into()));
    }

    let hash = match session.hash {
        Some(hash) if !hash.trim().is_empty() => hash,
        _ => return Err(PaymentError::InvalidSession("missing integrity hash".into())),
    };

    for required in REQUIRED_SESSION_FIELDS {
        if !session.fields.contains_key(*required) {
            return Err(PaymentError::InvalidSession(format!(
                "missing required field: {required}"
            )));
        }
    }

    let mut fields: Vec<(String, String)> = session.fields.into_iter().collect();
    fields.push(("hash".to_string(), hash));

    Ok(GatewayHandoff {
        action_url: session.gateway_url,
        fields,
    })
}

/// Adapter around the payment service's process call.
pub struct PaymentAdapter<P> {
    backend: P,
}

impl<P: PaymentBackend> PaymentAdapter<P> {
    pub const fn new(backend: P) -> Self {
        Self { backend }
    }

    #[cfg(test)]
    pub(crate) const fn backend(&self) -> &P {
        &self.backend
    }

    /// Validate the card, obtain a gateway session, and build the handoff.
    ///
    /// # Errors
    ///
    /// Validation and session errors per [`validate_card`] and
    /// [`build_handoff`]; backend errors are passed through.
    #[instrument(skip(self, card), fields(order = %order))]
    pub async fn initiate(
        &self,
        order: OrderId,
        amount: Decimal,
        card: &CardDetails,
    ) -> Result<GatewayHandoff, PaymentError> {
        validate_card(card)?;

        let session = self
            .backend
            .process(&PaymentRequest {
                order_id: order,
                amount,
                method: PaymentMethod::Card,
            })
            .await?;

        build_handoff(session)
    }
}
