//! The authenticated session.
//!
//! The engine keeps exactly one piece of durable client state: the signed-in
//! user's identity and bearer token. Everything else (cart, orders, delivery
//! records) is a cache of last-fetched server state.

use std::sync::{Arc, RwLock};

use secrecy::{ExposeSecret, SecretString};
use quickbite_core::UserId;

/// Credentials for the signed-in user.
#[derive(Clone)]
pub struct Credentials {
    pub user_id: UserId,
    token: SecretString,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("user_id", &self.user_id)
            .field("token", &"[REDACTED]")
            .finish()
    }
}

/// Shared handle to the current session state.
///
/// Cheaply cloneable; every API client holds one and checks it before
/// issuing a request. Cart and order mutations without a session fail with
/// `NotAuthenticated` - the engine never falls back to a guest identity.
#[derive(Clone, Default)]
pub struct Session {
    inner: Arc<RwLock<Option<Credentials>>>,
}

impl Session {
    /// Create a signed-out session.
    #[must_use]
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Install credentials after a successful sign-in.
    ///
    /// Blank tokens are rejected so a broken auth flow cannot install an
    /// unusable session.
    pub fn sign_in(&self, user_id: UserId, token: SecretString) -> Result<(), SessionError> {
        if token.expose_secret().trim().is_empty() {
            return Err(SessionError::BlankToken);
        }
        let mut guard = self.inner.write().unwrap_or_else(std::sync::PoisonError::into_inner);
        *guard = Some(Credentials { user_id, token });
        Ok(())
    }

    /// Discard the current credentials.
    pub fn sign_out(&self) {
        let mut guard = self.inner.write().unwrap_or_else(std::sync::PoisonError::into_inner);
        *guard = None;
    }

    /// The signed-in user, if any.
    #[must_use]
    pub fn user_id(&self) -> Option<UserId> {
        let guard = self.inner.read().unwrap_or_else(std::sync::PoisonError::into_inner);
        guard.as_ref().map(|c| c.user_id)
    }

    /// The signed-in user and a bearer header value, or `None` when
    /// signed out.
    #[must_use]
    pub fn bearer(&self) -> Option<(UserId, String)> {
        let guard = self.inner.read().unwrap_or_else(std::sync::PoisonError::into_inner);
        guard
            .as_ref()
            .map(|c| (c.user_id, format!("Bearer {}", c.token.expose_secret())))
    }
}

/// Errors installing a session.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("session token must not be blank")]
    BlankToken,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anonymous_session_has_no_user() {
        let session = Session::anonymous();
        assert!(session.user_id().is_none());
        assert!(session.bearer().is_none());
    }

    #[test]
    fn test_sign_in_then_out() {
        let session = Session::anonymous();
        session
            .sign_in(UserId::new(9), SecretString::from("tok-123"))
            .expect("sign in");
        let (user, header) = session.bearer().expect("signed in");
        assert_eq!(user, UserId::new(9));
        assert_eq!(header, "Bearer tok-123");

        session.sign_out();
        assert!(session.user_id().is_none());
    }

    #[test]
    fn test_blank_token_rejected() {
        let session = Session::anonymous();
        let result = session.sign_in(UserId::new(1), SecretString::from("   "));
        assert!(matches!(result, Err(SessionError::BlankToken)));
        assert!(session.user_id().is_none());
    }

    #[test]
    fn test_debug_redacts_token() {
        let session = Session::anonymous();
        session
            .sign_in(UserId::new(1), SecretString::from("very-secret"))
            .expect("sign in");
        let guard = session.inner.read().expect("lock");
        let debug = format!("{:?}", guard.as_ref().expect("credentials"));
        assert!(!debug.contains("very-secret"));
        assert!(debug.contains("REDACTED"));
    }
}
