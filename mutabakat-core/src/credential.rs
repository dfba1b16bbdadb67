//! Session credential access
//!
//! The core never issues or refreshes tokens. It only reads whatever the host
//! application currently holds.

use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

/// Opaque bearer token for the current session
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// The raw token
    pub fn token(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Credential").field(&"<redacted>").finish()
    }
}

impl From<&str> for Credential {
    fn from(token: &str) -> Self {
        Self::new(token)
    }
}

impl From<String> for Credential {
    fn from(token: String) -> Self {
        Self(token)
    }
}

/// Supplies the current credential, if one exists
pub trait CredentialSource: Send + Sync {
    /// Current non-empty credential, or `None` while signed out
    fn credential(&self) -> Option<Credential>;
}

impl CredentialSource for Credential {
    fn credential(&self) -> Option<Credential> {
        (!self.is_empty()).then(|| self.clone())
    }
}

/// Credential slot the host can replace at any time (sign-in, sign-out)
#[derive(Debug, Clone, Default)]
pub struct SharedCredential {
    inner: Arc<RwLock<Option<Credential>>>,
}

impl SharedCredential {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, credential: Credential) {
        *self.inner.write().unwrap_or_else(PoisonError::into_inner) = Some(credential);
    }

    pub fn clear(&self) {
        *self.inner.write().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

impl CredentialSource for SharedCredential {
    fn credential(&self) -> Option<Credential> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .filter(|c| !c.is_empty())
    }
}
