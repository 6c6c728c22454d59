//! Secret values (client secrets, passwords, access tokens) with redacted
//! Debug/Display output.

use crate::{ErrorLocation, RedactError};

use std::fmt;
use std::panic::Location;

use serde::ser::Error;
use zeroize::Zeroize;

/// A secret that never exposes its value in logs or debug output.
///
/// The backing buffer is zeroized when the value is dropped.
#[derive(Clone, PartialEq, Eq)]
pub struct RedactedSecret {
    inner: String,
}

impl RedactedSecret {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            inner: secret.into(),
        }
    }

    /// Get the actual secret value.
    ///
    /// # Security Note
    /// Only call this when building an outgoing header/body or persisting the
    /// value into a credential store.
    #[inline]
    pub fn expose(&self) -> &str {
        &self.inner
    }

    /// Get the secret length (safe to log).
    #[inline]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl From<String> for RedactedSecret {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<&str> for RedactedSecret {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl fmt::Debug for RedactedSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RedactedSecret([REDACTED])")
    }
}

impl fmt::Display for RedactedSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[REDACTED]")
    }
}

impl Drop for RedactedSecret {
    fn drop(&mut self) {
        self.inner.zeroize();
    }
}

// Prevent accidental serialization
impl serde::Serialize for RedactedSecret {
    fn serialize<S>(&self, _serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        Err(S::Error::custom(RedactError::Serialization {
            message: String::from("RedactedSecret cannot be serialized - use expose() explicitly"),
            location: ErrorLocation::from(Location::caller()),
        }))
    }
}
