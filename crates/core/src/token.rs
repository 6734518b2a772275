//! Opaque bearer credential.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

/// Short-lived access credential.
///
/// No client-side structure is assumed beyond "attach as a bearer
/// credential". `Debug` never prints the value so tokens cannot leak into
/// logs through `?token` fields.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(raw: impl Into<String>) -> CoreResult<Self> {
        let raw = raw.into();
        if raw.is_empty() {
            return Err(CoreError::invalid_token("empty"));
        }
        if raw.chars().any(char::is_whitespace) {
            return Err(CoreError::invalid_token("contains whitespace"));
        }
        Ok(Self(raw))
    }

    /// The raw credential, for building an `Authorization` header.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("AccessToken(<redacted>)")
    }
}
