use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// Role identifier used for RBAC.
///
/// Roles are opaque strings so that the role names sent by the server map
/// onto them without translation. The portal's built-in roles are exposed as
/// associated constants; the absence of a role is modelled as `Option<&Role>`
/// being `None`, never as a magic string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Role(Cow<'static, str>);

impl Role {
    pub const ADMINISTRATOR: Role = Role::from_static("admin");
    pub const VOLUNTEER: Role = Role::from_static("volunteer");
    pub const PARTICIPANT: Role = Role::from_static("participant");
    pub const APPLICANT: Role = Role::from_static("applicant");

    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub const fn from_static(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}
