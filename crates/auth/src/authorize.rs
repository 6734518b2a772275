use thiserror::Error;

use crate::{AccessControl, Action, PermissionQuery, Resource, Role};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    /// A check that needs a role was attempted without one.
    #[error("role not found")]
    RoleNotFound,

    #[error("forbidden: role '{role}' may not {action} on '{resource}'")]
    Forbidden {
        role: Role,
        resource: Resource,
        action: Action,
    },

    #[error("role inheritance cycle: {0:?}")]
    CyclicInheritance(Vec<Role>),

    #[error("role '{role}' extends unknown role '{parent}'")]
    UnknownParent { role: Role, parent: Role },

    #[error("invalid action '{0}' (expected '<create|read|update|delete>:<any|own>')")]
    InvalidAction(String),
}

/// Assert that a role is present.
///
/// Use at call sites where a permission check is meaningless without a role;
/// everywhere else pass the `Option` straight to [`AccessControl::resolve`].
pub fn require_role(role: Option<&Role>) -> Result<&Role, AuthzError> {
    role.ok_or(AuthzError::RoleNotFound)
}

/// Authorize a role-dependent action.
///
/// - No IO
/// - No panics
/// - Missing role is `RoleNotFound`, a denial is `Forbidden`
pub fn authorize(
    access: &AccessControl,
    role: Option<&Role>,
    resource: &Resource,
    action: Action,
) -> Result<PermissionQuery, AuthzError> {
    let role = require_role(role)?;
    access.check(role, resource, action).inspect_err(|err| {
        tracing::debug!(%role, %resource, %action, error = %err, "authorization denied");
    })
}
