//! `portal-auth`: advisory role/resource/action authorization for the portal client.
//!
//! Pure data plus a resolution algorithm. No HTTP, no storage: the server
//! remains the authority, this crate only decides which affordances to offer.

pub mod access;
pub mod authorize;
pub mod grant;
pub mod permissions;
pub mod portal;
pub mod roles;

pub use access::{AccessControl, AccessControlBuilder, AccessExplanation, PermissionQuery};
pub use authorize::{AuthzError, authorize, require_role};
pub use grant::{AttributeSet, Grant};
pub use permissions::{Action, Attribute, Possession, Resource, Verb};
pub use portal::portal_policy;
pub use roles::Role;
