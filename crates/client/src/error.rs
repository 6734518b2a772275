//! Client error taxonomy and its user-visible reactions.

use portal_auth::AuthzError;
use portal_core::CoreError;
use thiserror::Error;

use crate::transport::TransportError;

#[derive(Debug, Error)]
pub enum ClientError {
    /// No HTTP response was obtained (unreachable, reset, timed out).
    #[error("connection error: {0}")]
    Connection(String),

    #[error("invalid email or password")]
    InvalidCredentials,

    #[error("authentication failed (status {status})")]
    Authentication { status: u16 },

    /// The refresh credential was rejected; the session has been torn down.
    #[error("your session has expired, please log in again")]
    TokenExpired,

    #[error("you do not have permission to perform this action")]
    NoPermission,

    #[error("unexpected response from server (status {status})")]
    Unknown { status: u16 },

    #[error("role not found")]
    RoleNotFound,

    #[error("malformed response: {0}")]
    Decode(String),

    #[error(transparent)]
    Policy(AuthzError),

    #[error("client setup failed: {0}")]
    Setup(String),
}

impl From<TransportError> for ClientError {
    fn from(value: TransportError) -> Self {
        Self::Connection(value.to_string())
    }
}

impl From<AuthzError> for ClientError {
    fn from(value: AuthzError) -> Self {
        match value {
            AuthzError::RoleNotFound => Self::RoleNotFound,
            AuthzError::Forbidden { .. } => Self::NoPermission,
            other => Self::Policy(other),
        }
    }
}

impl From<CoreError> for ClientError {
    fn from(value: CoreError) -> Self {
        Self::Decode(value.to_string())
    }
}

/// What the UI should do with an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiReaction {
    /// Show a transient notification carrying the message.
    Toast(String),
    /// Navigate to a safe route without further messaging.
    Redirect(String),
    /// The session is already gone; tell the user and navigate.
    ForcedLogout { route: String, message: String },
}

impl ClientError {
    pub fn reaction(&self, home_route: &str) -> UiReaction {
        match self {
            Self::NoPermission | Self::RoleNotFound => UiReaction::Redirect(home_route.to_string()),
            Self::TokenExpired => UiReaction::ForcedLogout {
                route: home_route.to_string(),
                message: self.to_string(),
            },
            _ => UiReaction::Toast(self.to_string()),
        }
    }

    /// True for failures where no response reached the client.
    pub fn is_connection(&self) -> bool {
        matches!(self, Self::Connection(_))
    }
}
