//! `portal-client`
//!
//! **Responsibility:** Session and token lifecycle for the portal client.
//!
//! This crate provides:
//! - The session store (access token, profile, logged-in flag)
//! - Login, refresh, logout and startup re-authentication
//! - The authenticated request protocol (refresh on 401, retry once)
//! - Error classification into UI reactions
//!
//! The server remains the authority; permission checks here are advisory.

pub mod api;
pub mod client;
pub mod config;
pub mod error;
pub mod flag;
pub mod lifecycle;
pub mod request;
pub mod session;
pub mod transport;

pub use api::PortalApi;
pub use client::PortalClient;
pub use config::ClientConfig;
pub use error::{ClientError, UiReaction};
pub use flag::{FileLoginFlag, LoginFlagStore, MemoryLoginFlag};
pub use lifecycle::{BootstrapOutcome, Credentials, LogoutOutcome, LogoutReason, SessionEvent, SessionManager};
pub use request::{AuthedClient, TokenRefresher};
pub use session::{SessionAction, SessionState, SessionStore, UserData, UserUpdate};
pub use transport::{ApiRequest, ApiResponse, Method, ReqwestTransport, ScriptedTransport, Transport, TransportError};
