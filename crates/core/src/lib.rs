//! `portal-core`: primitives shared by the authorization model and the client.
//!
//! This crate contains no I/O and no policy; only identifiers and credentials.

pub mod error;
pub mod id;
pub mod token;

pub use error::{CoreError, CoreResult};
pub use id::UserId;
pub use token::AccessToken;
