//! Session lifecycle: login, refresh, logout and startup re-authentication.

use std::sync::Arc;

use async_trait::async_trait;
use portal_core::{AccessToken, UserId};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::flag::LoginFlagStore;
use crate::request::TokenRefresher;
use crate::session::{SessionAction, SessionStore, UserData, UserUpdate};
use crate::transport::{ApiRequest, ApiResponse, Transport};

pub const LOGIN_PATH: &str = "/users/login";
pub const LOGOUT_PATH: &str = "/users/logout";
pub const REFRESH_PATH: &str = "/users/refreshAccessToken";
pub const USER_DATA_PATH: &str = "/users/data";

const EVENT_CAPACITY: usize = 32;

#[derive(Clone, Serialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

impl core::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct TokenBody {
    token: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogoutReason {
    UserRequested,
    /// The refresh credential was rejected.
    SessionExpired,
}

/// Published on every session transition the UI must react to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    LoggedIn { user_id: Option<UserId> },
    LoggedOut { reason: LogoutReason },
    /// Navigate to `route`.
    Redirect { route: String },
}

/// How far a logout got. Local state is cleared in every case.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogoutOutcome {
    /// The server acknowledged the logout.
    Confirmed,
    /// The server answered with a non-success status.
    Rejected { status: u16 },
    /// The server was unreachable; only the local session was cleared.
    LocalOnly,
}

#[derive(Debug)]
pub enum BootstrapOutcome {
    /// No prior session recorded; nothing attempted.
    Anonymous,
    /// Silent re-authentication succeeded.
    Restored,
    /// A prior session was recorded but could not be restored.
    Failed(ClientError),
}

/// Orchestrates the session against the authentication endpoints.
pub struct SessionManager {
    config: ClientConfig,
    transport: Arc<dyn Transport>,
    store: SessionStore,
    flag: Arc<dyn LoginFlagStore>,
    events: broadcast::Sender<SessionEvent>,
}

impl SessionManager {
    pub fn new(
        config: ClientConfig,
        transport: Arc<dyn Transport>,
        store: SessionStore,
        flag: Arc<dyn LoginFlagStore>,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            config,
            transport,
            store,
            flag,
            events,
        }
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    fn emit(&self, event: SessionEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    fn persist_flag(&self, logged_in: bool) {
        if let Err(err) = self.flag.store(logged_in) {
            tracing::warn!(error = ?err, logged_in, "failed to persist login flag");
        }
    }

    /// Exchange credentials for a session.
    ///
    /// On success any previous session is discarded, then the token, the
    /// user profile and the logged-in flag (memory and durable) are all set.
    /// If the profile cannot be fetched the token is dropped again and the
    /// error returned.
    pub async fn login(&self, credentials: &Credentials) -> Result<UserData, ClientError> {
        let body = serde_json::to_value(credentials).map_err(|e| ClientError::Decode(e.to_string()))?;
        let response = self
            .transport
            .send(ApiRequest::post(LOGIN_PATH).json(body))
            .await?;

        let token = match response.status {
            200..=299 => parse_token(&response)?,
            400 | 401 => {
                tracing::info!(email = %credentials.email, "login rejected: invalid credentials");
                return Err(ClientError::InvalidCredentials);
            }
            status => {
                tracing::warn!(status, "login failed");
                return Err(ClientError::Authentication { status });
            }
        };

        self.store.dispatch(SessionAction::Reset);
        self.store.set_access_token(Some(token.clone()));
        let profile = match self.fetch_user_data(&token).await {
            Ok(profile) => profile,
            Err(err) => {
                self.store.set_access_token(None);
                return Err(err);
            }
        };

        self.establish(profile);
        let user = self.store.user();
        tracing::info!(user_id = ?user.id, role = ?user.role, "logged in");
        Ok(user)
    }

    /// `GET /users/data` with an explicit token.
    pub async fn fetch_user_data(&self, token: &AccessToken) -> Result<UserUpdate, ClientError> {
        let response = self
            .transport
            .send(ApiRequest::get(USER_DATA_PATH).bearer(Some(token)))
            .await?;

        if response.is_success() {
            response.json()
        } else {
            Err(ClientError::Authentication {
                status: response.status,
            })
        }
    }

    fn establish(&self, profile: UserUpdate) {
        let user_id = profile.id.clone();
        self.store.dispatch(SessionAction::SetUserData(profile));
        self.store.dispatch(SessionAction::LogIn);
        self.persist_flag(true);
        self.emit(SessionEvent::LoggedIn { user_id });
    }

    /// Mint a new access token from the ambient refresh credential.
    ///
    /// A rejected refresh credential tears the session down (logout, flag
    /// cleared, redirect home) before failing with `TokenExpired`. A network
    /// failure leaves the session untouched. A token minted for a session
    /// that was reset meanwhile is discarded and reported as `TokenExpired`.
    pub async fn refresh(&self) -> Result<AccessToken, ClientError> {
        let epoch = self.store.epoch();
        let response = self.transport.send(ApiRequest::post(REFRESH_PATH)).await?;

        match response.status {
            200..=299 => {
                let token = parse_token(&response)?;
                if !self
                    .store
                    .dispatch_in_epoch(epoch, SessionAction::SetAccessToken(Some(token.clone())))
                {
                    tracing::warn!("session ended while refreshing; discarding new access token");
                    return Err(ClientError::TokenExpired);
                }
                tracing::debug!("access token refreshed");
                Ok(token)
            }
            401 => {
                tracing::warn!("refresh credential rejected; ending session");
                self.end_session(LogoutReason::SessionExpired).await;
                self.emit(SessionEvent::Redirect {
                    route: self.config.home_route.clone(),
                });
                Err(ClientError::TokenExpired)
            }
            status => {
                tracing::warn!(status, "token refresh failed");
                Err(ClientError::Authentication { status })
            }
        }
    }

    /// Log out. Never fails: local state is cleared whatever the server says.
    pub async fn logout(&self) -> LogoutOutcome {
        self.end_session(LogoutReason::UserRequested).await
    }

    async fn end_session(&self, reason: LogoutReason) -> LogoutOutcome {
        let outcome = match self.transport.send(ApiRequest::post(LOGOUT_PATH)).await {
            Ok(response) if response.is_success() => LogoutOutcome::Confirmed,
            Ok(response) => {
                tracing::warn!(status = response.status, "server rejected logout; clearing local session");
                LogoutOutcome::Rejected {
                    status: response.status,
                }
            }
            Err(err) => {
                tracing::warn!(error = %err, "logout endpoint unreachable; logged out locally only");
                LogoutOutcome::LocalOnly
            }
        };

        self.store.dispatch(SessionAction::Reset);
        self.persist_flag(false);
        self.emit(SessionEvent::LoggedOut { reason });
        tracing::info!(?reason, ?outcome, "logged out");
        outcome
    }

    /// Startup re-authentication, driven by the durable flag.
    pub async fn bootstrap(&self) -> BootstrapOutcome {
        let believed_logged_in = self.flag.load().unwrap_or_else(|err| {
            tracing::warn!(error = ?err, "unreadable login flag; starting anonymous");
            false
        });
        if !believed_logged_in {
            return BootstrapOutcome::Anonymous;
        }

        self.store.dispatch(SessionAction::Reset);

        let token = match self.refresh().await {
            Ok(token) => token,
            Err(err) => {
                tracing::info!(error = %err, "silent re-authentication failed");
                return BootstrapOutcome::Failed(err);
            }
        };

        match self.fetch_user_data(&token).await {
            Ok(profile) => {
                self.establish(profile);
                tracing::info!("session restored");
                BootstrapOutcome::Restored
            }
            Err(err) => {
                self.store.set_access_token(None);
                BootstrapOutcome::Failed(err)
            }
        }
    }
}

#[async_trait]
impl TokenRefresher for SessionManager {
    async fn refresh_access_token(&self) -> Result<AccessToken, ClientError> {
        self.refresh().await
    }
}

fn parse_token(response: &ApiResponse) -> Result<AccessToken, ClientError> {
    let body: TokenBody = response.json()?;
    Ok(AccessToken::new(body.token)?)
}
