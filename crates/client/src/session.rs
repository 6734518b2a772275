//! Session state and its pure transitions.
//!
//! [`SessionStore`] is the injectable handle every other component reads.
//! State changes only through [`SessionAction`]s, each applied by [`reduce`]
//! and swapped in as a whole so no reader observes a half-updated session.

use std::sync::{Arc, RwLock};

use portal_auth::Role;
use portal_core::{AccessToken, UserId};
use serde::{Deserialize, Deserializer, Serialize};

/// Profile of the logged-in user. Empty defaults when anonymous.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserData {
    pub id: Option<UserId>,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Option<Role>,
}

/// Partial profile update; `None` fields keep their previous value.
///
/// `role` is tri-state: absent keeps the role, `Some(None)` clears it.
/// Also the wire shape of `GET /users/data`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserUpdate {
    #[serde(default, alias = "_id")]
    pub id: Option<UserId>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default, deserialize_with = "role_or_none")]
    pub role: Option<Option<Role>>,
}

impl UserUpdate {
    /// Set (or with `None`, clear) the role.
    pub fn with_role(mut self, role: Option<Role>) -> Self {
        self.role = Some(role);
        self
    }
}

/// Only called when the field is present: `""`, `"none"` and `null` clear the role.
fn role_or_none<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Option<Role>>, D::Error> {
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(Some(
        raw.map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty() && !r.eq_ignore_ascii_case("none"))
            .map(Role::new),
    ))
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    pub is_logged_in: bool,
    pub access_token: Option<AccessToken>,
    pub user: UserData,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionAction {
    LogIn,
    LogOut,
    SetAccessToken(Option<AccessToken>),
    SetUserData(UserUpdate),
    /// Tear the whole session down to its defaults.
    Reset,
}

/// Next state from the current state and an action. No side effects.
pub fn reduce(state: SessionState, action: SessionAction) -> SessionState {
    match action {
        SessionAction::LogIn => SessionState {
            is_logged_in: true,
            ..state
        },
        SessionAction::LogOut => SessionState {
            is_logged_in: false,
            ..state
        },
        SessionAction::SetAccessToken(access_token) => SessionState {
            access_token,
            ..state
        },
        SessionAction::SetUserData(update) => {
            let mut user = state.user;
            if let Some(id) = update.id {
                user.id = Some(id);
            }
            if let Some(email) = update.email {
                user.email = email;
            }
            if let Some(first_name) = update.first_name {
                user.first_name = first_name;
            }
            if let Some(last_name) = update.last_name {
                user.last_name = last_name;
            }
            if let Some(role) = update.role {
                user.role = role;
            }
            SessionState { user, ..state }
        }
        SessionAction::Reset => SessionState::default(),
    }
}

#[derive(Debug, Default)]
struct Slot {
    state: SessionState,
    /// Bumped by every `Reset`; work started under an older epoch is stale.
    epoch: u64,
}

/// Shared handle to the session. Cheap to clone; reads never wait on I/O.
#[derive(Debug, Clone, Default)]
pub struct SessionStore {
    inner: Arc<RwLock<Slot>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Slot> {
        // A poisoned lock still holds a whole state: transitions are swapped in atomically.
        self.inner.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn apply(slot: &mut Slot, action: SessionAction) {
        if action == SessionAction::Reset {
            slot.epoch += 1;
        }
        let current = std::mem::take(&mut slot.state);
        slot.state = reduce(current, action);
    }

    pub fn dispatch(&self, action: SessionAction) {
        Self::apply(&mut self.write(), action);
    }

    /// Apply `action` only if no reset happened since `epoch` was read.
    pub fn dispatch_in_epoch(&self, epoch: u64, action: SessionAction) -> bool {
        let mut slot = self.write();
        if slot.epoch != epoch {
            return false;
        }
        Self::apply(&mut slot, action);
        true
    }

    /// Number of resets so far.
    pub fn epoch(&self) -> u64 {
        self.inner
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .epoch
    }

    pub fn snapshot(&self) -> SessionState {
        self.inner
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .state
            .clone()
    }

    pub fn access_token(&self) -> Option<AccessToken> {
        self.snapshot().access_token
    }

    pub fn is_logged_in(&self) -> bool {
        self.snapshot().is_logged_in
    }

    pub fn user(&self) -> UserData {
        self.snapshot().user
    }

    pub fn role(&self) -> Option<Role> {
        self.snapshot().user.role
    }

    pub fn log_in(&self) {
        self.dispatch(SessionAction::LogIn);
    }

    pub fn log_out(&self) {
        self.dispatch(SessionAction::LogOut);
    }

    pub fn set_access_token(&self, token: Option<AccessToken>) {
        self.dispatch(SessionAction::SetAccessToken(token));
    }

    pub fn set_user_data(&self, update: UserUpdate) {
        self.dispatch(SessionAction::SetUserData(update));
    }

    pub fn reset(&self) {
        self.dispatch(SessionAction::Reset);
    }
}
