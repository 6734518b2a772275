//! Typed consumers of the authenticated request protocol.
//!
//! Business payloads stay opaque JSON. Mutating calls are checked against the
//! permission model first so the UI can fail fast; the server still decides.

use portal_auth::{Action, Attribute, PermissionQuery, Resource, portal};
use portal_core::UserId;
use serde_json::{Map, Value};

use crate::client::PortalClient;
use crate::error::ClientError;
use crate::transport::Method;

pub const ANNOUNCEMENTS_PATH: &str = "/announcements";
pub const EVENTS_PATH: &str = "/events";
pub const APPLICATIONS_PATH: &str = "/applications";
pub const MY_APPLICATION_PATH: &str = "/applications/me";
pub const TEAMS_PATH: &str = "/teams";
pub const USERS_PATH: &str = "/users";

/// Field of announcements and events naming the audience attribute.
pub const VISIBILITY_FIELD: &str = "visibility";

pub struct PortalApi<'a> {
    client: &'a PortalClient,
}

impl<'a> PortalApi<'a> {
    pub(crate) fn new(client: &'a PortalClient) -> Self {
        Self { client }
    }

    /// Announcements the current role may see.
    pub async fn announcements(&self) -> Result<Vec<Value>, ClientError> {
        self.visible_list(ANNOUNCEMENTS_PATH, &Resource::ANNOUNCEMENTS).await
    }

    /// Events the current role may see.
    pub async fn events(&self) -> Result<Vec<Value>, ClientError> {
        self.visible_list(EVENTS_PATH, &Resource::EVENTS).await
    }

    pub async fn create_announcement(&self, body: Value) -> Result<Value, ClientError> {
        self.client.authorize(&Resource::ANNOUNCEMENTS, Action::CREATE_ANY)?;
        self.client
            .authed()
            .send_json(Method::Post, ANNOUNCEMENTS_PATH, Some(body))
            .await
    }

    pub async fn my_application(&self) -> Result<Value, ClientError> {
        self.client.authorize(&Resource::APPLICATIONS, Action::READ_OWN)?;
        self.client.authed().get_json(MY_APPLICATION_PATH).await
    }

    pub async fn submit_application(&self, body: Value) -> Result<Value, ClientError> {
        self.client.authorize(&Resource::APPLICATIONS, Action::CREATE_OWN)?;
        self.client
            .authed()
            .send_json(Method::Post, APPLICATIONS_PATH, Some(body))
            .await
    }

    /// All applications; reviewers only.
    pub async fn applications(&self) -> Result<Vec<Value>, ClientError> {
        self.client.authorize(&Resource::APPLICATIONS, Action::READ_ANY)?;
        self.client.authed().get_json(APPLICATIONS_PATH).await
    }

    pub async fn create_team(&self, body: Value) -> Result<Value, ClientError> {
        self.client.authorize(&Resource::TEAMS, Action::CREATE_OWN)?;
        self.client
            .authed()
            .send_json(Method::Post, TEAMS_PATH, Some(body))
            .await
    }

    /// Patch a user profile. Every field must be covered by the grant:
    /// `update:own` for the current user, `update:any` for anyone else.
    /// `UserId` guarantees the id is a single path segment.
    pub async fn update_user(&self, user_id: &UserId, fields: Map<String, Value>) -> Result<Value, ClientError> {
        let own = self.client.store().user().id.as_ref() == Some(user_id);
        let action = if own { Action::UPDATE_OWN } else { Action::UPDATE_ANY };

        let permission = self.client.authorize(&Resource::USERS, action)?;
        if let Some(field) = fields.keys().find(|f| !permission.covers(&Attribute::new(f.to_string()))) {
            tracing::debug!(%field, %action, "profile field not covered by grant");
            return Err(ClientError::NoPermission);
        }

        let path = format!("{USERS_PATH}/{user_id}");
        self.client
            .authed()
            .send_json(Method::Patch, &path, Some(Value::Object(fields)))
            .await
    }

    async fn visible_list(&self, path: &str, resource: &Resource) -> Result<Vec<Value>, ClientError> {
        let permission = self.client.authorize(resource, Action::READ_ANY)?;
        let items: Vec<Value> = self.client.authed().get_json(path).await?;
        Ok(items.into_iter().filter(|item| is_visible(&permission, item)).collect())
    }
}

/// Items without a visibility tag are treated as public.
fn is_visible(permission: &PermissionQuery, item: &Value) -> bool {
    let tag = match item.get(VISIBILITY_FIELD).and_then(Value::as_str) {
        Some(tag) => Attribute::new(tag.to_string()),
        None => portal::PUBLIC,
    };
    permission.covers(&tag)
}
