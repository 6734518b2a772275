//! Wiring of store, lifecycle manager, request protocol and permission model.

use std::sync::Arc;

use portal_auth::{AccessControl, Action, PermissionQuery, Resource, Role, authorize, portal_policy};

use crate::api::PortalApi;
use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::flag::{FileLoginFlag, LoginFlagStore};
use crate::lifecycle::SessionManager;
use crate::request::AuthedClient;
use crate::session::SessionStore;
use crate::transport::{ReqwestTransport, Transport};

/// The portal client: one session, one permission model, one transport.
#[derive(Clone)]
pub struct PortalClient {
    manager: Arc<SessionManager>,
    authed: AuthedClient,
    access: Arc<AccessControl>,
}

impl PortalClient {
    pub fn new(
        config: ClientConfig,
        transport: Arc<dyn Transport>,
        flag: Arc<dyn LoginFlagStore>,
        access: Arc<AccessControl>,
    ) -> Self {
        let store = SessionStore::new();
        let manager = Arc::new(SessionManager::new(config, transport.clone(), store.clone(), flag));
        let authed = AuthedClient::new(transport, store, manager.clone());

        Self {
            manager,
            authed,
            access,
        }
    }

    /// Production wiring: `reqwest`, a file-backed flag and the portal grant table.
    pub fn from_config(config: ClientConfig) -> Result<Self, ClientError> {
        let transport = Arc::new(ReqwestTransport::new(&config)?);
        let state_dir = config
            .resolved_state_dir()
            .ok_or_else(|| ClientError::Setup("no directory available for session state".to_string()))?;
        let flag = Arc::new(FileLoginFlag::in_dir(state_dir));
        let access = Arc::new(portal_policy()?);

        Ok(Self::new(config, transport, flag, access))
    }

    pub fn session(&self) -> &SessionManager {
        &self.manager
    }

    pub fn store(&self) -> &SessionStore {
        self.manager.store()
    }

    pub fn authed(&self) -> &AuthedClient {
        &self.authed
    }

    pub fn access(&self) -> &AccessControl {
        &self.access
    }

    pub fn api(&self) -> PortalApi<'_> {
        PortalApi::new(self)
    }

    pub fn current_role(&self) -> Option<Role> {
        self.store().role()
    }

    /// Resolve a permission for the current user. Anonymous sessions are denied.
    pub fn permission(&self, resource: &Resource, action: Action) -> PermissionQuery {
        self.access.resolve(self.current_role().as_ref(), resource, action)
    }

    pub fn can(&self, resource: &Resource, action: Action) -> bool {
        self.permission(resource, action).granted
    }

    /// Like [`permission`](Self::permission) for actions that need a role:
    /// anonymous is `RoleNotFound`, a denial is `NoPermission`.
    pub fn authorize(&self, resource: &Resource, action: Action) -> Result<PermissionQuery, ClientError> {
        Ok(authorize(&self.access, self.current_role().as_ref(), resource, action)?)
    }
}
