//! Authenticated request protocol.
//!
//! The single place where "attach token, on 401 refresh and retry once"
//! lives. Call sites only supply a request builder.

use std::sync::Arc;

use async_trait::async_trait;
use portal_core::AccessToken;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::ClientError;
use crate::session::SessionStore;
use crate::transport::{ApiRequest, ApiResponse, Method, Transport};

/// Mints a fresh access token. Implemented by the session manager.
#[async_trait]
pub trait TokenRefresher: Send + Sync {
    async fn refresh_access_token(&self) -> Result<AccessToken, ClientError>;
}

#[derive(Clone)]
pub struct AuthedClient {
    transport: Arc<dyn Transport>,
    store: SessionStore,
    refresher: Arc<dyn TokenRefresher>,
}

impl AuthedClient {
    pub fn new(transport: Arc<dyn Transport>, store: SessionStore, refresher: Arc<dyn TokenRefresher>) -> Self {
        Self {
            transport,
            store,
            refresher,
        }
    }

    /// Perform a bearer-authenticated call built by `build`.
    ///
    /// - transport failure: `Connection`
    /// - 2xx: the response
    /// - 401: refresh once, rebuild with the new token, classify the retry
    ///   (a second 401 is `Unknown { status: 401 }`, never a third request)
    /// - 403: `NoPermission`
    /// - anything else: `Unknown { status }`
    pub async fn call<F>(&self, build: F) -> Result<ApiResponse, ClientError>
    where
        F: Fn(Option<&AccessToken>) -> ApiRequest + Send + Sync,
    {
        let token = self.store.access_token();
        let request = build(token.as_ref());
        let path = request.path.clone();

        let response = self.transport.send(request).await?;
        if response.status != 401 {
            return classify(response);
        }

        tracing::debug!(%path, "access token rejected; refreshing and retrying once");
        let refreshed = self.refresher.refresh_access_token().await?;
        let retry = self.transport.send(build(Some(&refreshed))).await?;
        if retry.status == 401 {
            tracing::warn!(%path, "refreshed access token rejected; giving up");
        }
        classify(retry)
    }

    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        self.call(|token| ApiRequest::get(path).bearer(token)).await?.json()
    }

    /// Send `body` and decode the reply. Empty replies decode as JSON `null`.
    pub async fn send_json(&self, method: Method, path: &str, body: Option<Value>) -> Result<Value, ClientError> {
        let response = self
            .call(|token| {
                let request = ApiRequest::new(method, path).bearer(token);
                match &body {
                    Some(body) => request.json(body.clone()),
                    None => request,
                }
            })
            .await?;

        if response.body.is_empty() {
            Ok(Value::Null)
        } else {
            response.json()
        }
    }
}

fn classify(response: ApiResponse) -> Result<ApiResponse, ClientError> {
    match response.status {
        200..=299 => Ok(response),
        403 => Err(ClientError::NoPermission),
        status => Err(ClientError::Unknown { status }),
    }
}
