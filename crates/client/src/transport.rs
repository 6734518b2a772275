//! HTTP boundary: request/response values and the `Transport` seam.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use portal_core::AccessToken;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

use crate::config::ClientConfig;
use crate::error::ClientError;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

/// A request relative to the API root.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    /// Path beginning with `/`, appended to the API root.
    pub path: String,
    pub bearer: Option<AccessToken>,
    pub body: Option<Value>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            bearer: None,
            body: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::Get, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::Post, path)
    }

    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn bearer(mut self, token: Option<&AccessToken>) -> Self {
        self.bearer = token.cloned();
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl ApiResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn with_json(status: u16, body: &Value) -> Self {
        Self::new(status, body.to_string())
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T, ClientError> {
        serde_json::from_slice(&self.body).map_err(|e| ClientError::Decode(e.to_string()))
    }
}

/// No HTTP response was obtained.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("network unreachable: {0}")]
    Unreachable(String),
    #[error("request timed out")]
    Timeout,
}

/// Performs one HTTP round-trip. Implementations never retry.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, TransportError>;
}

/// `reqwest`-backed transport.
///
/// Keeps a cookie store so the ambient refresh credential set by the login
/// endpoint is replayed on refresh and logout.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
    api_root: String,
}

impl ReqwestTransport {
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder()
            .cookie_store(true)
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| ClientError::Setup(e.to_string()))?;

        Ok(Self {
            client,
            api_root: config.api_root.clone(),
        })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, TransportError> {
        let url = format!("{}{}", self.api_root, request.path);
        let method = match request.method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Patch => reqwest::Method::PATCH,
            Method::Delete => reqwest::Method::DELETE,
        };

        let mut req = self.client.request(method, &url);
        if let Some(token) = &request.bearer {
            req = req.bearer_auth(token.expose());
        }
        if let Some(body) = &request.body {
            req = req.json(body);
        }

        let classify = |e: reqwest::Error| {
            if e.is_timeout() {
                TransportError::Timeout
            } else {
                TransportError::Unreachable(e.to_string())
            }
        };

        let resp = req.send().await.map_err(classify)?;
        let status = resp.status().as_u16();
        let body = resp.bytes().await.map_err(classify)?;

        tracing::debug!(%url, status, "api round-trip");
        Ok(ApiResponse::new(status, body.to_vec()))
    }
}

type Responder = Box<dyn Fn(&ApiRequest) -> Result<ApiResponse, TransportError> + Send + Sync>;

/// In-memory transport that replays scripted responses.
///
/// Intended for tests/dev. Queued responses for a path are consumed first;
/// after that a responder registered for the path answers. Every request is
/// recorded. Each send yields once so concurrent callers interleave the way
/// they would over a real network.
#[derive(Default)]
pub struct ScriptedTransport {
    queued: Mutex<HashMap<String, VecDeque<Result<ApiResponse, TransportError>>>>,
    responders: Mutex<HashMap<String, Responder>>,
    log: Mutex<Vec<ApiRequest>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, path: &str, status: u16, body: Value) -> &Self {
        self.push_result(path, Ok(ApiResponse::with_json(status, &body)))
    }

    pub fn push_error(&self, path: &str, error: TransportError) -> &Self {
        self.push_result(path, Err(error))
    }

    fn push_result(&self, path: &str, result: Result<ApiResponse, TransportError>) -> &Self {
        if let Ok(mut queued) = self.queued.lock() {
            queued.entry(path.to_string()).or_default().push_back(result);
        }
        self
    }

    pub fn respond_with<F>(&self, path: &str, responder: F) -> &Self
    where
        F: Fn(&ApiRequest) -> Result<ApiResponse, TransportError> + Send + Sync + 'static,
    {
        if let Ok(mut responders) = self.responders.lock() {
            responders.insert(path.to_string(), Box::new(responder));
        }
        self
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        self.log.lock().map(|log| log.clone()).unwrap_or_default()
    }

    pub fn requests_to(&self, path: &str) -> Vec<ApiRequest> {
        self.requests().into_iter().filter(|r| r.path == path).collect()
    }

    pub fn count(&self, path: &str) -> usize {
        self.requests_to(path).len()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, TransportError> {
        tokio::task::yield_now().await;

        if let Ok(mut log) = self.log.lock() {
            log.push(request.clone());
        }

        let queued = self
            .queued
            .lock()
            .ok()
            .and_then(|mut queued| queued.get_mut(&request.path).and_then(VecDeque::pop_front));
        if let Some(result) = queued {
            return result;
        }

        let responders = self
            .responders
            .lock()
            .map_err(|_| TransportError::Unreachable("scripted transport poisoned".to_string()))?;
        match responders.get(&request.path) {
            Some(responder) => responder(&request),
            None => Err(TransportError::Unreachable(format!(
                "no scripted response for {}",
                request.path
            ))),
        }
    }
}
