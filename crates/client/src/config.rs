//! Client configuration (environment-driven).

use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_API_ROOT: &str = "http://localhost:8080/api";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_HOME_ROUTE: &str = "/";

/// Runtime configuration for the portal client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL of the remote API, without a trailing slash.
    pub api_root: String,
    /// Applied to every request; an elapsed timeout is a connection error.
    pub request_timeout: Duration,
    /// Directory holding the durable logged-in flag. `None` means the
    /// platform data directory.
    pub state_dir: Option<PathBuf>,
    /// Safe default route used for permission and session-expiry redirects.
    pub home_route: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(DEFAULT_API_ROOT)
    }
}

impl ClientConfig {
    pub fn new(api_root: impl Into<String>) -> Self {
        Self {
            api_root: normalize_root(api_root.into()),
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            state_dir: None,
            home_route: DEFAULT_HOME_ROUTE.to_string(),
        }
    }

    /// Read `PORTAL_API_ROOT`, `PORTAL_REQUEST_TIMEOUT_SECS`,
    /// `PORTAL_STATE_DIR` and `PORTAL_HOME_ROUTE`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::new(lookup("PORTAL_API_ROOT").unwrap_or_else(|| DEFAULT_API_ROOT.to_string()));

        if let Some(raw) = lookup("PORTAL_REQUEST_TIMEOUT_SECS") {
            match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => config.request_timeout = Duration::from_secs(secs),
                _ => tracing::warn!(
                    value = %raw,
                    default = DEFAULT_TIMEOUT_SECS,
                    "invalid PORTAL_REQUEST_TIMEOUT_SECS; using default"
                ),
            }
        }

        config.state_dir = lookup("PORTAL_STATE_DIR")
            .filter(|dir| !dir.trim().is_empty())
            .map(PathBuf::from);

        if let Some(route) = lookup("PORTAL_HOME_ROUTE").filter(|r| r.starts_with('/')) {
            config.home_route = route;
        }

        config
    }

    pub fn with_state_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.state_dir = Some(dir.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Configured state directory, or `<data dir>/portal`.
    pub fn resolved_state_dir(&self) -> Option<PathBuf> {
        self.state_dir
            .clone()
            .or_else(|| dirs::data_local_dir().map(|dir| dir.join("portal")))
    }
}

fn normalize_root(root: String) -> String {
    root.trim().trim_end_matches('/').to_string()
}
