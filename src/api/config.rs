use serde::{Deserialize, Serialize};
use std::env;

/// Connection settings for the fable backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Base URL of the backend, without a trailing slash.
    pub base_url: String,
    /// Timeout in seconds for each HTTP request.
    pub timeout_secs: u64,
    /// Authenticated session cookie. Without one, requests carry an anonymous id.
    pub session_cookie: Option<String>,
    /// Fixed anonymous id. A random one is generated per client when unset.
    pub anonymous_id: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            timeout_secs: 30,
            session_cookie: None,
            anonymous_id: None,
        }
    }
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Reads `FABLE_API_URL`, `FABLE_API_TIMEOUT_SECS` and `FABLE_SESSION_COOKIE`,
    /// keeping the defaults for anything unset or unparsable.
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// Replaces the settings the environment provides and keeps the rest.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(url) = env::var("FABLE_API_URL") {
            self.base_url = url;
        }
        if let Some(timeout) = env::var("FABLE_API_TIMEOUT_SECS")
            .ok()
            .and_then(|raw| raw.parse().ok())
        {
            self.timeout_secs = timeout;
        }
        if let Some(cookie) = env::var("FABLE_SESSION_COOKIE")
            .ok()
            .filter(|cookie| !cookie.is_empty())
        {
            self.session_cookie = Some(cookie);
        }
        self
    }

    pub(crate) fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }
}
