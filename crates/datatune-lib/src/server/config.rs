//! HTTP server configuration.

use crate::errors::{DataTuneError, Result};

/// Listener address and the externally visible base URL.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// TCP port to listen on.
    pub port: u16,
    /// Bind address (e.g. "0.0.0.0").
    pub host: String,
    /// Base URL vendors redirect back to, e.g. `https://datatune.example`.
    /// Derived from the request's `Host` header when unset.
    pub public_url: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8000,
            host: "0.0.0.0".into(),
            public_url: None,
        }
    }
}

impl ServerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(DataTuneError::Config("server host is empty".into()));
        }
        if let Some(url) = &self.public_url {
            reqwest::Url::parse(url)
                .map_err(|e| DataTuneError::Config(format!("invalid public URL {url}: {e}")))?;
        }
        Ok(())
    }

    /// Returns the socket address string "host:port".
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Graceful shutdown timeout in seconds.
pub const SHUTDOWN_TIMEOUT_SECS: u64 = 5;

/// Path vendors redirect to after consent.
pub const OAUTH_CALLBACK_PATH: &str = "/auth/oauth-callback";
