//! Tunable runtime settings loaded from an optional JSON file.
//!
//! Keys are camelCase. Every field has a default, so a partial file only
//! overrides what it names. All durations are whole seconds except the
//! per-call broker and provider timeouts, which are milliseconds.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::errors::{DataTuneError, Result};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    #[serde(rename = "requestTimeout")]
    pub request_timeout: u64,
    #[serde(rename = "connectTimeout")]
    pub connect_timeout: u64,
    #[serde(rename = "brokerTimeoutMs")]
    pub broker_timeout_ms: u64,
    #[serde(rename = "providerTimeoutMs")]
    pub provider_timeout_ms: u64,
    #[serde(rename = "idleConnTimeout")]
    pub idle_conn_timeout: u64,
    #[serde(rename = "maxIdleConnsPerHost")]
    pub max_idle_conns_per_host: usize,
    #[serde(rename = "brokerBaseUrl")]
    pub broker_base_url: String,
    #[serde(rename = "pendingConnectTtl")]
    pub pending_connect_ttl: u64,
    #[serde(rename = "sessionTtl")]
    pub session_ttl: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            request_timeout: 30,
            connect_timeout: 10,
            broker_timeout_ms: 10_000,
            provider_timeout_ms: 15_000,
            idle_conn_timeout: 90,
            max_idle_conns_per_host: 100,
            broker_base_url: crate::broker::descope::DEFAULT_BASE_URL.into(),
            pending_connect_ttl: 600,
            session_ttl: 24 * 60 * 60,
        }
    }
}

impl Settings {
    /// Load settings from `path`, or from `~/.datatune/config.json` when
    /// `path` is `None`.
    ///
    /// A missing file yields defaults. A file that cannot be read or parsed
    /// logs a warning and yields defaults. The result is validated either way.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = path.map(Path::to_path_buf).unwrap_or_else(default_path);
        let settings = Self::read_or_default(&path);
        settings.validate()?;
        Ok(settings)
    }

    fn read_or_default(path: &Path) -> Self {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no settings file, using defaults");
            return Self::default();
        }
        match std::fs::read_to_string(path) {
            Ok(contents) => match serde_json::from_str::<Settings>(&contents) {
                Ok(settings) => settings,
                Err(e) => {
                    tracing::warn!(
                        "Failed to parse settings file {}: {}. Using defaults.",
                        path.display(),
                        e
                    );
                    Self::default()
                }
            },
            Err(e) => {
                tracing::warn!(
                    "Failed to read settings file {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Reject values that would make outbound calls unbounded or impossible.
    pub fn validate(&self) -> Result<()> {
        let timeouts = [
            ("requestTimeout", self.request_timeout),
            ("connectTimeout", self.connect_timeout),
            ("brokerTimeoutMs", self.broker_timeout_ms),
            ("providerTimeoutMs", self.provider_timeout_ms),
        ];
        if let Some((name, _)) = timeouts.iter().find(|(_, v)| *v == 0) {
            return Err(DataTuneError::Config(format!("{name} must be greater than zero")));
        }
        if self.broker_base_url.trim().is_empty() {
            return Err(DataTuneError::Config("brokerBaseUrl must not be empty".into()));
        }
        Ok(())
    }

    pub fn broker_timeout(&self) -> Duration {
        Duration::from_millis(self.broker_timeout_ms)
    }

    pub fn provider_timeout(&self) -> Duration {
        Duration::from_millis(self.provider_timeout_ms)
    }

    pub fn pending_connect_ttl(&self) -> Duration {
        Duration::from_secs(self.pending_connect_ttl)
    }

    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl)
    }
}

/// `~/.datatune/config.json`, falling back to `/tmp` when `HOME` is unset.
pub fn default_path() -> PathBuf {
    let home = std::env::var("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/tmp"));
    home.join(".datatune").join("config.json")
}
