//! Shared HTTP client with connection pooling.
//!
//! One `reqwest::Client` is built from [`Settings`] at startup and cloned
//! into every component that talks to the network, so all outbound calls
//! reuse the same connection pool.

use std::time::Duration;

use crate::config::Settings;
use crate::errors::{DataTuneError, Result};

/// Cheaply clonable handle to the pooled client.
#[derive(Clone, Debug)]
pub struct HttpClient {
    inner: reqwest::Client,
}

impl HttpClient {
    /// Build a new `HttpClient` configured from the given `Settings`.
    pub fn new(settings: &Settings) -> Result<Self> {
        let inner = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.request_timeout))
            .connect_timeout(Duration::from_secs(settings.connect_timeout))
            .pool_max_idle_per_host(settings.max_idle_conns_per_host)
            .pool_idle_timeout(Duration::from_secs(settings.idle_conn_timeout))
            .user_agent(concat!("datatune/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(DataTuneError::Http)?;
        Ok(Self { inner })
    }

    /// Build an `HttpClient` using `Settings::default()`.
    pub fn from_defaults() -> Result<Self> {
        Self::new(&Settings::default())
    }

    /// The underlying pooled client.
    pub fn client(&self) -> &reqwest::Client {
        &self.inner
    }
}
