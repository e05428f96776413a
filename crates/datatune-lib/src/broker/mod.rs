//! Identity/token broker boundary.
//!
//! The broker owns every user's OAuth grants with the storage vendors. This
//! crate only asks it for a current access token, or for an authorization
//! URL that starts a new connection. [`TokenBroker`] is the seam; the live
//! implementation is [`descope::DescopeBroker`] and tests substitute fakes.

pub mod descope;

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use oauth2::RedirectUrl;
use thiserror::Error;

pub use descope::DescopeBroker;

/// Bearer token issued by the broker. `Debug` never prints the secret.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    pub fn secret(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(<redacted>)")
    }
}

/// Why the broker could not produce what was asked for.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BrokerError {
    /// The user has no usable grant for this application.
    #[error("no connection: {0}")]
    NotConnected(String),

    /// Transport failure, throttling, or a broker-side 5xx.
    #[error("broker unavailable: {0}")]
    Unavailable(String),

    /// The broker refused this client (bad management key, malformed request).
    #[error("broker rejected request ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("broker call timed out after {}ms", .0.as_millis())]
    Timeout(Duration),
}

impl BrokerError {
    /// Whether the failure says something about the broker rather than the
    /// user's connection.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable(_) | Self::Timeout(_))
    }
}

/// Parameters for starting a new provider connection.
#[derive(Debug, Clone)]
pub struct ConnectRequest {
    pub app_id: String,
    /// The signed-in user's broker refresh token.
    pub refresh_token: String,
    /// Where the vendor should send the user back to.
    pub redirect_url: RedirectUrl,
    pub scopes: Vec<String>,
}

#[async_trait]
pub trait TokenBroker: Send + Sync {
    /// Fetch the current access token for (`app_id`, `user_id`).
    ///
    /// `force_refresh` asks the broker to refresh with the vendor instead of
    /// serving a cached token.
    async fn fetch_token(
        &self,
        app_id: &str,
        user_id: &str,
        force_refresh: bool,
    ) -> Result<AccessToken, BrokerError>;

    /// Start an OAuth connection and return the URL to send the user to.
    async fn connect(&self, request: &ConnectRequest) -> Result<String, BrokerError>;
}
