//! Provider connection flow.
//!
//! [`ConnectService::begin`] asks the broker for an authorization URL and
//! remembers a CSRF state for the user. [`ConnectService::complete`]
//! handles the vendor's redirect back: the state must match a pending
//! connection of the same user, and the connection only counts once the
//! broker can actually hand out a token for it.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use oauth2::{CsrfToken, RedirectUrl};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::Mutex;

use crate::broker::{BrokerError, ConnectRequest};
use crate::credentials::CredentialResolver;
use crate::providers::{ProviderId, ProviderRegistry};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Query parameters of the vendor redirect.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

/// A connection that was started and is waiting for its callback.
#[derive(Debug, Clone, Serialize)]
pub struct ConnectStart {
    pub provider: ProviderId,
    /// The service name the user asked for (may be a provider alias).
    pub service: String,
    pub auth_url: String,
    pub state: String,
}

#[derive(Debug, Clone)]
struct PendingConnect {
    user_id: String,
    provider: ProviderId,
    created: Instant,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConnectError {
    #[error("Unsupported service: {0}")]
    UnsupportedService(String),

    #[error("Authorization denied: {0}")]
    Denied(String),

    #[error("Callback carried no authorization code")]
    MissingCode,

    #[error("Unknown or expired connection state")]
    InvalidState,

    #[error("{provider} connection could not be confirmed: {reason}")]
    NotConfirmed { provider: ProviderId, reason: String },

    #[error("Failed to initiate connection: {0}")]
    Broker(BrokerError),

    #[error("Invalid callback URL: {0}")]
    InvalidRedirect(String),
}

impl ConnectError {
    /// Value of the `error` query parameter on the connections page.
    pub fn redirect_code(&self) -> String {
        match self {
            Self::Denied(reason) if !reason.is_empty() => reason.clone(),
            Self::Denied(_) => "access_denied".into(),
            Self::MissingCode => "missing_code".into(),
            Self::InvalidState => "invalid_state".into(),
            Self::NotConfirmed { .. } => "not_confirmed".into(),
            Self::UnsupportedService(_) | Self::Broker(_) | Self::InvalidRedirect(_) => {
                "callback_failed".into()
            }
        }
    }
}

// ---------------------------------------------------------------------------
// ConnectService
// ---------------------------------------------------------------------------

pub struct ConnectService {
    registry: ProviderRegistry,
    resolver: CredentialResolver,
    pending: Mutex<HashMap<String, PendingConnect>>,
    pending_ttl: Duration,
}

impl ConnectService {
    pub fn new(registry: ProviderRegistry, resolver: CredentialResolver, pending_ttl: Duration) -> Self {
        Self {
            registry,
            resolver,
            pending: Mutex::new(HashMap::new()),
            pending_ttl,
        }
    }

    /// Start connecting `service` (a provider id or alias) for `user_id`.
    ///
    /// `callback_url` is where the vendor returns the user; the generated
    /// state is appended to it as a query parameter.
    pub async fn begin(
        &self,
        user_id: &str,
        service: &str,
        refresh_token: &str,
        callback_url: &str,
    ) -> Result<ConnectStart, ConnectError> {
        let provider = self
            .registry
            .find_by_service(service)
            .ok_or_else(|| ConnectError::UnsupportedService(service.to_string()))?;

        let state = CsrfToken::new_random();
        let mut url =
            Url::parse(callback_url).map_err(|e| ConnectError::InvalidRedirect(e.to_string()))?;
        url.query_pairs_mut().append_pair("state", state.secret());
        let redirect_url = RedirectUrl::new(url.to_string())
            .map_err(|e| ConnectError::InvalidRedirect(e.to_string()))?;

        let request = ConnectRequest {
            app_id: provider.app_id.clone(),
            refresh_token: refresh_token.to_string(),
            redirect_url,
            scopes: provider.scopes.clone(),
        };

        let broker = self.resolver.broker();
        let auth_url = match tokio::time::timeout(self.resolver.timeout(), broker.connect(&request)).await {
            Ok(Ok(url)) => url,
            Ok(Err(e)) => {
                tracing::warn!(provider = %provider.id, "broker connect failed: {}", e);
                return Err(ConnectError::Broker(e));
            }
            Err(_) => {
                tracing::warn!(provider = %provider.id, "broker connect timed out");
                return Err(ConnectError::Broker(BrokerError::Timeout(self.resolver.timeout())));
            }
        };

        let mut pending = self.pending.lock().await;
        let ttl = self.pending_ttl;
        pending.retain(|_, p| p.created.elapsed() < ttl);
        pending.insert(
            state.secret().clone(),
            PendingConnect {
                user_id: user_id.to_string(),
                provider: provider.id.clone(),
                created: Instant::now(),
            },
        );

        tracing::info!(user_id, provider = %provider.id, service, "connection initiated");
        Ok(ConnectStart {
            provider: provider.id.clone(),
            service: service.to_string(),
            auth_url,
            state: state.secret().clone(),
        })
    }

    /// Finish a connection from the vendor's callback parameters.
    ///
    /// The pending entry for `params.state` is consumed whatever the outcome.
    pub async fn complete(
        &self,
        user_id: &str,
        params: &CallbackParams,
    ) -> Result<ProviderId, ConnectError> {
        let pending = match params.state.as_deref() {
            Some(state) => self.pending.lock().await.remove(state),
            None => None,
        };

        if let Some(error) = &params.error {
            tracing::warn!(user_id, "OAuth error: {}", error);
            return Err(ConnectError::Denied(error.clone()));
        }
        if params.code.as_deref().map_or(true, str::is_empty) {
            return Err(ConnectError::MissingCode);
        }

        let pending = pending
            .filter(|p| p.user_id == user_id && p.created.elapsed() < self.pending_ttl)
            .ok_or(ConnectError::InvalidState)?;

        let provider = self
            .registry
            .get(&pending.provider)
            .map(|entry| &entry.provider)
            .ok_or(ConnectError::InvalidState)?;

        match self.resolver.resolve(user_id, provider).await {
            Ok(_) => {
                tracing::info!(user_id, provider = %provider.id, "connection confirmed");
                Ok(provider.id.clone())
            }
            Err(miss) => Err(ConnectError::NotConfirmed {
                provider: provider.id.clone(),
                reason: miss.cause.to_string(),
            }),
        }
    }

    /// Number of connections still waiting for a callback.
    pub async fn pending_count(&self) -> usize {
        let ttl = self.pending_ttl;
        self.pending
            .lock()
            .await
            .values()
            .filter(|p| p.created.elapsed() < ttl)
            .count()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
