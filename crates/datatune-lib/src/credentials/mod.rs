//! Credential resolution against the token broker.
//!
//! Every operation asks the broker afresh; nothing is cached here. Broker
//! failures of any kind come back as a [`NotConnected`] value so callers
//! can treat a missing credential as data instead of an error path.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::time::timeout;

use crate::broker::{AccessToken, BrokerError, TokenBroker};
use crate::providers::{Provider, ProviderId};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// An access token scoped to one user and one provider.
#[derive(Debug, Clone)]
pub struct Credential {
    provider: ProviderId,
    user_id: String,
    token: AccessToken,
}

impl Credential {
    pub fn new(provider: ProviderId, user_id: &str, token: &str) -> Self {
        Self {
            provider,
            user_id: user_id.to_string(),
            token: AccessToken::new(token),
        }
    }

    pub fn provider(&self) -> &ProviderId {
        &self.provider
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// The bearer token to present to the provider.
    pub fn access_token(&self) -> &str {
        self.token.secret()
    }
}

/// No usable credential for (user, provider), with the broker's reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotConnected {
    pub provider: ProviderId,
    pub cause: BrokerError,
}

impl fmt::Display for NotConnected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} not connected: {}", self.provider, self.cause)
    }
}

impl std::error::Error for NotConnected {}

// ---------------------------------------------------------------------------
// CredentialResolver
// ---------------------------------------------------------------------------

/// Resolves credentials through an injected broker, bounding every call by
/// a timeout.
#[derive(Clone)]
pub struct CredentialResolver {
    broker: Arc<dyn TokenBroker>,
    timeout: Duration,
}

impl CredentialResolver {
    pub fn new(broker: Arc<dyn TokenBroker>, timeout: Duration) -> Self {
        Self { broker, timeout }
    }

    pub fn broker(&self) -> &Arc<dyn TokenBroker> {
        &self.broker
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Obtain a freshly refreshed credential for `provider`.
    ///
    /// Exactly one broker call, no retry.
    pub async fn resolve(
        &self,
        user_id: &str,
        provider: &Provider,
    ) -> Result<Credential, NotConnected> {
        self.fetch(user_id, provider, true).await
    }

    /// Like [`Self::resolve`] but lets the broker serve a cached token.
    /// Used for connection-status checks where freshness doesn't matter.
    pub async fn probe(
        &self,
        user_id: &str,
        provider: &Provider,
    ) -> Result<Credential, NotConnected> {
        self.fetch(user_id, provider, false).await
    }

    async fn fetch(
        &self,
        user_id: &str,
        provider: &Provider,
        force_refresh: bool,
    ) -> Result<Credential, NotConnected> {
        let start = Instant::now();
        let call = self
            .broker
            .fetch_token(&provider.app_id, user_id, force_refresh);

        let outcome = match timeout(self.timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(BrokerError::Timeout(self.timeout)),
        };

        match outcome {
            Ok(token) => {
                tracing::debug!(
                    provider = %provider.id,
                    app_id = %provider.app_id,
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "credential resolved"
                );
                Ok(Credential {
                    provider: provider.id.clone(),
                    user_id: user_id.to_string(),
                    token,
                })
            }
            Err(cause) => {
                tracing::warn!(
                    provider = %provider.id,
                    app_id = %provider.app_id,
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "Failed to fetch token: {}",
                    cause
                );
                Err(NotConnected {
                    provider: provider.id.clone(),
                    cause,
                })
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::catalog;
    use crate::testing::{FakeBroker, TokenBehavior};

    fn resolver(broker: Arc<FakeBroker>) -> CredentialResolver {
        CredentialResolver::new(broker, Duration::from_millis(200))
    }

    #[tokio::test]
    async fn test_resolve_wraps_token() {
        let broker = Arc::new(
            FakeBroker::new().with("datatune-google-drive", TokenBehavior::Token("tok-1".into())),
        );
        let cred = resolver(broker.clone())
            .resolve("user-1", &catalog::google_drive())
            .await
            .unwrap();

        assert_eq!(cred.access_token(), "tok-1");
        assert_eq!(cred.provider().as_str(), "google-drive");
        assert_eq!(cred.user_id(), "user-1");
        assert_eq!(broker.calls(), 1);
    }

    #[tokio::test]
    async fn test_resolve_forces_refresh_probe_does_not() {
        let broker = Arc::new(
            FakeBroker::new().with("datatune-one-drive", TokenBehavior::Token("t".into())),
        );
        let resolver = resolver(broker.clone());
        let provider = catalog::one_drive();

        resolver.resolve("u", &provider).await.unwrap();
        resolver.probe("u", &provider).await.unwrap();
        assert_eq!(broker.force_flags(), vec![true, false]);
    }

    #[tokio::test]
    async fn test_missing_connection_is_not_connected() {
        let broker = Arc::new(FakeBroker::new());
        let err = resolver(broker)
            .resolve("u", &catalog::one_drive())
            .await
            .unwrap_err();

        assert_eq!(err.provider.as_str(), "one-drive");
        assert!(matches!(err.cause, BrokerError::NotConnected(_)));
        assert!(err.to_string().starts_with("one-drive not connected"));
    }

    #[tokio::test]
    async fn test_broker_failure_is_swallowed_into_not_connected() {
        let broker = Arc::new(
            FakeBroker::new().with("datatune-custom-oauth", TokenBehavior::Unavailable),
        );
        let err = resolver(broker)
            .resolve("u", &catalog::custom_oauth())
            .await
            .unwrap_err();
        assert!(err.cause.is_unavailable());
    }

    #[tokio::test]
    async fn test_hanging_broker_times_out() {
        let broker = Arc::new(
            FakeBroker::new().with("datatune-google-drive", TokenBehavior::Hang),
        );
        let resolver = CredentialResolver::new(broker.clone(), Duration::from_millis(30));

        let started = Instant::now();
        let err = resolver
            .resolve("u", &catalog::google_drive())
            .await
            .unwrap_err();

        assert_eq!(err.cause, BrokerError::Timeout(Duration::from_millis(30)));
        assert!(started.elapsed() < Duration::from_secs(2));
        assert_eq!(broker.calls(), 1);
    }

    #[test]
    fn test_credential_debug_hides_token() {
        let cred = Credential::new("google-drive".into(), "u", "secret-value");
        assert!(!format!("{:?}", cred).contains("secret-value"));
    }
}
