//! Fan-out search across every configured provider.
//!
//! Each provider branch resolves a credential and, if one exists, runs the
//! provider's search. Branches run concurrently, each outbound call is
//! bounded by a timeout, and a branch that fails in any way degrades to a
//! failed [`SearchResult`] for that provider only.

pub mod types;

use std::time::{Duration, Instant};

use futures_util::future::join_all;
use tokio::time::timeout;

use crate::credentials::CredentialResolver;
use crate::providers::{ProviderId, ProviderRegistry, RegisteredProvider};

pub use types::{AggregateResult, FailureKind, SearchFailure, SearchReport, SearchResult, ServiceSummary};

pub struct SearchAggregator {
    registry: ProviderRegistry,
    resolver: CredentialResolver,
    search_timeout: Duration,
}

impl SearchAggregator {
    pub fn new(
        registry: ProviderRegistry,
        resolver: CredentialResolver,
        search_timeout: Duration,
    ) -> Self {
        Self {
            registry,
            resolver,
            search_timeout,
        }
    }

    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    pub fn resolver(&self) -> &CredentialResolver {
        &self.resolver
    }

    /// Search every provider for `query` on behalf of `user_id`.
    ///
    /// Always returns exactly one result per configured provider, in
    /// configuration order. The query is passed through untouched; rejecting
    /// blank queries is the caller's job.
    pub async fn search_all(&self, user_id: &str, query: &str) -> AggregateResult {
        let start = Instant::now();

        let branches = self
            .registry
            .iter()
            .map(|entry| self.search_provider(entry, user_id, query));
        let aggregate = AggregateResult::new(join_all(branches).await);

        tracing::info!(
            user_id,
            providers = self.registry.len(),
            connected = aggregate.connected_services().len(),
            total = aggregate.total(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "search completed"
        );
        aggregate
    }

    async fn search_provider(
        &self,
        entry: &RegisteredProvider,
        user_id: &str,
        query: &str,
    ) -> SearchResult {
        let provider = &entry.provider;

        let credential = match self.resolver.resolve(user_id, provider).await {
            Ok(credential) => credential,
            Err(miss) => {
                return SearchResult::failed(
                    provider.id.clone(),
                    SearchFailure::from_not_connected(provider, &miss),
                )
            }
        };

        match timeout(self.search_timeout, entry.search.search(&credential, query)).await {
            Ok(Ok(files)) => {
                tracing::debug!(provider = %provider.id, count = files.len(), "provider search ok");
                SearchResult::succeeded(provider.id.clone(), files)
            }
            Ok(Err(e)) => {
                tracing::warn!(provider = %provider.id, "provider search failed: {}", e);
                SearchResult::failed(
                    provider.id.clone(),
                    SearchFailure::new(FailureKind::ProviderCallFailed, e.to_string()),
                )
            }
            Err(_) => {
                tracing::warn!(
                    provider = %provider.id,
                    timeout_ms = self.search_timeout.as_millis() as u64,
                    "provider search timed out"
                );
                SearchResult::failed(
                    provider.id.clone(),
                    SearchFailure::new(
                        FailureKind::ProviderCallFailed,
                        format!(
                            "{} search timed out after {}ms",
                            provider.display_name,
                            self.search_timeout.as_millis()
                        ),
                    ),
                )
            }
        }
    }

    /// Providers the user currently holds a credential for, in configuration
    /// order. Lets the broker serve cached tokens.
    pub async fn connected_services(&self, user_id: &str) -> Vec<ProviderId> {
        let probes = self.registry.providers().map(|provider| async move {
            self.resolver
                .probe(user_id, provider)
                .await
                .ok()
                .map(|_| provider.id.clone())
        });
        join_all(probes).await.into_iter().flatten().collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
