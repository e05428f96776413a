//! Storage provider catalog and pluggable search strategies.
//!
//! A [`Provider`] describes one external storage integration: the id the
//! rest of the system uses, the broker application id credentials are
//! requested under, and the OAuth scopes a live connection needs. The search
//! itself is a [`SearchProvider`] strategy registered next to it in a
//! [`ProviderRegistry`], so new integrations slot in without touching the
//! aggregator.

pub mod canned;
pub mod catalog;

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::credentials::Credential;
use crate::errors::Result;

pub use canned::CannedSearch;
pub use catalog::default_registry;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Identifier of a configured provider (e.g. `google-drive`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProviderId(String);

impl ProviderId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ProviderId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Static description of a storage integration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Provider {
    pub id: ProviderId,
    /// Broker application id credentials are fetched under.
    pub app_id: String,
    pub display_name: String,
    /// OAuth scopes requested when connecting.
    pub scopes: Vec<String>,
    /// Extra service names the connect flow accepts for this provider.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,
}

impl Provider {
    pub fn new(id: &str, app_id: &str, display_name: &str) -> Self {
        Self {
            id: ProviderId::new(id),
            app_id: app_id.to_string(),
            display_name: display_name.to_string(),
            scopes: Vec::new(),
            aliases: Vec::new(),
        }
    }

    pub fn with_scopes(mut self, scopes: &[&str]) -> Self {
        self.scopes = scopes.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_aliases(mut self, aliases: &[&str]) -> Self {
        self.aliases = aliases.iter().map(|s| s.to_string()).collect();
        self
    }

    /// Whether `service` names this provider, by id or alias.
    pub fn answers_to(&self, service: &str) -> bool {
        self.id.as_str() == service || self.aliases.iter().any(|a| a == service)
    }

    /// Message recorded when the user has no credential for this provider.
    pub fn not_connected_message(&self) -> String {
        format!("{} not connected.", self.display_name)
    }
}

/// A file returned by a provider search.
///
/// `provider` is the storage the file actually lives in, which for the
/// bucket-style custom provider is more specific than the provider id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRef {
    pub id: String,
    pub name: String,
    #[serde(rename = "service")]
    pub provider: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified: Option<String>,
    #[serde(rename = "mimeType", default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
}

impl FileRef {
    pub fn new(id: &str, name: &str, provider: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            provider: provider.to_string(),
            size: None,
            modified: None,
            mime_type: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Strategy trait
// ---------------------------------------------------------------------------

/// Search capability of a single provider.
///
/// Implementations receive a credential that was freshly resolved for the
/// current user and return the matching files in the vendor's order.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    async fn search(&self, credential: &Credential, query: &str) -> Result<Vec<FileRef>>;
}

// ---------------------------------------------------------------------------
// ProviderRegistry
// ---------------------------------------------------------------------------

/// A provider together with its search strategy.
#[derive(Clone)]
pub struct RegisteredProvider {
    pub provider: Provider,
    pub search: Arc<dyn SearchProvider>,
}

/// Ordered set of configured providers.
///
/// Iteration order is configuration order, which is also the order of the
/// aggregated file list.
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    entries: Vec<RegisteredProvider>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a provider. Re-registering an id swaps the entry in place.
    pub fn register(&mut self, provider: Provider, search: Arc<dyn SearchProvider>) {
        let entry = RegisteredProvider { provider, search };
        match self
            .entries
            .iter_mut()
            .find(|e| e.provider.id == entry.provider.id)
        {
            Some(existing) => {
                tracing::debug!(provider = %entry.provider.id, "replacing provider strategy");
                *existing = entry;
            }
            None => self.entries.push(entry),
        }
    }

    /// Builder-style variant of [`Self::register`].
    pub fn with(mut self, provider: Provider, search: Arc<dyn SearchProvider>) -> Self {
        self.register(provider, search);
        self
    }

    pub fn get(&self, id: &ProviderId) -> Option<&RegisteredProvider> {
        self.entries.iter().find(|e| &e.provider.id == id)
    }

    /// Look up a provider by id or by one of its aliases.
    pub fn find_by_service(&self, service: &str) -> Option<&Provider> {
        self.entries
            .iter()
            .map(|e| &e.provider)
            .find(|p| p.answers_to(service))
    }

    pub fn iter(&self) -> impl Iterator<Item = &RegisteredProvider> {
        self.entries.iter()
    }

    pub fn providers(&self) -> impl Iterator<Item = &Provider> {
        self.entries.iter().map(|e| &e.provider)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.entries.iter().map(|e| e.provider.id.as_str()))
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
