//! Per-provider and aggregate search outcomes.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::broker::BrokerError;
use crate::credentials::NotConnected;
use crate::providers::{FileRef, Provider, ProviderId};

// ---------------------------------------------------------------------------
// Failures
// ---------------------------------------------------------------------------

/// Category of a per-provider failure. None of them abort the aggregate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// No valid credential for the provider.
    NotConnected,
    /// Network, timeout or vendor error during the search call.
    ProviderCallFailed,
    /// The token broker itself could not be reached in time.
    BrokerUnavailable,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchFailure {
    pub kind: FailureKind,
    pub message: String,
}

impl SearchFailure {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Translate a credential miss into the failure recorded for `provider`.
    pub fn from_not_connected(provider: &Provider, err: &NotConnected) -> Self {
        match &err.cause {
            BrokerError::NotConnected(_) => {
                Self::new(FailureKind::NotConnected, provider.not_connected_message())
            }
            BrokerError::Rejected { status, .. } => Self::new(
                FailureKind::BrokerUnavailable,
                format!(
                    "{}: token broker rejected the request ({})",
                    provider.display_name, status
                ),
            ),
            BrokerError::Timeout(after) => Self::new(
                FailureKind::BrokerUnavailable,
                format!(
                    "{}: token broker timed out after {}ms",
                    provider.display_name,
                    after.as_millis()
                ),
            ),
            BrokerError::Unavailable(reason) => Self::new(
                FailureKind::BrokerUnavailable,
                format!("{}: token broker unavailable ({})", provider.display_name, reason),
            ),
        }
    }
}

// ---------------------------------------------------------------------------
// SearchResult
// ---------------------------------------------------------------------------

/// Outcome of searching one provider.
///
/// Built only through [`SearchResult::succeeded`] and [`SearchResult::failed`],
/// so a failed result never carries files and a successful one never carries
/// an error.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResult {
    provider: ProviderId,
    success: bool,
    files: Vec<FileRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error_kind: Option<FailureKind>,
}

impl SearchResult {
    pub fn succeeded(provider: ProviderId, files: Vec<FileRef>) -> Self {
        Self {
            provider,
            success: true,
            files,
            error: None,
            error_kind: None,
        }
    }

    pub fn failed(provider: ProviderId, failure: SearchFailure) -> Self {
        Self {
            provider,
            success: false,
            files: Vec::new(),
            error: Some(failure.message),
            error_kind: Some(failure.kind),
        }
    }

    pub fn provider(&self) -> &ProviderId {
        &self.provider
    }

    pub fn success(&self) -> bool {
        self.success
    }

    pub fn files(&self) -> &[FileRef] {
        &self.files
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn error_kind(&self) -> Option<FailureKind> {
        self.error_kind
    }
}

// ---------------------------------------------------------------------------
// AggregateResult
// ---------------------------------------------------------------------------

/// One [`SearchResult`] per configured provider, in configuration order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateResult {
    results: Vec<SearchResult>,
}

impl AggregateResult {
    pub fn new(results: Vec<SearchResult>) -> Self {
        Self { results }
    }

    pub fn results(&self) -> &[SearchResult] {
        &self.results
    }

    pub fn get(&self, provider: &ProviderId) -> Option<&SearchResult> {
        self.results.iter().find(|r| r.provider() == provider)
    }

    /// Files of every successful provider, concatenated in configuration
    /// order. No ranking and no de-duplication across providers.
    pub fn files(&self) -> Vec<FileRef> {
        self.results
            .iter()
            .filter(|r| r.success())
            .flat_map(|r| r.files().iter().cloned())
            .collect()
    }

    pub fn total(&self) -> usize {
        self.results
            .iter()
            .filter(|r| r.success())
            .map(|r| r.files().len())
            .sum()
    }

    /// Providers whose search succeeded, in configuration order.
    pub fn connected_services(&self) -> Vec<ProviderId> {
        self.results
            .iter()
            .filter(|r| r.success())
            .map(|r| r.provider().clone())
            .collect()
    }

    /// The response shape served by `/api/search-files` and `search --json`.
    pub fn report(&self) -> SearchReport {
        let results_by_service = self
            .results
            .iter()
            .map(|r| {
                (
                    r.provider().to_string(),
                    ServiceSummary {
                        count: r.files().len(),
                        files: r.files().to_vec(),
                        error: r.error().map(str::to_string),
                    },
                )
            })
            .collect();

        SearchReport {
            success: true,
            files: self.files(),
            total: self.total(),
            results_by_service,
            connected_services: self.connected_services(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServiceSummary {
    pub count: usize,
    pub files: Vec<FileRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchReport {
    pub success: bool,
    pub files: Vec<FileRef>,
    pub total: usize,
    pub results_by_service: BTreeMap<String, ServiceSummary>,
    pub connected_services: Vec<ProviderId>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::catalog;
    use std::time::Duration;

    fn ok(provider: &str, n: usize) -> SearchResult {
        SearchResult::succeeded(
            provider.into(),
            (0..n)
                .map(|i| FileRef::new(&format!("{provider}{i}"), "f", provider))
                .collect(),
        )
    }

    #[test]
    fn test_failed_result_has_no_files_and_an_error() {
        let r = SearchResult::failed(
            "one-drive".into(),
            SearchFailure::new(FailureKind::NotConnected, "OneDrive not connected."),
        );
        assert!(!r.success());
        assert!(r.files().is_empty());
        assert_eq!(r.error(), Some("OneDrive not connected."));
        assert_eq!(r.error_kind(), Some(FailureKind::NotConnected));
    }

    #[test]
    fn test_succeeded_result_has_no_error() {
        let r = ok("google-drive", 2);
        assert!(r.success());
        assert!(r.error().is_none());
        let json = serde_json::to_value(&r).unwrap();
        assert!(json.get("error").is_none());
        assert!(json.get("error_kind").is_none());
    }

    #[test]
    fn test_failure_from_not_connected_variants() {
        let provider = catalog::google_drive();
        let miss = |cause| NotConnected {
            provider: provider.id.clone(),
            cause,
        };

        let f = SearchFailure::from_not_connected(&provider, &miss(BrokerError::NotConnected("x".into())));
        assert_eq!(f.kind, FailureKind::NotConnected);
        assert_eq!(f.message, "Google Drive not connected.");

        let f = SearchFailure::from_not_connected(
            &provider,
            &miss(BrokerError::Timeout(Duration::from_millis(40))),
        );
        assert_eq!(f.kind, FailureKind::BrokerUnavailable);
        assert!(f.message.contains("timed out"));

        let f = SearchFailure::from_not_connected(&provider, &miss(BrokerError::Unavailable("reset".into())));
        assert_eq!(f.kind, FailureKind::BrokerUnavailable);
        assert!(f.message.contains("unavailable"));

        let f = SearchFailure::from_not_connected(
            &provider,
            &miss(BrokerError::Rejected {
                status: 401,
                message: "invalid management key".into(),
            }),
        );
        assert_eq!(f.kind, FailureKind::BrokerUnavailable);
        assert_eq!(f.message, "Google Drive: token broker rejected the request (401)");
    }

    #[test]
    fn test_report_shape() {
        let aggregate = AggregateResult::new(vec![
            ok("google-drive", 2),
            SearchResult::failed(
                "one-drive".into(),
                SearchFailure::new(FailureKind::NotConnected, "OneDrive not connected."),
            ),
        ]);
        let json = serde_json::to_value(aggregate.report()).unwrap();

        assert_eq!(json["success"], true);
        assert_eq!(json["total"], 2);
        assert_eq!(json["connected_services"], serde_json::json!(["google-drive"]));
        assert_eq!(json["results_by_service"]["google-drive"]["count"], 2);
        assert_eq!(json["results_by_service"]["one-drive"]["count"], 0);
        assert_eq!(
            json["results_by_service"]["one-drive"]["error"],
            "OneDrive not connected."
        );
        assert!(json["results_by_service"]["google-drive"].get("error").is_none());
    }

    #[test]
    fn test_get_by_provider() {
        let aggregate = AggregateResult::new(vec![ok("a", 1), ok("b", 0)]);
        assert_eq!(aggregate.get(&"b".into()).unwrap().files().len(), 0);
        assert!(aggregate.get(&"c".into()).is_none());
    }
}
