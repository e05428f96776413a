//! Secrets and deployment switches read from the process environment.
//!
//! Built once in `main` and handed to whatever needs it; nothing here is a
//! global.

use crate::errors::{DataTuneError, Result};

pub const PROJECT_ID_ENV: &str = "DESCOPE_PROJECT_ID";
pub const MANAGEMENT_KEY_ENV: &str = "DESCOPE_MANAGEMENT_KEY";
pub const BROKER_URL_ENV: &str = "DATATUNE_BROKER_URL";
pub const LOG_FORMAT_ENV: &str = "DATATUNE_LOG_FORMAT";

#[derive(Debug, Clone, Default)]
pub struct EnvConfig {
    pub project_id: Option<String>,
    pub management_key: Option<String>,
    /// Overrides `Settings::broker_base_url` when set.
    pub broker_url: Option<String>,
    pub json_logs: bool,
}

impl EnvConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary lookup; blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        Self {
            project_id: get(PROJECT_ID_ENV),
            management_key: get(MANAGEMENT_KEY_ENV),
            broker_url: get(BROKER_URL_ENV),
            json_logs: get(LOG_FORMAT_ENV).is_some_and(|v| v.eq_ignore_ascii_case("json")),
        }
    }

    /// Project id and management key, or a config error naming what's missing.
    pub fn broker_credentials(&self) -> Result<(&str, &str)> {
        let project = self
            .project_id
            .as_deref()
            .ok_or_else(|| DataTuneError::Config(format!("{PROJECT_ID_ENV} is not set")))?;
        let key = self
            .management_key
            .as_deref()
            .ok_or_else(|| DataTuneError::Config(format!("{MANAGEMENT_KEY_ENV} is not set")))?;
        Ok((project, key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_reads_all_keys() {
        let env = EnvConfig::from_lookup(lookup(&[
            (PROJECT_ID_ENV, "P123"),
            (MANAGEMENT_KEY_ENV, "K456"),
            (BROKER_URL_ENV, "http://localhost:9000"),
            (LOG_FORMAT_ENV, "JSON"),
        ]));
        assert_eq!(env.broker_credentials().unwrap(), ("P123", "K456"));
        assert_eq!(env.broker_url.as_deref(), Some("http://localhost:9000"));
        assert!(env.json_logs);
    }

    #[test]
    fn test_blank_values_are_unset() {
        let env = EnvConfig::from_lookup(lookup(&[(PROJECT_ID_ENV, "  "), (MANAGEMENT_KEY_ENV, "K")]));
        assert!(env.project_id.is_none());
        let err = env.broker_credentials().unwrap_err();
        assert!(err.to_string().contains(PROJECT_ID_ENV));
    }

    #[test]
    fn test_missing_management_key() {
        let env = EnvConfig::from_lookup(lookup(&[(PROJECT_ID_ENV, "P")]));
        let err = env.broker_credentials().unwrap_err();
        assert!(err.to_string().contains(MANAGEMENT_KEY_ENV));
        assert!(!env.json_logs);
    }
}
