//! Fixed-result search strategy.
//!
//! Stands in for a vendor integration: returns the same files for every
//! query. A live integration would call the vendor search API with the
//! credential as a bearer token and a `name contains` filter, following
//! page tokens until exhausted.

use async_trait::async_trait;

use super::{FileRef, SearchProvider};
use crate::credentials::Credential;
use crate::errors::Result;

/// Search strategy that always answers with a fixed file list.
#[derive(Debug, Clone, Default)]
pub struct CannedSearch {
    files: Vec<FileRef>,
}

impl CannedSearch {
    pub fn new(files: Vec<FileRef>) -> Self {
        Self { files }
    }
}

#[async_trait]
impl SearchProvider for CannedSearch {
    async fn search(&self, credential: &Credential, query: &str) -> Result<Vec<FileRef>> {
        tracing::info!(
            provider = %credential.provider(),
            query,
            "simulating provider search"
        );
        Ok(self.files.clone())
    }
}
