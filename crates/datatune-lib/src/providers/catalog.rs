//! Built-in provider catalog.

use std::sync::Arc;

use super::{CannedSearch, FileRef, Provider, ProviderRegistry};

pub const GOOGLE_DRIVE: &str = "google-drive";
pub const ONE_DRIVE: &str = "one-drive";
pub const CUSTOM_OAUTH: &str = "custom-oauth";

pub fn google_drive() -> Provider {
    Provider::new(GOOGLE_DRIVE, "datatune-google-drive", "Google Drive").with_scopes(&[
        "https://www.googleapis.com/auth/drive.readonly",
        "https://www.googleapis.com/auth/drive.metadata.readonly",
    ])
}

pub fn one_drive() -> Provider {
    Provider::new(ONE_DRIVE, "datatune-one-drive", "OneDrive")
        .with_scopes(&["Files.ReadWrite", "User.Read"])
}

/// Bucket-style storages (Azure Blob, S3, GCS) behind one OAuth app.
///
/// Their scopes are service-specific, so none are requested up front.
pub fn custom_oauth() -> Provider {
    Provider::new(CUSTOM_OAUTH, "datatune-custom-oauth", "Custom storage").with_aliases(&[
        "azure-blob-storage",
        "aws-s3",
        "gcp-cloud-storage",
    ])
}

/// The default registry: Google Drive, OneDrive, custom OAuth storage, in
/// that order, each backed by a canned search.
pub fn default_registry() -> ProviderRegistry {
    ProviderRegistry::new()
        .with(
            google_drive(),
            Arc::new(CannedSearch::new(vec![
                FileRef::new("gdrive123", "Report Q3.pdf", GOOGLE_DRIVE),
                FileRef::new("gdrive456", "Presentation.pptx", GOOGLE_DRIVE),
            ])),
        )
        .with(
            one_drive(),
            Arc::new(CannedSearch::new(vec![
                FileRef::new("onedrive789", "Meeting notes.docx", ONE_DRIVE),
                FileRef::new("onedrive101", "Budget 2025.xlsx", ONE_DRIVE),
            ])),
        )
        .with(
            custom_oauth(),
            Arc::new(CannedSearch::new(vec![
                FileRef::new("azure123", "Azure_Data.json", "azure-blob-storage"),
                FileRef::new("aws456", "AWS_Logs.zip", "aws-s3"),
            ])),
        )
}
