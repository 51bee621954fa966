//! Generic package storage contract.
//!
//! A `PackageStore` is the session handle an [`ArtifactRepository`] talks
//! through. Production uses CodeArtifact; tests substitute in-memory stores.
//!
//! [`ArtifactRepository`]: crate::repository::ArtifactRepository

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

use crate::repository::naming::{AssetKey, PackageKey};

/// Versions per listing page requested from the store.
pub const LIST_PAGE_SIZE: i32 = 50;

/// Errors reported by a package store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The package, version, or asset does not exist.
    #[error("resource not found: {0}")]
    NotFound(String),

    /// Any other failure (network, auth, throttling, server).
    #[error("{0}")]
    Service(String),
}

/// One page of a version listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VersionPage {
    pub versions: Vec<String>,
    pub next_token: Option<String>,
}

/// Versioned generic-package storage.
#[async_trait]
pub trait PackageStore: Send + Sync {
    /// List versions in published status, one page at a time.
    async fn list_published_versions(
        &self,
        package: &PackageKey,
        next_token: Option<String>,
    ) -> Result<VersionPage, StoreError>;

    /// Download one asset.
    async fn get_asset(&self, asset: &AssetKey) -> Result<Bytes, StoreError>;

    /// Upload one asset with its SHA-256. An unfinished upload leaves the
    /// version unlisted until a finishing upload arrives.
    async fn publish_asset(
        &self,
        asset: &AssetKey,
        content: Bytes,
        sha256: &str,
        unfinished: bool,
    ) -> Result<(), StoreError>;
}
