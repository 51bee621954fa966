//! Repository backend subsystem.
//!
//! # Data Flow
//! ```text
//! Translator / publish pipeline
//!     → RepositoryBackend (fetch / publish)
//!     → artifact.rs (ArtifactRepository: naming, ordering, logging)
//!     → naming.rs (module path → package name, namespace, digest)
//!     → store.rs (PackageStore session handle, created on first use)
//!     → codeartifact.rs (AWS CodeArtifact generic packages)
//! ```
//!
//! # Design Decisions
//! - One capability trait with a single production variant; test doubles
//!   implement the same two operations
//! - Every error carries the full storage coordinate
//! - "Not found" and "not implemented" stay distinct from failures so the
//!   translator can pick soft or hard statuses

pub mod artifact;
pub mod codeartifact;
pub mod naming;
pub mod store;

use std::fmt;

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

use crate::protocol::{ArtifactRequest, AssetKind};

pub use artifact::ArtifactRepository;
pub use naming::{AssetKey, PackageKey, RepositoryLocation};
pub use store::{PackageStore, StoreError, VersionPage};

/// Errors surfaced by a repository backend.
#[derive(Debug, Error)]
pub enum BackendError {
    /// The requested asset does not exist.
    #[error("asset not found: {target}: {source}")]
    NotFound {
        target: String,
        #[source]
        source: StoreError,
    },

    /// The repository deliberately does not serve this operation.
    #[error("{operation} is not implemented: {target}")]
    NotImplemented {
        operation: &'static str,
        target: String,
    },

    /// Network, auth, or server failure.
    #[error("error {action}: {target}: {source}")]
    Failure {
        action: &'static str,
        target: String,
        #[source]
        source: StoreError,
    },
}

/// The three payloads of one published version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishArtifactSet {
    pub info: Bytes,
    pub mod_file: Bytes,
    pub zip: Bytes,
}

impl PublishArtifactSet {
    /// Payloads in upload order: info, mod, zip.
    pub fn in_publish_order(&self) -> [(AssetKind, &Bytes); 3] {
        [
            (AssetKind::Info, &self.info),
            (AssetKind::Mod, &self.mod_file),
            (AssetKind::Zip, &self.zip),
        ]
    }
}

/// A private module repository.
#[async_trait]
pub trait RepositoryBackend: Send + Sync + fmt::Debug {
    /// Serve one module-fetch operation.
    async fn fetch(&self, module: &str, request: &ArtifactRequest) -> Result<Bytes, BackendError>;

    /// Upload a version's info, mod, and zip, in that order.
    async fn publish(
        &self,
        module: &str,
        version: &str,
        artifacts: &PublishArtifactSet,
    ) -> Result<(), BackendError>;
}
