//! Release publishing.
//!
//! # Responsibilities
//! - Read the module path from the local descriptor
//! - Resolve the checkout root and the commit time of the release ref
//! - Build the info, mod, and zip payloads
//! - Hand them to the repository that owns the module
//!
//! # Publish States
//! ```text
//! Descriptor → Version check → VCS metadata → Subdirectory → Route → Payloads → Uploaded
//!      ↘ any precondition failure: stop, nothing built or uploaded
//! ```
//!
//! # Design Decisions
//! - The route is resolved before the zip is built, so an unrouted module
//!   never pays for an export
//! - The mod payload is the descriptor exactly as it is in the working
//!   directory
//! - Backend errors are wrapped, never retried

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use bytes::Bytes;
use thiserror::Error;

use crate::protocol::{check_module_version, VersionError, VersionInfo};
use crate::publish::archive::{build_module_zip, ArchiveError};
use crate::publish::descriptor::{module_path, DESCRIPTOR_FILE};
use crate::publish::vcs::{Vcs, VcsError};
use crate::repository::{BackendError, PublishArtifactSet};
use crate::routing::PatternRouter;

/// Errors that stop a publish.
#[derive(Debug, Error)]
pub enum PublishError {
    #[error("cannot read module descriptor {}: {source}", .path.display())]
    ModuleDescriptorMissing {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("no module directive in {}", .0.display())]
    ModulePathMissing(PathBuf),

    #[error(transparent)]
    InvalidVersion(#[from] VersionError),

    #[error(transparent)]
    Vcs(#[from] VcsError),

    #[error("module directory {} is outside repository root {}", .module_dir.display(), .root.display())]
    PathOutsideRepo { module_dir: PathBuf, root: PathBuf },

    #[error("commit timestamp {0} is out of range")]
    InvalidTimestamp(i64),

    #[error("failed to encode version info: {0}")]
    InfoEncoding(#[from] serde_json::Error),

    #[error("failed to build module zip: {0}")]
    Archive(#[from] ArchiveError),

    #[error("no repository configured for module {0}")]
    NoRoute(String),

    #[error(transparent)]
    Backend(#[from] BackendError),
}

/// Summary of a completed publish.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishReport {
    pub module: String,
    pub version: String,
    /// Module directory relative to the checkout root, `/`-separated.
    pub subdir: String,
    /// Pattern of the route that received the upload.
    pub pattern: String,
    pub zip_size: usize,
}

/// Publishes the module in a working directory.
pub struct PublishPipeline {
    router: Arc<PatternRouter>,
    vcs: Arc<dyn Vcs>,
    work_dir: PathBuf,
}

impl PublishPipeline {
    pub fn new(router: Arc<PatternRouter>, vcs: Arc<dyn Vcs>, work_dir: impl Into<PathBuf>) -> Self {
        Self {
            router,
            vcs,
            work_dir: work_dir.into(),
        }
    }

    /// Publish `version` (a tag or other ref) of the module in the working
    /// directory.
    pub async fn publish(&self, version: &str) -> Result<PublishReport, PublishError> {
        // 1. Descriptor
        let descriptor_path = self.work_dir.join(DESCRIPTOR_FILE);
        let descriptor = tokio::fs::read(&descriptor_path)
            .await
            .map_err(|source| PublishError::ModuleDescriptorMissing {
                path: descriptor_path.clone(),
                source,
            })?;
        let module = module_path(&String::from_utf8_lossy(&descriptor))
            .ok_or_else(|| PublishError::ModulePathMissing(descriptor_path.clone()))?;
        check_module_version(&module, version)?;

        // 2. VCS metadata
        let root = self.vcs.root_path(&self.work_dir).await?;
        let commit_secs = self.vcs.commit_timestamp(&root, version).await?;

        // 3. Subdirectory
        let subdir = relative_subdir(&root, &self.work_dir).await?;

        tracing::info!(
            module = %module,
            version = %version,
            root = %root.display(),
            subdir = %subdir,
            commit_secs,
            "Preparing release"
        );

        // 4. Version info
        let info = VersionInfo::from_commit(version, commit_secs)
            .ok_or(PublishError::InvalidTimestamp(commit_secs))?
            .to_json()?;

        // 5. Route
        let route = self
            .router
            .resolve(&module)
            .ok_or_else(|| PublishError::NoRoute(module.clone()))?;

        // 6. Zip
        let tree = self.vcs.export_tree(&root, version).await?;
        let zip = build_module_zip(&module, version, &subdir, &tree)?;
        let zip_size = zip.len();

        // 7. Upload
        let artifacts = PublishArtifactSet {
            info: Bytes::from(info),
            mod_file: Bytes::from(descriptor),
            zip,
        };
        route.backend().publish(&module, version, &artifacts).await?;

        tracing::info!(
            module = %module,
            version = %version,
            pattern = %route.pattern(),
            zip_size,
            "Published"
        );

        Ok(PublishReport {
            module,
            version: version.to_string(),
            subdir,
            pattern: route.pattern().to_string(),
            zip_size,
        })
    }
}

/// `module_dir` relative to `root` as a `/`-separated path; empty when they
/// are the same directory.
async fn relative_subdir(root: &Path, module_dir: &Path) -> Result<String, PublishError> {
    // Canonical forms so symlinked temp dirs and `..` compare equal.
    let canonical_root = tokio::fs::canonicalize(root)
        .await
        .unwrap_or_else(|_| root.to_path_buf());
    let canonical_dir = tokio::fs::canonicalize(module_dir)
        .await
        .unwrap_or_else(|_| module_dir.to_path_buf());

    let relative = canonical_dir
        .strip_prefix(&canonical_root)
        .map_err(|_| PublishError::PathOutsideRepo {
            module_dir: module_dir.to_path_buf(),
            root: root.to_path_buf(),
        })?;

    Ok(relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/"))
}
