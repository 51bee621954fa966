//! Repository adapter over a generic package store.
//!
//! # Responsibilities
//! - Map module paths onto package coordinates
//! - Page through published versions for `@v/list`
//! - Fetch single assets for `.info`, `.mod`, `.zip`
//! - Publish info, mod, and zip in order, finishing the version last
//! - Own the store session, created on first use

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::OnceCell;

use crate::config::CodeArtifactConfig;
use crate::observability::metrics;
use crate::protocol::{ArtifactRequest, AssetKind};
use crate::repository::codeartifact::CodeArtifactStore;
use crate::repository::naming::{asset_sha256, namespace_or_default, RepositoryLocation};
use crate::repository::store::{PackageStore, StoreError};
use crate::repository::{BackendError, PublishArtifactSet, RepositoryBackend};

/// A repository of generic packages, one package per module.
pub struct ArtifactRepository {
    location: RepositoryLocation,
    region: Option<String>,
    store: OnceCell<Arc<dyn PackageStore>>,
}

impl ArtifactRepository {
    /// Create an adapter; the storage session is opened lazily.
    pub fn new(config: &CodeArtifactConfig) -> Self {
        Self {
            location: RepositoryLocation {
                domain: config.domain.clone(),
                domain_owner: config.domain_owner.clone(),
                repository: config.repository.clone(),
                namespace: namespace_or_default(config.namespace.as_deref()).to_string(),
            },
            region: config.region.clone(),
            store: OnceCell::new(),
        }
    }

    /// Use `store` instead of opening a session on first use.
    pub fn with_store(mut self, store: Arc<dyn PackageStore>) -> Self {
        self.store = OnceCell::new_with(Some(store));
        self
    }

    /// Where this repository lives.
    pub fn location(&self) -> &RepositoryLocation {
        &self.location
    }

    async fn store(&self) -> &dyn PackageStore {
        self.store
            .get_or_init(|| async {
                let store = CodeArtifactStore::connect(self.region.as_deref()).await;
                Arc::new(store) as Arc<dyn PackageStore>
            })
            .await
            .as_ref()
    }

    async fn list_versions(&self, module: &str) -> Result<Bytes, BackendError> {
        let package = self.location.package(module);
        let store = self.store().await;

        let mut body = String::new();
        let mut count = 0usize;
        let mut next_token = None;
        loop {
            let page = match store.list_published_versions(&package, next_token).await {
                Ok(page) => page,
                Err(StoreError::NotFound(_)) => {
                    tracing::debug!(target_package = %package, "Package not found, empty version list");
                    metrics::record_backend_operation("list_versions", "not_found");
                    return Ok(Bytes::new());
                }
                Err(source) => {
                    metrics::record_backend_operation("list_versions", "error");
                    return Err(BackendError::Failure {
                        action: "listing versions",
                        target: package.to_string(),
                        source,
                    });
                }
            };

            count += page.versions.len();
            for version in &page.versions {
                body.push_str(version);
                body.push('\n');
            }

            next_token = page.next_token;
            if next_token.is_none() {
                break;
            }
        }

        tracing::info!(
            domain = %self.location.domain,
            domain_owner = self.location.domain_owner.as_deref().unwrap_or(""),
            repository = %self.location.repository,
            namespace = %self.location.namespace,
            package = %package.package,
            count,
            "Listed versions"
        );
        metrics::record_backend_operation("list_versions", "ok");
        Ok(Bytes::from(body))
    }

    async fn get_asset(&self, module: &str, version: &str, kind: AssetKind) -> Result<Bytes, BackendError> {
        let key = self.location.package(module).asset(version, kind);

        match self.store().await.get_asset(&key).await {
            Ok(bytes) => {
                tracing::info!(
                    domain = %self.location.domain,
                    domain_owner = self.location.domain_owner.as_deref().unwrap_or(""),
                    repository = %self.location.repository,
                    namespace = %self.location.namespace,
                    package = %key.package.package,
                    version = %key.version,
                    asset = %key.asset_name(),
                    size = bytes.len(),
                    "Got asset"
                );
                metrics::record_backend_operation("get_asset", "ok");
                Ok(bytes)
            }
            Err(source @ StoreError::NotFound(_)) => {
                metrics::record_backend_operation("get_asset", "not_found");
                Err(BackendError::NotFound {
                    target: key.to_string(),
                    source,
                })
            }
            Err(source) => {
                metrics::record_backend_operation("get_asset", "error");
                Err(BackendError::Failure {
                    action: "getting asset",
                    target: key.to_string(),
                    source,
                })
            }
        }
    }
}

impl fmt::Debug for ArtifactRepository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArtifactRepository")
            .field("location", &self.location)
            .field("region", &self.region)
            .field("session_open", &self.store.initialized())
            .finish()
    }
}

#[async_trait]
impl RepositoryBackend for ArtifactRepository {
    async fn fetch(&self, module: &str, request: &ArtifactRequest) -> Result<Bytes, BackendError> {
        match request {
            ArtifactRequest::Latest => Err(BackendError::NotImplemented {
                operation: "@latest",
                target: self.location.package(module).to_string(),
            }),
            ArtifactRequest::VersionList => self.list_versions(module).await,
            ArtifactRequest::Info(version) => self.get_asset(module, version, AssetKind::Info).await,
            ArtifactRequest::Mod(version) => self.get_asset(module, version, AssetKind::Mod).await,
            ArtifactRequest::Zip(version) => self.get_asset(module, version, AssetKind::Zip).await,
        }
    }

    async fn publish(
        &self,
        module: &str,
        version: &str,
        artifacts: &PublishArtifactSet,
    ) -> Result<(), BackendError> {
        let package = self.location.package(module);
        let store = self.store().await;

        // Only the zip finishes the version; until then info and mod stay
        // unlisted, so readers never see metadata without an archive.
        for (kind, content) in artifacts.in_publish_order() {
            let key = package.asset(version, kind);
            let unfinished = kind != AssetKind::Zip;
            let sha256 = asset_sha256(content);

            if let Err(source) = store
                .publish_asset(&key, content.clone(), &sha256, unfinished)
                .await
            {
                metrics::record_backend_operation("publish_asset", "error");
                return Err(BackendError::Failure {
                    action: "publishing asset",
                    target: key.to_string(),
                    source,
                });
            }

            tracing::info!(
                domain = %self.location.domain,
                domain_owner = self.location.domain_owner.as_deref().unwrap_or(""),
                repository = %self.location.repository,
                namespace = %self.location.namespace,
                package = %key.package.package,
                version = %key.version,
                asset = %key.asset_name(),
                sha256 = %sha256,
                unfinished,
                "Published asset"
            );
            metrics::record_backend_operation("publish_asset", "ok");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use crate::repository::naming::{AssetKey, PackageKey};
    use crate::repository::store::VersionPage;

    /// Store that replays canned listing pages and records uploads.
    #[derive(Default)]
    struct ScriptedStore {
        pages: Mutex<VecDeque<Result<VersionPage, StoreError>>>,
        tokens_seen: Mutex<Vec<Option<String>>>,
        uploads: Mutex<Vec<(String, Bytes, String, bool)>>,
        fail_upload_at: Option<usize>,
    }

    #[async_trait]
    impl PackageStore for ScriptedStore {
        async fn list_published_versions(
            &self,
            _package: &PackageKey,
            next_token: Option<String>,
        ) -> Result<VersionPage, StoreError> {
            self.tokens_seen.lock().unwrap().push(next_token);
            self.pages
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(VersionPage::default()))
        }

        async fn get_asset(&self, asset: &AssetKey) -> Result<Bytes, StoreError> {
            Err(StoreError::NotFound(asset.asset_name()))
        }

        async fn publish_asset(
            &self,
            asset: &AssetKey,
            content: Bytes,
            sha256: &str,
            unfinished: bool,
        ) -> Result<(), StoreError> {
            let mut uploads = self.uploads.lock().unwrap();
            uploads.push((asset.asset_name(), content, sha256.to_string(), unfinished));
            if self.fail_upload_at == Some(uploads.len()) {
                return Err(StoreError::Service("throttled".into()));
            }
            Ok(())
        }
    }

    fn config() -> CodeArtifactConfig {
        CodeArtifactConfig {
            domain: "acme".into(),
            domain_owner: Some("111111111111".into()),
            repository: "go".into(),
            namespace: None,
            region: None,
        }
    }

    fn repository(store: Arc<ScriptedStore>) -> ArtifactRepository {
        ArtifactRepository::new(&config()).with_store(store)
    }

    fn page(versions: &[&str], next: Option<&str>) -> Result<VersionPage, StoreError> {
        Ok(VersionPage {
            versions: versions.iter().map(|v| v.to_string()).collect(),
            next_token: next.map(str::to_string),
        })
    }

    fn artifacts() -> PublishArtifactSet {
        PublishArtifactSet {
            info: Bytes::from_static(b"{\"Version\":\"v0.1.0\"}"),
            mod_file: Bytes::from_static(b"module github.com/acme/widgets\n"),
            zip: Bytes::from_static(b"PK\x05\x06zip"),
        }
    }

    #[test]
    fn test_namespace_defaults() {
        let repo = ArtifactRepository::new(&config());
        assert_eq!(repo.location().namespace, "modgate");
    }

    #[tokio::test]
    async fn test_version_list_concatenates_pages_in_order() {
        let store = Arc::new(ScriptedStore::default());
        store.pages.lock().unwrap().extend([
            page(&["v0.2.0", "v0.1.0"], Some("t1")),
            page(&["v1.0.0"], None),
        ]);

        let body = repository(store.clone())
            .fetch("github.com/acme/widgets", &ArtifactRequest::VersionList)
            .await
            .unwrap();

        assert_eq!(&body[..], b"v0.2.0\nv0.1.0\nv1.0.0\n");
        assert_eq!(
            *store.tokens_seen.lock().unwrap(),
            vec![None, Some("t1".to_string())]
        );
    }

    #[tokio::test]
    async fn test_version_list_empty_page() {
        let store = Arc::new(ScriptedStore::default());
        let body = repository(store)
            .fetch("github.com/acme/widgets", &ArtifactRequest::VersionList)
            .await
            .unwrap();
        assert!(body.is_empty());
    }

    #[tokio::test]
    async fn test_version_list_missing_package_is_empty() {
        let store = Arc::new(ScriptedStore::default());
        store
            .pages
            .lock()
            .unwrap()
            .push_back(Err(StoreError::NotFound("no such package".into())));

        let body = repository(store)
            .fetch("github.com/acme/widgets", &ArtifactRequest::VersionList)
            .await
            .unwrap();
        assert!(body.is_empty());
    }

    #[tokio::test]
    async fn test_version_list_failure_carries_coordinates() {
        let store = Arc::new(ScriptedStore::default());
        store
            .pages
            .lock()
            .unwrap()
            .push_back(Err(StoreError::Service("access denied".into())));

        let err = repository(store)
            .fetch("github.com/acme/widgets", &ArtifactRequest::VersionList)
            .await
            .unwrap_err();
        let message = err.to_string();
        assert!(matches!(err, BackendError::Failure { .. }));
        assert!(message.contains("Domain:acme(111111111111)"));
        assert!(message.contains("NS:modgate"));
        assert!(message.contains("Pkg:github.com+2Facme+2Fwidgets"));
        assert!(message.contains("access denied"));
    }

    #[tokio::test]
    async fn test_latest_not_implemented() {
        let store = Arc::new(ScriptedStore::default());
        let err = repository(store)
            .fetch("github.com/acme/widgets", &ArtifactRequest::Latest)
            .await
            .unwrap_err();
        assert!(matches!(err, BackendError::NotImplemented { .. }));
    }

    #[tokio::test]
    async fn test_missing_asset_is_distinct() {
        let store = Arc::new(ScriptedStore::default());
        let err = repository(store)
            .fetch("github.com/acme/widgets", &ArtifactRequest::Zip("v9.9.9".into()))
            .await
            .unwrap_err();
        assert!(matches!(err, BackendError::NotFound { .. }));
        assert!(err.to_string().contains("Asset:v9.9.9.zip"));
    }

    #[tokio::test]
    async fn test_publish_order_flags_and_digests() {
        let store = Arc::new(ScriptedStore::default());
        let set = artifacts();
        repository(store.clone())
            .publish("github.com/acme/widgets", "v0.1.0", &set)
            .await
            .unwrap();

        let uploads = store.uploads.lock().unwrap();
        let summary: Vec<_> = uploads
            .iter()
            .map(|(name, _, _, unfinished)| (name.as_str(), *unfinished))
            .collect();
        assert_eq!(
            summary,
            [("v0.1.0.info", true), ("v0.1.0.mod", true), ("v0.1.0.zip", false)]
        );

        for ((_, content, sha256, _), expected) in uploads.iter().zip([&set.info, &set.mod_file, &set.zip]) {
            assert_eq!(content, expected);
            assert_eq!(sha256, &asset_sha256(expected));
        }
    }

    #[tokio::test]
    async fn test_publish_stops_at_first_failure() {
        let store = Arc::new(ScriptedStore {
            fail_upload_at: Some(2),
            ..Default::default()
        });

        let err = repository(store.clone())
            .publish("github.com/acme/widgets", "v0.1.0", &artifacts())
            .await
            .unwrap_err();

        assert!(matches!(err, BackendError::Failure { .. }));
        assert!(err.to_string().contains("Asset:v0.1.0.mod"));
        assert_eq!(store.uploads.lock().unwrap().len(), 2);
    }
}
