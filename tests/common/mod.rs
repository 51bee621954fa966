//! Shared fixtures for integration tests.
#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request, Response};
use bytes::Bytes;
use tower::ServiceExt;

use modgate::config::{CodeArtifactConfig, ProxyConfig};
use modgate::http::HttpServer;
use modgate::protocol::ArtifactRequest;
use modgate::publish::{TreeFile, Vcs, VcsError};
use modgate::repository::naming::asset_sha256;
use modgate::repository::{
    ArtifactRepository, AssetKey, BackendError, PackageKey, PackageStore, PublishArtifactSet,
    RepositoryBackend, StoreError, VersionPage,
};
use modgate::routing::{PatternRouter, RouteEntry};

// ============================================================================
// In-memory package store
// ============================================================================

#[derive(Debug, Default)]
struct StoredVersion {
    assets: BTreeMap<String, Bytes>,
    finished: bool,
}

/// A generic package store kept in memory.
///
/// Versions stay unlisted and unreadable until a finishing upload arrives,
/// like the real service.
#[derive(Debug)]
pub struct MemoryStore {
    versions: Mutex<HashMap<(String, String), StoredVersion>>,
    page_size: usize,
    publish_calls: AtomicUsize,
    fail_publish_from: Option<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            versions: Mutex::new(HashMap::new()),
            page_size: 2,
            publish_calls: AtomicUsize::new(0),
            fail_publish_from: None,
        }
    }

    /// Fail every upload from the `n`th (1-based) onwards.
    pub fn failing_publish_from(n: usize) -> Self {
        Self {
            fail_publish_from: Some(n),
            ..Self::new()
        }
    }

    pub fn publish_calls(&self) -> usize {
        self.publish_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PackageStore for MemoryStore {
    async fn list_published_versions(
        &self,
        package: &PackageKey,
        next_token: Option<String>,
    ) -> Result<VersionPage, StoreError> {
        let versions = self.versions.lock().unwrap();
        let key = package.to_string();
        let mut listed: Vec<String> = versions
            .iter()
            .filter(|((pkg, _), stored)| *pkg == key && stored.finished)
            .map(|((_, version), _)| version.clone())
            .collect();
        if listed.is_empty() {
            return Err(StoreError::NotFound(key));
        }
        listed.sort();

        let start: usize = next_token.as_deref().map_or(0, |t| t.parse().unwrap());
        let end = (start + self.page_size).min(listed.len());
        Ok(VersionPage {
            versions: listed[start..end].to_vec(),
            next_token: (end < listed.len()).then(|| end.to_string()),
        })
    }

    async fn get_asset(&self, asset: &AssetKey) -> Result<Bytes, StoreError> {
        let versions = self.versions.lock().unwrap();
        versions
            .get(&(asset.package.to_string(), asset.version.clone()))
            .filter(|stored| stored.finished)
            .and_then(|stored| stored.assets.get(&asset.asset_name()).cloned())
            .ok_or_else(|| StoreError::NotFound(asset.to_string()))
    }

    async fn publish_asset(
        &self,
        asset: &AssetKey,
        content: Bytes,
        sha256: &str,
        unfinished: bool,
    ) -> Result<(), StoreError> {
        let call = self.publish_calls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_publish_from.is_some_and(|n| call >= n) {
            return Err(StoreError::Service("injected failure".into()));
        }
        if asset_sha256(&content) != sha256 {
            return Err(StoreError::Service("digest mismatch".into()));
        }

        let mut versions = self.versions.lock().unwrap();
        let stored = versions
            .entry((asset.package.to_string(), asset.version.clone()))
            .or_default();
        stored.assets.insert(asset.asset_name(), content);
        if !unfinished {
            stored.finished = true;
        }
        Ok(())
    }
}

/// Repository settings used throughout the tests.
pub fn repo_config() -> CodeArtifactConfig {
    CodeArtifactConfig {
        domain: "acme".into(),
        domain_owner: Some("111111111111".into()),
        repository: "go-private".into(),
        namespace: None,
        region: None,
    }
}

/// An `ArtifactRepository` backed by `store`.
pub fn memory_repository(store: Arc<MemoryStore>) -> Arc<ArtifactRepository> {
    Arc::new(ArtifactRepository::new(&repo_config()).with_store(store))
}

// ============================================================================
// Scripted backend
// ============================================================================

/// What a `ScriptedBackend` answers to every fetch.
#[derive(Debug, Clone)]
pub enum Reply {
    Body(&'static str),
    NotFound,
    Fail,
    /// Never answers within any test timeout.
    Stall,
}

/// Backend that records calls and answers from a script.
#[derive(Debug)]
pub struct ScriptedBackend {
    reply: Reply,
    fetches: Mutex<Vec<(String, ArtifactRequest)>>,
}

impl ScriptedBackend {
    pub fn new(reply: Reply) -> Arc<Self> {
        Arc::new(Self {
            reply,
            fetches: Mutex::new(Vec::new()),
        })
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.lock().unwrap().len()
    }

    pub fn fetches(&self) -> Vec<(String, ArtifactRequest)> {
        self.fetches.lock().unwrap().clone()
    }
}

#[async_trait]
impl RepositoryBackend for ScriptedBackend {
    async fn fetch(&self, module: &str, request: &ArtifactRequest) -> Result<Bytes, BackendError> {
        self.fetches
            .lock()
            .unwrap()
            .push((module.to_string(), request.clone()));
        match self.reply {
            Reply::Body(body) => Ok(Bytes::from_static(body.as_bytes())),
            Reply::NotFound => Err(BackendError::NotFound {
                target: module.to_string(),
                source: StoreError::NotFound("scripted".into()),
            }),
            Reply::Fail => Err(BackendError::Failure {
                action: "getting asset",
                target: module.to_string(),
                source: StoreError::Service("scripted".into()),
            }),
            Reply::Stall => {
                tokio::time::sleep(std::time::Duration::from_secs(300)).await;
                Ok(Bytes::new())
            }
        }
    }

    async fn publish(
        &self,
        _module: &str,
        _version: &str,
        _artifacts: &PublishArtifactSet,
    ) -> Result<(), BackendError> {
        Ok(())
    }
}

// ============================================================================
// Fake version control
// ============================================================================

/// A checkout with fixed tags and a fixed tree.
#[derive(Debug, Clone)]
pub struct FakeVcs {
    pub root: PathBuf,
    pub tags: HashMap<String, i64>,
    pub tree: Vec<TreeFile>,
}

impl FakeVcs {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            tags: HashMap::new(),
            tree: Vec::new(),
        }
    }

    pub fn tag(mut self, name: &str, commit_secs: i64) -> Self {
        self.tags.insert(name.to_string(), commit_secs);
        self
    }

    pub fn file(mut self, path: &str, contents: &str) -> Self {
        self.tree.push(TreeFile::new(path, contents));
        self
    }

    fn check_tag(&self, revision: &str) -> Result<i64, VcsError> {
        self.tags
            .get(revision)
            .copied()
            .ok_or_else(|| VcsError::RevisionNotFound {
                revision: revision.to_string(),
                message: "unknown revision".into(),
            })
    }
}

#[async_trait]
impl Vcs for FakeVcs {
    async fn root_path(&self, dir: &Path) -> Result<PathBuf, VcsError> {
        if dir.starts_with(&self.root) {
            Ok(self.root.clone())
        } else {
            Err(VcsError::Unavailable {
                dir: dir.to_path_buf(),
                message: "not a git repository".into(),
            })
        }
    }

    async fn commit_timestamp(&self, _root: &Path, revision: &str) -> Result<i64, VcsError> {
        self.check_tag(revision)
    }

    async fn export_tree(&self, _root: &Path, revision: &str) -> Result<Vec<TreeFile>, VcsError> {
        self.check_tag(revision)?;
        Ok(self.tree.clone())
    }
}

// ============================================================================
// HTTP helpers
// ============================================================================

/// Compile `(pattern, backend)` pairs in order.
pub fn router(routes: Vec<(&str, Arc<dyn RepositoryBackend>)>) -> Arc<PatternRouter> {
    let entries = routes
        .into_iter()
        .map(|(pattern, backend)| RouteEntry::new(pattern, backend).unwrap())
        .collect();
    Arc::new(PatternRouter::new(entries))
}

/// The proxy's axum app over `routes`.
pub fn app(routes: Vec<(&str, Arc<dyn RepositoryBackend>)>, fallthrough_on_missing: bool) -> axum::Router {
    let config = ProxyConfig {
        fallthrough_on_missing,
        ..ProxyConfig::default()
    };
    HttpServer::new(config, router(routes)).router()
}

/// Send one request through `app` in-process.
pub async fn send(app: &axum::Router, method: Method, path: &str) -> Response<Body> {
    let request = Request::builder()
        .method(method)
        .uri(path)
        .body(Body::empty())
        .unwrap();
    app.clone().oneshot(request).await.unwrap()
}

/// GET `path` and return `(status, body)`.
pub async fn get(app: &axum::Router, path: &str) -> (u16, Bytes) {
    let response = send(app, Method::GET, path).await;
    let status = response.status().as_u16();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, body)
}
