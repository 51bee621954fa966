//! Route lookup and dispatch.
//!
//! # Responsibilities
//! - Store compiled routes
//! - Look up the repository owning a module path
//! - Return matched route or explicit no-match
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - O(n) scan in configuration order; first match wins
//! - Explicit no-match rather than silent default

use std::sync::Arc;

use thiserror::Error;

use crate::config::{BackendConfig, ProxyConfig};
use crate::repository::{ArtifactRepository, RepositoryBackend};
use crate::routing::matcher::{GlobMatcher, Matcher};

/// A pattern that failed to compile.
#[derive(Debug, Error)]
#[error("malformed module glob '{pattern}': {source}")]
pub struct RouteError {
    pub pattern: String,
    #[source]
    pub source: regex::Error,
}

/// A module pattern bound to the repository that owns it.
#[derive(Debug, Clone)]
pub struct RouteEntry {
    matcher: GlobMatcher,
    backend: Arc<dyn RepositoryBackend>,
}

impl RouteEntry {
    /// Compile `pattern` for `backend`.
    pub fn new(pattern: &str, backend: Arc<dyn RepositoryBackend>) -> Result<Self, RouteError> {
        let matcher = GlobMatcher::new(pattern).map_err(|source| RouteError {
            pattern: pattern.to_string(),
            source,
        })?;
        Ok(Self { matcher, backend })
    }

    /// The configured pattern.
    pub fn pattern(&self) -> &str {
        self.matcher.glob()
    }

    /// The owning repository.
    pub fn backend(&self) -> &Arc<dyn RepositoryBackend> {
        &self.backend
    }
}

/// Ordered module pattern table.
#[derive(Debug, Default)]
pub struct PatternRouter {
    routes: Vec<RouteEntry>,
}

impl PatternRouter {
    /// Create a router from compiled entries, kept in the given order.
    pub fn new(routes: Vec<RouteEntry>) -> Self {
        Self { routes }
    }

    /// Build one `ArtifactRepository` per configured repo.
    pub fn from_config(config: &ProxyConfig) -> Result<Self, RouteError> {
        let routes = config
            .repos
            .iter()
            .map(|repo| {
                let backend: Arc<dyn RepositoryBackend> = match &repo.backend {
                    BackendConfig::CodeArtifact(ca) => Arc::new(ArtifactRepository::new(ca)),
                };
                RouteEntry::new(&repo.pattern, backend)
            })
            .collect::<Result<Vec<_>, _>>()?;

        tracing::debug!(routes = routes.len(), "Route table compiled");
        Ok(Self::new(routes))
    }

    /// Find the first route whose pattern matches the whole module path.
    pub fn resolve(&self, module: &str) -> Option<&RouteEntry> {
        self.routes.iter().find(|route| route.matcher.matches(module))
    }

    /// Configured patterns, in order.
    pub fn patterns(&self) -> impl Iterator<Item = &str> {
        self.routes.iter().map(RouteEntry::pattern)
    }

    /// Number of routes.
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// True if no routes are configured.
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}
