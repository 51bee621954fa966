//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the proxy.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for modgate.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ProxyConfig {
    /// Answer 404 instead of 403 when a claimed module's asset is missing,
    /// letting the Go toolchain fall through to the next proxy.
    pub fallthrough_on_missing: bool,

    /// Listener configuration for `serve`.
    pub listener: ListenerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Module pattern to repository mappings, matched in order.
    pub repos: Vec<RepoConfig>,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "127.0.0.1:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:8080".to_string(),
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        // Module zips can be large; leave room for slow repositories.
        Self { request_secs: 300 }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}

/// One module pattern and the repository that owns it.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RepoConfig {
    /// Glob over module paths; `*` matches any substring.
    pub pattern: String,

    /// Backend descriptor, tagged by `type`.
    #[serde(flatten)]
    pub backend: BackendConfig,
}

/// Tagged backend descriptor.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "type")]
pub enum BackendConfig {
    /// Generic packages stored in AWS CodeArtifact.
    #[serde(rename = "codeartifact", alias = "CodeArtifact", alias = "code_artifact")]
    CodeArtifact(CodeArtifactConfig),
}

/// Addressing for a CodeArtifact repository.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct CodeArtifactConfig {
    /// CodeArtifact domain name.
    pub domain: String,

    /// AWS account that owns the domain (defaults to the caller's account).
    #[serde(default)]
    pub domain_owner: Option<String>,

    /// Repository within the domain.
    pub repository: String,

    /// Generic package namespace.
    #[serde(default)]
    pub namespace: Option<String>,

    /// AWS region override; the default provider chain is used otherwise.
    #[serde(default)]
    pub region: Option<String>,
}
