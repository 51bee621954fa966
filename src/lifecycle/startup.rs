//! Startup orchestration.
//!
//! # Responsibilities
//! - Locate the configuration file
//! - Load and validate it
//! - Compile the route table
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Shared by `serve`, `publish` and `go` so all three see the same routes

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config::loader::resolve_config_path;
use crate::config::{load_config, ConfigError, ProxyConfig};
use crate::routing::{PatternRouter, RouteError};

/// Error raised before any request is served.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Routes(#[from] RouteError),
}

/// Locate, load and compile the configuration.
///
/// Returns the config path actually used alongside the parsed config and
/// compiled router. Nothing is logged here: the subscriber is installed
/// only once the configured log level is known.
pub fn load_routes(
    explicit: Option<&Path>,
    work_dir: &Path,
) -> Result<(PathBuf, ProxyConfig, PatternRouter), StartupError> {
    let path = resolve_config_path(explicit, work_dir)?;
    let config = load_config(&path)?;
    let router = PatternRouter::from_config(&config)?;
    Ok((path, config, router))
}
