//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! .modgate.toml (nearest ancestor, --config, or MODGATE_CONFIG)
//!     → loader.rs (locate, parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → ProxyConfig (validated, immutable)
//!     → routing::PatternRouter::from_config
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded
//! - All sections have defaults to allow minimal configs
//! - `[[repos]]` is an ordered array: the first matching pattern wins
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::ProxyConfig;
pub use schema::ListenerConfig;
pub use schema::RepoConfig;
pub use schema::{BackendConfig, CodeArtifactConfig};
