//! Module-fetch protocol subsystem.
//!
//! # Data Flow
//! ```text
//! GET /<escaped-module-path>@<suffix>
//!     → request.rs (split at first '@', classify suffix)
//!     → escape.rs (decode '!x' → 'X' in the module path)
//!     → ModuleRequest { module, suffix } + ArtifactRequest
//!
//! Publishing:
//!     (module, version) → version.rs (canonical semver, major suffix)
//!     (version, commit time) → info.rs → VersionInfo JSON
//! ```
//!
//! # Design Decisions
//! - Suffix parsing distinguishes "malformed" (400) from "unsupported asset"
//!   (denied once a route claims the module) so the handler can decide
//!   before any backend call
//! - Pure functions only; no I/O in this module

pub mod escape;
pub mod info;
pub mod request;
pub mod version;

pub use escape::{escape_path, unescape_path, EscapeError};
pub use info::VersionInfo;
pub use request::{ArtifactRequest, AssetKind, ModuleRequest, RequestError, SuffixError};
pub use version::{check_module_version, VersionError};
