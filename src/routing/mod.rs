//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Module path (unescaped)
//!     → router.rs (ordered route scan)
//!     → matcher.rs (anchored glob match)
//!     → Return: matched RouteEntry or NoMatch
//!
//! Route Compilation (at startup):
//!     RepoConfig[]
//!     → Compile globs to anchored regexes
//!     → Attach one repository backend per entry
//!     → Freeze as immutable PatternRouter
//! ```
//!
//! # Design Decisions
//! - Routes compiled at startup, immutable at runtime
//! - Bad patterns fail at load time, never at lookup
//! - Deterministic: same input always matches same route
//! - First match wins (configuration order)

pub mod matcher;
pub mod router;

pub use router::{PatternRouter, RouteEntry, RouteError};
