//! Publishing subsystem.
//!
//! # Data Flow
//! ```text
//! working directory
//!     → descriptor.rs (go.mod → module path)
//!     → vcs.rs (checkout root, commit time, exported tree)
//!     → archive.rs (tree → module zip)
//!     → pipeline.rs (info + mod + zip → owning repository)
//! ```
//!
//! # Design Decisions
//! - Strictly sequential; the first failure ends the publish
//! - The version-control tool sits behind a trait so tests can run
//!   without a checkout

pub mod archive;
pub mod descriptor;
pub mod pipeline;
pub mod vcs;

pub use archive::{build_module_zip, ArchiveError};
pub use pipeline::{PublishError, PublishPipeline, PublishReport};
pub use vcs::{GitCli, TreeFile, Vcs, VcsError};
