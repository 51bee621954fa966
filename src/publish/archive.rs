//! Module zip construction.
//!
//! # Responsibilities
//! - Select the files of one module from an exported tree
//! - Write them under `{module}@{version}/` in a zip
//!
//! # Design Decisions
//! - Entries are sorted and stamped with a fixed time, so the same tree
//!   always yields the same bytes
//! - Nested modules (directories with their own `go.mod`) belong to
//!   another module and are left out, as are vendored packages. Files
//!   directly in `vendor/` such as `modules.txt` stay, as they do in zips
//!   the go command builds
//! - A root `LICENSE` is carried into submodules that have none

use std::collections::BTreeMap;
use std::io::{Cursor, Write};

use bytes::Bytes;
use thiserror::Error;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, DateTime, ZipWriter};

use crate::protocol::{check_module_version, VersionError};
use crate::publish::descriptor::DESCRIPTOR_FILE;
use crate::publish::vcs::TreeFile;

/// Upper bound on the summed uncompressed size of a module zip.
pub const MAX_UNCOMPRESSED_SIZE: u64 = 500 << 20;

const LICENSE_FILE: &str = "LICENSE";

/// Errors building a module zip.
#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("module zip would be {size} bytes uncompressed, limit is {limit}")]
    TooLarge { size: u64, limit: u64 },

    #[error(transparent)]
    InvalidVersion(#[from] VersionError),

    #[error("no files found under '{subdir}'")]
    Empty { subdir: String },

    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("zip write error: {0}")]
    Io(#[from] std::io::Error),
}

/// Build the zip for `module@version` from the files under `subdir`.
///
/// `subdir` is `/`-separated and relative to the tree root; empty means
/// the whole tree.
pub fn build_module_zip(
    module: &str,
    version: &str,
    subdir: &str,
    tree: &[TreeFile],
) -> Result<Bytes, ArchiveError> {
    build_with_limit(module, version, subdir, tree, MAX_UNCOMPRESSED_SIZE)
}

fn build_with_limit(
    module: &str,
    version: &str,
    subdir: &str,
    tree: &[TreeFile],
    limit: u64,
) -> Result<Bytes, ArchiveError> {
    check_module_version(module, version)?;

    let entries = select_files(subdir, tree);
    if entries.is_empty() {
        return Err(ArchiveError::Empty {
            subdir: subdir.to_string(),
        });
    }

    let size: u64 = entries.values().map(|c| c.len() as u64).sum();
    if size > limit {
        return Err(ArchiveError::TooLarge { size, limit });
    }

    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .last_modified_time(DateTime::default())
        .unix_permissions(0o644);

    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    for (path, contents) in &entries {
        writer.start_file(format!("{module}@{version}/{path}"), options)?;
        writer.write_all(contents)?;
    }
    let zip = writer.finish()?.into_inner();

    tracing::debug!(
        module = %module,
        version = %version,
        files = entries.len(),
        uncompressed = size,
        compressed = zip.len(),
        "Built module zip"
    );
    Ok(Bytes::from(zip))
}

/// Files of the module rooted at `subdir`, keyed (and so sorted) by their
/// path relative to it.
fn select_files<'a>(subdir: &str, tree: &'a [TreeFile]) -> BTreeMap<String, &'a [u8]> {
    let prefix = if subdir.is_empty() {
        String::new()
    } else {
        format!("{}/", subdir.trim_matches('/'))
    };

    let in_module: Vec<(&str, &[u8])> = tree
        .iter()
        .filter_map(|f| Some((f.path.strip_prefix(prefix.as_str())?, f.contents.as_slice())))
        .collect();

    let nested: Vec<&str> = in_module
        .iter()
        .filter_map(|(path, _)| path.strip_suffix(DESCRIPTOR_FILE))
        .filter(|dir| !dir.is_empty() && dir.ends_with('/'))
        .collect();

    let mut selected: BTreeMap<String, &[u8]> = in_module
        .into_iter()
        .filter(|(path, _)| !nested.iter().any(|dir| path.starts_with(dir)))
        .filter(|(path, _)| !is_vendored(path))
        .map(|(path, contents)| (path.to_string(), contents))
        .collect();

    if !prefix.is_empty() && !selected.is_empty() && !selected.contains_key(LICENSE_FILE) {
        if let Some(license) = tree.iter().find(|f| f.path == LICENSE_FILE) {
            selected.insert(LICENSE_FILE.to_string(), license.contents.as_slice());
        }
    }

    selected
}

/// Whether `path` lies in a vendored package directory, by the go
/// command's rule. For a nested `/vendor/` the offset is counted from the
/// start of the path, not from the match, and that is kept so zips hash
/// the same as the ones go builds.
fn is_vendored(path: &str) -> bool {
    const NESTED: &str = "/vendor/";

    let rest = if let Some(rest) = path.strip_prefix("vendor/") {
        rest
    } else if path.contains(NESTED) {
        path.get(NESTED.len()..).unwrap_or_default()
    } else {
        return false;
    };
    rest.contains('/')
}
