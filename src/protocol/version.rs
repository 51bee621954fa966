//! Module version rules.
//!
//! A publishable version is canonical semver with a `v` prefix
//! (`v1.2.3`, `v0.4.0-rc.1`, `v2.0.0+incompatible`). Its major version has
//! to agree with the module path: `example.com/m/v2` only takes `v2.x.y`,
//! `gopkg.in/yaml.v3` only takes `v3.x.y`, and a path without a suffix
//! takes `v0`/`v1`, or `v2+` marked `+incompatible`.

use thiserror::Error;

const INCOMPATIBLE: &str = "incompatible";

/// A version the go command would never request for a module.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VersionError {
    #[error("version {0:?} is not canonical semver (e.g. v1.2.3)")]
    NotCanonical(String),

    #[error("version {version} does not match the major version of module {module}")]
    MajorMismatch { module: String, version: String },
}

/// Check that `version` is canonical and fits `module`'s major version.
pub fn check_module_version(module: &str, version: &str) -> Result<(), VersionError> {
    let not_canonical = || VersionError::NotCanonical(version.to_string());

    let bare = version.strip_prefix('v').ok_or_else(not_canonical)?;
    let parsed = semver::Version::parse(bare).map_err(|_| not_canonical())?;
    let incompatible = match parsed.build.as_str() {
        "" => false,
        INCOMPATIBLE => true,
        _ => return Err(not_canonical()),
    };
    if parsed.to_string() != bare {
        return Err(not_canonical());
    }

    let fits = match path_major(module) {
        Some(major) => parsed.major == major && !incompatible,
        None if module.starts_with("gopkg.in/") => false,
        None if incompatible => parsed.major >= 2,
        None => parsed.major <= 1,
    };
    if fits {
        Ok(())
    } else {
        Err(VersionError::MajorMismatch {
            module: module.to_string(),
            version: version.to_string(),
        })
    }
}

/// Major version named by the path suffix (`/vN` with N >= 2, or the
/// `.vN` of a gopkg.in path).
fn path_major(module: &str) -> Option<u64> {
    let last = module.rsplit('/').next().unwrap_or(module);

    let digits = if module.starts_with("gopkg.in/") {
        last.rsplit_once(".v")?.1
    } else {
        let digits = last.strip_prefix('v')?;
        if module.len() == last.len() {
            return None;
        }
        digits
    };

    let leading_zero = digits.len() > 1 && digits.starts_with('0');
    if digits.is_empty() || leading_zero || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let major: u64 = digits.parse().ok()?;
    if module.starts_with("gopkg.in/") || major >= 2 {
        Some(major)
    } else {
        None
    }
}
