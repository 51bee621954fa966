//! Parsing of module-fetch request paths.
//!
//! A request path looks like `/<escaped-module-path>@<suffix>`. The suffix
//! selects one of five operations:
//!
//! | suffix                  | operation       |
//! |-------------------------|-----------------|
//! | `@v/list`               | version list    |
//! | `@latest`               | latest version  |
//! | `@v/<version>.info`     | version info    |
//! | `@v/<version>.mod`      | module file     |
//! | `@v/<version>.zip`      | module archive  |

use std::fmt;

use percent_encoding::percent_decode_str;
use thiserror::Error;

use crate::protocol::escape::{unescape_path, EscapeError};

/// One of the three per-version assets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetKind {
    Info,
    Mod,
    Zip,
}

impl AssetKind {
    /// All kinds, in publish order.
    pub const ALL: [AssetKind; 3] = [AssetKind::Info, AssetKind::Mod, AssetKind::Zip];

    /// File extension including the leading dot.
    pub fn extension(self) -> &'static str {
        match self {
            AssetKind::Info => ".info",
            AssetKind::Mod => ".mod",
            AssetKind::Zip => ".zip",
        }
    }

    /// Response content type for this asset.
    pub fn content_type(self) -> &'static str {
        match self {
            AssetKind::Info => "application/json",
            AssetKind::Mod => "text/plain; charset=utf-8",
            AssetKind::Zip => "application/zip",
        }
    }

    fn from_extension(ext: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.extension() == ext)
    }

    /// Asset file name for a version, e.g. `v1.2.3.mod`.
    pub fn file_name(self, version: &str) -> String {
        format!("{version}{}", self.extension())
    }
}

/// Parsed artifact request suffix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtifactRequest {
    VersionList,
    Latest,
    Info(String),
    Mod(String),
    Zip(String),
}

impl ArtifactRequest {
    fn asset(kind: AssetKind, version: String) -> Self {
        match kind {
            AssetKind::Info => ArtifactRequest::Info(version),
            AssetKind::Mod => ArtifactRequest::Mod(version),
            AssetKind::Zip => ArtifactRequest::Zip(version),
        }
    }

    /// Parse a suffix starting at `@`.
    pub fn parse(suffix: &str) -> Result<Self, SuffixError> {
        match suffix {
            "@latest" => return Ok(ArtifactRequest::Latest),
            "@v/list" => return Ok(ArtifactRequest::VersionList),
            _ => {}
        }

        let asset = suffix
            .strip_prefix("@v/")
            .ok_or_else(|| SuffixError::Malformed(suffix.to_string()))?;

        // Versions never contain '/', so the extension is whatever follows
        // the final '.' of the last path element.
        if asset.is_empty() || asset.contains('/') {
            return Err(SuffixError::Malformed(suffix.to_string()));
        }
        let Some(dot) = asset.rfind('.') else {
            return Err(SuffixError::UnsupportedAsset(suffix.to_string()));
        };
        let (version, ext) = asset.split_at(dot);
        let kind = AssetKind::from_extension(ext)
            .ok_or_else(|| SuffixError::UnsupportedAsset(suffix.to_string()))?;
        if version.is_empty() {
            return Err(SuffixError::Malformed(suffix.to_string()));
        }

        Ok(Self::asset(kind, version.to_string()))
    }

    /// The requested version and asset kind, for per-version requests.
    pub fn version_asset(&self) -> Option<(&str, AssetKind)> {
        match self {
            ArtifactRequest::Info(v) => Some((v, AssetKind::Info)),
            ArtifactRequest::Mod(v) => Some((v, AssetKind::Mod)),
            ArtifactRequest::Zip(v) => Some((v, AssetKind::Zip)),
            ArtifactRequest::VersionList | ArtifactRequest::Latest => None,
        }
    }

    /// Response content type for a successful answer.
    pub fn content_type(&self) -> &'static str {
        match self.version_asset() {
            Some((_, kind)) => kind.content_type(),
            None if *self == ArtifactRequest::Latest => "application/json",
            None => "text/plain; charset=utf-8",
        }
    }
}

impl fmt::Display for ArtifactRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArtifactRequest::VersionList => f.write_str("@v/list"),
            ArtifactRequest::Latest => f.write_str("@latest"),
            ArtifactRequest::Info(v) => write!(f, "@v/{}", AssetKind::Info.file_name(v)),
            ArtifactRequest::Mod(v) => write!(f, "@v/{}", AssetKind::Mod.file_name(v)),
            ArtifactRequest::Zip(v) => write!(f, "@v/{}", AssetKind::Zip.file_name(v)),
        }
    }
}

/// Suffix that does not name a supported operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SuffixError {
    /// Not one of the protocol's suffix shapes.
    #[error("malformed request suffix: {0}")]
    Malformed(String),

    /// `@v/<file>` with an extension other than `.info`, `.mod`, `.zip`.
    #[error("asset extension not supported: {0}")]
    UnsupportedAsset(String),
}

/// Failure to split a request path into module and suffix.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    #[error("error parsing request path {0:?}: '@' expected")]
    MissingVersionMarker(String),

    #[error("request path {0:?} is not valid percent-encoded UTF-8")]
    InvalidEncoding(String),

    #[error("error unescaping module path: {0}")]
    InvalidModulePath(#[from] EscapeError),
}

/// A request path split into its module and raw suffix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleRequest {
    /// Unescaped module path.
    pub module: String,
    /// Everything from the first `@`, inclusive.
    pub suffix: String,
}

impl ModuleRequest {
    /// Percent-decode a raw request path, split it at its first `@` and
    /// unescape the module part.
    ///
    /// The go command sends `!` as `%21`, so case escapes only become
    /// visible after decoding.
    pub fn parse(raw_path: &str) -> Result<Self, RequestError> {
        let decoded = percent_decode_str(raw_path)
            .decode_utf8()
            .map_err(|_| RequestError::InvalidEncoding(raw_path.to_string()))?;
        let path: &str = &decoded;

        let at = path
            .find('@')
            .ok_or_else(|| RequestError::MissingVersionMarker(path.to_string()))?;
        let (escaped, suffix) = path.split_at(at);
        let module = unescape_path(escaped.trim_matches('/'))?;

        Ok(Self {
            module,
            suffix: suffix.to_string(),
        })
    }
}
