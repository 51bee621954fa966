//! The `.info` payload served for each version.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Version metadata: `{"Version": ..., "Time": ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct VersionInfo {
    pub version: String,
    pub time: DateTime<Utc>,
}

impl VersionInfo {
    /// Build from a version and the Unix timestamp of its commit.
    ///
    /// Returns `None` when the timestamp is out of range.
    pub fn from_commit(version: impl Into<String>, commit_secs: i64) -> Option<Self> {
        Some(Self {
            version: version.into(),
            time: DateTime::from_timestamp(commit_secs, 0)?,
        })
    }

    /// Serialize as 4-space-indented JSON.
    ///
    /// Output depends only on the fields, so re-publishing a ref reproduces
    /// the same bytes.
    pub fn to_json(&self) -> Result<Vec<u8>, serde_json::Error> {
        let mut out = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
        self.serialize(&mut serializer)?;
        Ok(out)
    }
}
