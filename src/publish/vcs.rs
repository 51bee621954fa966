//! Version-control collaborator.
//!
//! # Responsibilities
//! - Find the root of the checkout containing a directory
//! - Read the commit timestamp of a tag or ref
//! - Export the tracked tree at a ref
//!
//! # Design Decisions
//! - The tree is exported from history (`git archive`), never read from
//!   the working copy, so uncommitted edits cannot leak into a release
//! - Paths in an exported tree are `/`-separated and relative to the root

use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};
use std::process::Output;

use async_trait::async_trait;
use thiserror::Error;
use tokio::process::Command;

/// Errors from the version-control tool.
#[derive(Debug, Error)]
pub enum VcsError {
    #[error("{} is not under version control: {message}", .dir.display())]
    Unavailable { dir: PathBuf, message: String },

    #[error("revision {revision} not found: {message}")]
    RevisionNotFound { revision: String, message: String },

    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("unexpected output from `git {command}`: {output}")]
    UnexpectedOutput { command: &'static str, output: String },

    #[error("failed to read exported tree: {0}")]
    Export(#[source] std::io::Error),
}

/// One tracked file at a given revision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeFile {
    /// Path relative to the checkout root, `/`-separated.
    pub path: String,
    pub contents: Vec<u8>,
}

impl TreeFile {
    pub fn new(path: impl Into<String>, contents: impl Into<Vec<u8>>) -> Self {
        Self {
            path: path.into(),
            contents: contents.into(),
        }
    }
}

/// Version-control operations needed to cut a release.
#[async_trait]
pub trait Vcs: Send + Sync {
    /// Root directory of the checkout containing `dir`.
    async fn root_path(&self, dir: &Path) -> Result<PathBuf, VcsError>;

    /// Commit time of `revision`, in seconds since the Unix epoch.
    async fn commit_timestamp(&self, root: &Path, revision: &str) -> Result<i64, VcsError>;

    /// Every tracked file at `revision`, relative to `root`.
    async fn export_tree(&self, root: &Path, revision: &str) -> Result<Vec<TreeFile>, VcsError>;
}

/// `git` on the PATH (or an explicit binary).
#[derive(Debug, Clone)]
pub struct GitCli {
    program: PathBuf,
}

impl GitCli {
    pub fn new() -> Self {
        Self::with_program("git")
    }

    /// Use a specific git binary.
    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    async fn run(&self, dir: &Path, args: &[&str]) -> Result<Output, VcsError> {
        tracing::debug!(dir = %dir.display(), args = ?args, "Running git");
        Command::new(&self.program)
            .args(args)
            .current_dir(dir)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| VcsError::Spawn {
                program: self.program.display().to_string(),
                source,
            })
    }
}

impl Default for GitCli {
    fn default() -> Self {
        Self::new()
    }
}

fn stderr_of(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).trim().to_string()
}

#[async_trait]
impl Vcs for GitCli {
    async fn root_path(&self, dir: &Path) -> Result<PathBuf, VcsError> {
        let output = self.run(dir, &["rev-parse", "--show-toplevel"]).await?;
        if !output.status.success() {
            return Err(VcsError::Unavailable {
                dir: dir.to_path_buf(),
                message: stderr_of(&output),
            });
        }

        let root = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if root.is_empty() {
            return Err(VcsError::UnexpectedOutput {
                command: "rev-parse",
                output: root,
            });
        }
        Ok(PathBuf::from(root))
    }

    async fn commit_timestamp(&self, root: &Path, revision: &str) -> Result<i64, VcsError> {
        // Peel annotated tags so only the commit line is printed.
        let commit = format!("{revision}^{{commit}}");
        let output = self
            .run(root, &["show", "--no-patch", "--format=%ct", &commit, "--"])
            .await?;
        if !output.status.success() {
            return Err(VcsError::RevisionNotFound {
                revision: revision.to_string(),
                message: stderr_of(&output),
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let line = stdout.lines().map(str::trim).rfind(|l| !l.is_empty()).unwrap_or("");
        line.parse().map_err(|_| VcsError::UnexpectedOutput {
            command: "show",
            output: stdout.trim().to_string(),
        })
    }

    async fn export_tree(&self, root: &Path, revision: &str) -> Result<Vec<TreeFile>, VcsError> {
        let output = self
            .run(root, &["archive", "--format=tar", revision])
            .await?;
        if !output.status.success() {
            return Err(VcsError::RevisionNotFound {
                revision: revision.to_string(),
                message: stderr_of(&output),
            });
        }

        let files = read_tar(&output.stdout).map_err(VcsError::Export)?;
        tracing::debug!(revision = %revision, files = files.len(), "Exported tree");
        Ok(files)
    }
}

/// Regular files from a tar stream. Directories, links and pax headers
/// are skipped.
pub fn read_tar(data: &[u8]) -> std::io::Result<Vec<TreeFile>> {
    let mut archive = tar::Archive::new(Cursor::new(data));
    let mut files = Vec::new();

    for entry in archive.entries()? {
        let mut entry = entry?;
        if !entry.header().entry_type().is_file() {
            continue;
        }

        let path = entry
            .path()?
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join("/");

        let mut contents = Vec::with_capacity(entry.size() as usize);
        entry.read_to_end(&mut contents)?;
        files.push(TreeFile { path, contents });
    }

    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tar_of(entries: &[(&str, &[u8])]) -> Vec<u8> {
        let mut builder = tar::Builder::new(Vec::new());
        for (path, contents) in entries {
            let mut header = tar::Header::new_gnu();
            header.set_size(contents.len() as u64);
            header.set_mode(0o644);
            header.set_cksum();
            builder.append_data(&mut header, path, *contents).unwrap();
        }
        builder.into_inner().unwrap()
    }

    #[test]
    fn test_read_tar_regular_files() {
        let data = tar_of(&[("go.mod", b"module example.com/m\n"), ("pkg/a.go", b"package pkg\n")]);
        let files = read_tar(&data).unwrap();
        assert_eq!(
            files,
            vec![
                TreeFile::new("go.mod", "module example.com/m\n"),
                TreeFile::new("pkg/a.go", "package pkg\n"),
            ]
        );
    }

    #[test]
    fn test_read_tar_skips_directories() {
        let mut builder = tar::Builder::new(Vec::new());
        let mut dir = tar::Header::new_gnu();
        dir.set_entry_type(tar::EntryType::Directory);
        dir.set_size(0);
        dir.set_mode(0o755);
        dir.set_cksum();
        builder.append_data(&mut dir, "pkg/", std::io::empty()).unwrap();
        let data = builder.into_inner().unwrap();

        assert!(read_tar(&data).unwrap().is_empty());
    }

    /// Run git in `dir` isolated from user config, committing as of `date`.
    #[cfg(unix)]
    fn git(dir: &Path, date: &str, args: &[&str]) -> bool {
        std::process::Command::new("git")
            .args(["-c", "user.name=modgate", "-c", "user.email=modgate@example.com"])
            .args(["-c", "commit.gpgsign=false", "-c", "tag.gpgsign=false"])
            .args(args)
            .current_dir(dir)
            .env("GIT_CONFIG_GLOBAL", "/dev/null")
            .env("GIT_CONFIG_NOSYSTEM", "1")
            .env("GIT_AUTHOR_DATE", date)
            .env("GIT_COMMITTER_DATE", date)
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_git_checkout_with_annotated_tag() {
        let repo = tempfile::tempdir().unwrap();
        let dir = repo.path();
        if !git(dir, "1700000000 +0000", &["init", "-q"]) {
            // No usable git on this machine.
            return;
        }
        std::fs::create_dir_all(dir.join("pkg")).unwrap();
        std::fs::write(dir.join("go.mod"), "module example.com/m\n").unwrap();
        std::fs::write(dir.join("pkg/a.go"), "package pkg\n").unwrap();
        assert!(git(dir, "1700000000 +0000", &["add", "."]));
        assert!(git(dir, "1700000000 +0000", &["commit", "-q", "-m", "init"]));
        // The tag object is newer than the commit; only the commit time counts.
        assert!(git(dir, "1800000000 +0000", &["tag", "-a", "v1.0.0", "-m", "release"]));

        let cli = GitCli::new();
        let root = cli.root_path(&dir.join("pkg")).await.unwrap();
        assert_eq!(
            std::fs::canonicalize(&root).unwrap(),
            std::fs::canonicalize(dir).unwrap()
        );

        assert_eq!(cli.commit_timestamp(&root, "v1.0.0").await.unwrap(), 1_700_000_000);

        let mut files = cli.export_tree(&root, "v1.0.0").await.unwrap();
        files.sort_by(|a, b| a.path.cmp(&b.path));
        assert_eq!(
            files,
            vec![
                TreeFile::new("go.mod", "module example.com/m\n"),
                TreeFile::new("pkg/a.go", "package pkg\n"),
            ]
        );

        let err = cli.commit_timestamp(&root, "v9.9.9").await.unwrap_err();
        assert!(matches!(err, VcsError::RevisionNotFound { ref revision, .. } if revision == "v9.9.9"));
        let err = cli.export_tree(&root, "v9.9.9").await.unwrap_err();
        assert!(matches!(err, VcsError::RevisionNotFound { .. }));
    }

    #[tokio::test]
    async fn test_missing_binary_is_spawn_error() {
        let git = GitCli::with_program("/nonexistent/modgate-test-git");
        let dir = tempfile::tempdir().unwrap();
        let err = git.root_path(dir.path()).await.unwrap_err();
        assert!(matches!(err, VcsError::Spawn { .. }));
    }
}
