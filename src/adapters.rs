//! Narrow capability traits the pipeline stages depend on, plus the
//! implementations backed by the operating system. Tests swap these for
//! fakes through [`Adapters`].
use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use globset::Glob;
use tokio::io::AsyncRead;
use walkdir::WalkDir;

/// What a path points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Directory,
    File,
    Other,
}

/// A report stream. Opened once per accessor and read to the end.
pub type ReportStream = Pin<Box<dyn AsyncRead + Send>>;

#[async_trait]
pub trait FileSystem: Send + Sync {
    async fn stat(&self, path: &Path) -> io::Result<EntryKind>;

    /// Recursive; an already existing directory is not an error.
    async fn create_dir_all(&self, path: &Path) -> io::Result<()>;

    /// Paths under `dir` whose relative path matches `pattern`.
    async fn glob_search(&self, dir: &Path, pattern: &str) -> io::Result<Vec<PathBuf>>;

    async fn open_read_stream(&self, path: &Path) -> io::Result<ReportStream>;
}

/// Outcome of a process that could be spawned.
#[derive(Debug, Clone, Default)]
pub struct ProcessOutput {
    pub success: bool,
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

#[async_trait]
pub trait ProcessRunner: Send + Sync {
    /// `Err` means the command could not be spawned at all.
    async fn execute(&self, command: &str, args: &[OsString]) -> io::Result<ProcessOutput>;
}

/// Receives free-text status lines. Never influences control flow.
pub trait ProgressReporter: Send + Sync {
    fn report(&self, message: &str);
}

/// The capability bundle injected into every stage.
#[derive(Clone)]
pub struct Adapters {
    pub fs: Arc<dyn FileSystem>,
    pub process: Arc<dyn ProcessRunner>,
    pub progress: Arc<dyn ProgressReporter>,
}

impl Adapters {
    /// Real filesystem and processes, progress forwarded to `tracing`.
    #[must_use]
    pub fn os() -> Self {
        Self {
            fs: Arc::new(OsFileSystem),
            process: Arc::new(OsProcessRunner),
            progress: Arc::new(TracingProgress),
        }
    }
}

pub struct OsFileSystem;

#[async_trait]
impl FileSystem for OsFileSystem {
    async fn stat(&self, path: &Path) -> io::Result<EntryKind> {
        let meta = tokio::fs::metadata(path).await?;
        Ok(if meta.is_dir() {
            EntryKind::Directory
        } else if meta.is_file() {
            EntryKind::File
        } else {
            EntryKind::Other
        })
    }

    async fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        tokio::fs::create_dir_all(path).await
    }

    async fn glob_search(&self, dir: &Path, pattern: &str) -> io::Result<Vec<PathBuf>> {
        let dir = dir.to_path_buf();
        let pattern = pattern.to_string();
        tokio::task::spawn_blocking(move || walk_and_match(&dir, &pattern))
            .await
            .map_err(io::Error::other)?
    }

    async fn open_read_stream(&self, path: &Path) -> io::Result<ReportStream> {
        let file = tokio::fs::File::open(path).await?;
        Ok(Box::pin(file))
    }
}

fn walk_and_match(dir: &Path, pattern: &str) -> io::Result<Vec<PathBuf>> {
    let matcher = Glob::new(pattern)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?
        .compile_matcher();

    let mut matches = Vec::new();
    for entry in WalkDir::new(dir).follow_links(false) {
        // Unreadable subdirectories are skipped rather than failing the search.
        let Ok(entry) = entry else { continue };
        // Symlinks are not descended into, but a link to a regular file counts as one.
        if !entry.path().is_file() {
            continue;
        }
        let Ok(relative) = entry.path().strip_prefix(dir) else {
            continue;
        };
        if matcher.is_match(relative) {
            matches.push(entry.into_path());
        }
    }
    matches.sort();
    Ok(matches)
}

pub struct OsProcessRunner;

#[async_trait]
impl ProcessRunner for OsProcessRunner {
    async fn execute(&self, command: &str, args: &[OsString]) -> io::Result<ProcessOutput> {
        let output = tokio::process::Command::new(command)
            .args(args)
            .kill_on_drop(true)
            .output()
            .await?;
        Ok(ProcessOutput {
            success: output.status.success(),
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// Forwards progress lines to `tracing` at info level.
pub struct TracingProgress;

impl ProgressReporter for TracingProgress {
    fn report(&self, message: &str) {
        tracing::info!(target: "llvm_cov_regions::progress", "{message}");
    }
}

/// Discards progress lines.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn report(&self, _message: &str) {}
}
