use std::path::PathBuf;
use std::sync::Arc;

use tracing::debug;

use crate::adapters::{EntryKind, FileSystem, ProgressReporter};
use crate::error::{Error, Result};
use crate::settings::{Settings, BUILD_TREE_DIRECTORY_LABEL};

/// Turns the configured build tree directory into a verified absolute path,
/// creating it when it does not exist yet.
pub struct BuildTreeDirectoryResolver<'a> {
    settings: &'a Settings,
    fs: Arc<dyn FileSystem>,
    progress: Arc<dyn ProgressReporter>,
}

impl<'a> BuildTreeDirectoryResolver<'a> {
    pub fn new(
        settings: &'a Settings,
        fs: Arc<dyn FileSystem>,
        progress: Arc<dyn ProgressReporter>,
    ) -> Self {
        Self {
            settings,
            fs,
            progress,
        }
    }

    pub async fn resolve(&self) -> Result<PathBuf> {
        self.progress.report("resolving the build tree directory");

        let configured = &self.settings.build_tree_directory;
        if configured.is_absolute() || configured.has_root() {
            return Err(Error::InvalidConfiguration(format!(
                "Incorrect absolute path specified in '{BUILD_TREE_DIRECTORY_LABEL}'. \
                 It must be a relative path."
            )));
        }

        let candidate = self.settings.root_directory.join(configured);

        match self.fs.stat(&candidate).await {
            Ok(EntryKind::Directory) => {
                debug!(path = %candidate.display(), "build tree directory exists");
                return Ok(candidate);
            }
            Ok(kind) => debug!(path = %candidate.display(), ?kind, "build tree path is not a directory"),
            Err(e) => debug!(path = %candidate.display(), error = %e, "build tree directory not found"),
        }

        match self.fs.create_dir_all(&candidate).await {
            Ok(()) => {
                debug!(path = %candidate.display(), "build tree directory created");
                Ok(candidate)
            }
            Err(e) => {
                debug!(path = %candidate.display(), error = %e, "cannot create build tree directory");
                Err(Error::BuildTreeUnavailable)
            }
        }
    }
}
