/// Location of the coverage report inside the build tree.
///
/// The report may sit anywhere below the build tree directory, so the
/// search pattern is `**/<report file name>`. Exactly one match is
/// required: stale reports left over from earlier builds are reported as
/// ambiguous instead of being guessed between.
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, warn};

use crate::adapters::{FileSystem, ProgressReporter};
use crate::error::{Error, Result};
use crate::settings::Settings;

pub struct CoverageReportLocator<'a> {
    settings: &'a Settings,
    fs: Arc<dyn FileSystem>,
    progress: Arc<dyn ProgressReporter>,
}

impl<'a> CoverageReportLocator<'a> {
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

    pub async fn resolve(&self, build_tree_directory: &Path) -> Result<PathBuf> {
        self.progress.report("resolving the coverage report file path");

        let name = self.settings.report_file_name.trim();
        if name.is_empty() {
            debug!("report file name is empty");
            return Err(Error::ReportNotFound);
        }

        let pattern = search_pattern(name);
        let mut matches = match self.fs.glob_search(build_tree_directory, &pattern).await {
            Ok(matches) => matches,
            Err(e) => {
                debug!(pattern, error = %e, "coverage report search failed");
                return Err(Error::ReportNotFound);
            }
        };

        debug!(pattern, count = matches.len(), "coverage report search done");
        match matches.len() {
            0 => Err(Error::ReportNotFound),
            1 => Ok(matches.remove(0)),
            n => {
                warn!(
                    pattern,
                    matches = n,
                    first = %matches[0].display(),
                    second = %matches[1].display(),
                    "several coverage reports found"
                );
                Err(Error::AmbiguousReport { matches: n })
            }
        }
    }
}

/// Glob pattern, relative to the build tree directory, for `report_file_name`.
pub fn search_pattern(report_file_name: &str) -> String {
    let name = report_file_name.trim_start_matches("./");
    if name.starts_with("**/") {
        name.to_string()
    } else {
        format!("**/{name}")
    }
}
