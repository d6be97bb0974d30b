//! One query, start to finish: resolve the build tree, build the coverage
//! target, locate the report, and hand back a deferred query result.
//!
//! Stages run strictly in order and nothing is cached between queries. The
//! first failing stage's error is returned untouched.
use tracing::debug;

use crate::adapters::Adapters;
use crate::build::BuildInvoker;
use crate::build_tree::BuildTreeDirectoryResolver;
use crate::collector::{CoverageCollector, CoverageQueryResult};
use crate::error::Result;
use crate::locate::CoverageReportLocator;
use crate::settings::Settings;

pub struct Pipeline {
    settings: Settings,
    adapters: Adapters,
}

impl Pipeline {
    pub fn new(settings: Settings, adapters: Adapters) -> Self {
        Self { settings, adapters }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub async fn get_uncovered_code_regions(
        &self,
        source_file_path: &str,
    ) -> Result<CoverageQueryResult> {
        let Adapters {
            fs,
            process,
            progress,
        } = &self.adapters;

        debug!(source_file_path, "query started");

        let build_tree_directory =
            BuildTreeDirectoryResolver::new(&self.settings, fs.clone(), progress.clone())
                .resolve()
                .await?;

        BuildInvoker::new(&self.settings, process.clone(), progress.clone())
            .build_target(&build_tree_directory)
            .await?;

        let report_path = CoverageReportLocator::new(&self.settings, fs.clone(), progress.clone())
            .resolve(&build_tree_directory)
            .await?;

        debug!(report = %report_path.display(), "coverage report located");
        Ok(CoverageCollector::new(fs.clone(), progress.clone())
            .collect_for(report_path, source_file_path))
    }
}
