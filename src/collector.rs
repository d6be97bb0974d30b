//! Deferred coverage queries against a located report.
//!
//! [`CoverageCollector::collect_for`] does no I/O. Each accessor of the
//! returned [`CoverageQueryResult`] opens its own stream over the report,
//! reads it to the end, and parses it again; nothing parsed is kept between
//! accesses.
use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures::stream::{self, BoxStream, StreamExt};
use tokio::io::AsyncReadExt;
use tracing::{debug, warn};

use crate::adapters::{FileSystem, ProgressReporter};
use crate::error::{Error, Result};
use crate::model::{CoverageSummary, RegionCoverageInfo};
use crate::parsers::llvm::{self, ExportEntry};

pub struct CoverageCollector {
    fs: Arc<dyn FileSystem>,
    progress: Arc<dyn ProgressReporter>,
}

impl CoverageCollector {
    pub fn new(fs: Arc<dyn FileSystem>, progress: Arc<dyn ProgressReporter>) -> Self {
        Self { fs, progress }
    }

    #[must_use]
    pub fn collect_for(
        &self,
        report_path: impl Into<PathBuf>,
        source_file: impl Into<String>,
    ) -> CoverageQueryResult {
        CoverageQueryResult {
            fs: self.fs.clone(),
            progress: self.progress.clone(),
            report_path: report_path.into(),
            source_file: source_file.into(),
        }
    }
}

/// Coverage of one source file in one report.
#[derive(Clone)]
pub struct CoverageQueryResult {
    fs: Arc<dyn FileSystem>,
    progress: Arc<dyn ProgressReporter>,
    report_path: PathBuf,
    source_file: String,
}

impl std::fmt::Debug for CoverageQueryResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoverageQueryResult")
            .field("report_path", &self.report_path)
            .field("source_file", &self.source_file)
            .finish_non_exhaustive()
    }
}

impl CoverageQueryResult {
    pub fn report_path(&self) -> &Path {
        &self.report_path
    }

    pub fn source_file(&self) -> &str {
        &self.source_file
    }

    pub async fn summary(&self) -> Result<CoverageSummary> {
        self.progress.report("collecting the coverage summary");
        let entry = load_report(self.fs.as_ref(), &self.report_path).await?;
        entry
            .summary_for(&self.source_file)
            .ok_or_else(|| Error::UnhandledSourceFile(self.source_file.clone()))
    }

    /// Uncovered regions in report order. Nothing is read until the stream
    /// is first polled; failures are yielded as the first (and only) item.
    pub fn uncovered_regions(&self) -> BoxStream<'static, Result<RegionCoverageInfo>> {
        let fs = self.fs.clone();
        let progress = self.progress.clone();
        let report_path = self.report_path.clone();
        let source_file = self.source_file.clone();

        let regions = async move {
            progress.report("collecting uncovered code regions");
            let entry = load_report(fs.as_ref(), &report_path).await?;
            entry
                .into_uncovered_regions(&source_file)
                .ok_or(Error::UnhandledRegionsForSourceFile(source_file))
        };

        stream::once(regions)
            .map(|result| match result {
                Ok(regions) => stream::iter(regions.map(Ok::<_, Error>)).left_stream(),
                Err(e) => stream::iter([Err(e)]).right_stream(),
            })
            .flatten()
            .boxed()
    }

    /// Drain [`Self::uncovered_regions`], stopping at the first failure.
    pub async fn collect_uncovered_regions(&self) -> Result<Vec<RegionCoverageInfo>> {
        let mut regions = Vec::new();
        let mut stream = self.uncovered_regions();
        while let Some(region) = stream.next().await {
            regions.push(region?);
        }
        Ok(regions)
    }
}

async fn load_report(fs: &dyn FileSystem, report_path: &Path) -> Result<ExportEntry> {
    let mut stream = fs.open_read_stream(report_path).await?;
    let mut content = Vec::new();
    stream.read_to_end(&mut content).await?;
    debug!(path = %report_path.display(), bytes = content.len(), "coverage report read");
    llvm::parse(&content).inspect_err(|e| {
        if let Error::InvalidReportFormat { cause } = e {
            warn!(path = %report_path.display(), cause = %cause, "coverage report rejected");
        }
    })
}
