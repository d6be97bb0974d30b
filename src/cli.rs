//! Command handler functions for the CLI.
//!
//! Each `cmd_*` function returns its output as a `String`, making them easy
//! to test without capturing stdout.

use std::path::Path;

use anyhow::Result;
use clap::ValueEnum;

use crate::collector::CoverageQueryResult;
use crate::pipeline::Pipeline;
use crate::report::{JsonFormatter, QueryReport, ReportFormatter, TextFormatter};

/// Output style shared by every query command.
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum Style {
    #[default]
    Text,
    Json,
}

impl Style {
    fn formatter(self) -> &'static dyn ReportFormatter {
        match self {
            Style::Text => &TextFormatter,
            Style::Json => &JsonFormatter,
        }
    }
}

/// The report stores absolute paths; relative arguments are taken from the
/// workspace root.
#[must_use]
pub fn resolve_source_file(root_directory: &Path, source_file: &Path) -> String {
    if source_file.is_absolute() {
        source_file.display().to_string()
    } else {
        root_directory.join(source_file).display().to_string()
    }
}

pub async fn cmd_summary(pipeline: &Pipeline, source_file: &str, style: Style) -> Result<String> {
    let result = pipeline.get_uncovered_code_regions(source_file).await?;
    let report = QueryReport {
        source_file: source_file.to_string(),
        summary: Some(result.summary().await?),
        uncovered_regions: None,
    };
    report.format(style.formatter())
}

pub async fn cmd_uncovered(pipeline: &Pipeline, source_file: &str, style: Style) -> Result<String> {
    let result = pipeline.get_uncovered_code_regions(source_file).await?;
    let report = QueryReport {
        source_file: source_file.to_string(),
        summary: None,
        uncovered_regions: Some(result.collect_uncovered_regions().await?),
    };
    report.format(style.formatter())
}

pub async fn cmd_show(pipeline: &Pipeline, source_file: &str, style: Style) -> Result<String> {
    let result = pipeline.get_uncovered_code_regions(source_file).await?;
    full_report(&result).await?.format(style.formatter())
}

async fn full_report(result: &CoverageQueryResult) -> Result<QueryReport> {
    Ok(QueryReport {
        source_file: result.source_file().to_string(),
        summary: Some(result.summary().await?),
        uncovered_regions: Some(result.collect_uncovered_regions().await?),
    })
}
