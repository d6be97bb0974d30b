//! Output formatting for query results.

use std::fmt::Write;

use anyhow::Result;
use serde::Serialize;

use crate::model::{CoverageSummary, Range, RegionCoverageInfo};

/// What a command collected for one source file, ready to be formatted.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryReport {
    pub source_file: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<CoverageSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uncovered_regions: Option<Vec<RegionCoverageInfo>>,
}

impl QueryReport {
    /// Format using a specific formatter.
    pub fn format(&self, formatter: &dyn ReportFormatter) -> Result<String> {
        formatter.format(self)
    }
}

/// Trait for formatting query reports.
pub trait ReportFormatter {
    fn format(&self, report: &QueryReport) -> Result<String>;
}

/// Human-readable output.
pub struct TextFormatter;

impl ReportFormatter for TextFormatter {
    fn format(&self, report: &QueryReport) -> Result<String> {
        let mut out = String::new();
        let path = &report.source_file;

        if let Some(summary) = &report.summary {
            writeln!(out, "Coverage for '{path}':")?;
            writeln!(
                out,
                "  Regions:    {}/{} covered ({:.1}%)",
                summary.covered, summary.count, summary.percent
            )?;
            writeln!(out, "  Uncovered:  {}", summary.not_covered)?;
        }

        if let Some(regions) = &report.uncovered_regions {
            if regions.is_empty() {
                writeln!(out, "All code regions are covered in '{path}'")?;
            } else {
                writeln!(out, "Uncovered regions in '{path}':")?;
                for region in regions {
                    writeln!(out, "  {}", format_range(&region.range))?;
                }
                writeln!(
                    out,
                    "  lines {}",
                    format_line_ranges(&uncovered_lines(regions))
                )?;
                writeln!(out, "  ({} regions)", regions.len())?;
            }
        }

        Ok(out)
    }
}

/// Pretty-printed JSON, field names as in the editor protocol (`notCovered`,
/// `range.start.character`).
pub struct JsonFormatter;

impl ReportFormatter for JsonFormatter {
    fn format(&self, report: &QueryReport) -> Result<String> {
        let mut out = serde_json::to_string_pretty(report)?;
        out.push('\n');
        Ok(out)
    }
}

/// `line:col-line:col`.
#[must_use]
pub fn format_range(range: &Range) -> String {
    format!(
        "{}:{}-{}:{}",
        range.start.line, range.start.character, range.end.line, range.end.character
    )
}

/// Every line touched by at least one region, sorted and deduplicated.
#[must_use]
pub fn uncovered_lines(regions: &[RegionCoverageInfo]) -> Vec<u32> {
    let mut lines: Vec<u32> = regions
        .iter()
        .flat_map(|r| r.range.start.line..=r.range.end.line.max(r.range.start.line))
        .collect();
    lines.sort_unstable();
    lines.dedup();
    lines
}

/// Group consecutive line numbers into inclusive `(start, end)` ranges.
///
/// `lines` must be sorted and deduplicated.
#[must_use]
pub fn coalesce_ranges(lines: &[u32]) -> Vec<(u32, u32)> {
    let Some((&first, rest)) = lines.split_first() else {
        return Vec::new();
    };

    debug_assert!(
        lines.windows(2).all(|w| w[0] < w[1]),
        "coalesce_ranges requires sorted, deduplicated input"
    );

    let mut ranges = Vec::new();
    let mut start = first;
    let mut end = first;

    for &line in rest {
        if line == end + 1 {
            end = line;
        } else {
            ranges.push((start, end));
            start = line;
            end = line;
        }
    }

    ranges.push((start, end));
    ranges
}

/// Format line numbers into compact range notation, e.g. "1, 3-5, 8".
#[must_use]
pub fn format_line_ranges(lines: &[u32]) -> String {
    coalesce_ranges(lines)
        .iter()
        .map(|&(start, end)| {
            if start == end {
                start.to_string()
            } else {
                format!("{start}-{end}")
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Position;

    fn region(l1: u32, c1: u32, l2: u32, c2: u32) -> RegionCoverageInfo {
        RegionCoverageInfo::new(Position::new(l1, c1), Position::new(l2, c2))
    }

    fn sample() -> QueryReport {
        QueryReport {
            source_file: "/src/main.cpp".to_string(),
            summary: Some(CoverageSummary {
                count: 4,
                covered: 3,
                not_covered: 1,
                percent: 75.0,
            }),
            uncovered_regions: Some(vec![region(6, 53, 6, 71), region(9, 1, 11, 2)]),
        }
    }

    // -- coalesce_ranges -----------------------------------------------------

    #[test]
    fn test_coalesce_ranges_empty() {
        assert!(coalesce_ranges(&[]).is_empty());
    }

    #[test]
    fn test_coalesce_ranges_mixed() {
        assert_eq!(
            coalesce_ranges(&[1, 3, 4, 5, 8]),
            vec![(1, 1), (3, 5), (8, 8)]
        );
    }

    #[test]
    fn test_format_line_ranges() {
        assert_eq!(format_line_ranges(&[]), "");
        assert_eq!(format_line_ranges(&[7]), "7");
        assert_eq!(format_line_ranges(&[1, 3, 4, 5, 8]), "1, 3-5, 8");
    }

    #[test]
    fn test_uncovered_lines_spans_multiline_regions() {
        let regions = [region(9, 1, 11, 2), region(6, 53, 6, 71), region(10, 3, 10, 9)];
        assert_eq!(uncovered_lines(&regions), vec![6, 9, 10, 11]);
    }

    // -- formatters ----------------------------------------------------------

    #[test]
    fn test_format_text() {
        let out = sample().format(&TextFormatter).unwrap();
        assert_eq!(
            out,
            "Coverage for '/src/main.cpp':\n\
             \x20 Regions:    3/4 covered (75.0%)\n\
             \x20 Uncovered:  1\n\
             Uncovered regions in '/src/main.cpp':\n\
             \x20 6:53-6:71\n\
             \x20 9:1-11:2\n\
             \x20 lines 6, 9-11\n\
             \x20 (2 regions)\n"
        );
    }

    #[test]
    fn test_format_text_all_covered() {
        let report = QueryReport {
            summary: None,
            uncovered_regions: Some(vec![]),
            ..sample()
        };
        let out = report.format(&TextFormatter).unwrap();
        assert_eq!(out, "All code regions are covered in '/src/main.cpp'\n");
    }

    #[test]
    fn test_format_json() {
        let report = QueryReport {
            uncovered_regions: None,
            ..sample()
        };
        let out = report.format(&JsonFormatter).unwrap();
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["sourceFile"], "/src/main.cpp");
        assert_eq!(value["summary"]["notCovered"], 1);
        assert!(value.get("uncoveredRegions").is_none());
    }
}
