/// Parser for the `llvm-cov export -format=text` JSON document.
///
/// Reference: https://llvm.org/docs/CommandGuide/llvm-cov.html#llvm-cov-export
///
/// Shape of the parts we rely on:
///   - `data[0].files[]`:     `{ "filename": "...", "summary": { "regions": { "count", "covered", "notcovered", "percent" } } }`
///   - `data[0].functions[]`: `{ "filenames": [...], "regions": [[lineStart, colStart, lineEnd, colEnd, count, fileID, expandedFileID, kind], ...] }`
///
/// Everything else (`segments`, `branches`, `expansions`, `totals`, the
/// other summary sections, later `data` entries) is ignored.
use serde::Deserialize;
use serde_json::Value;

use crate::error::{Error, Result};
use crate::model::{CoverageSummary, Position, RegionCoverageInfo};

/// The first export entry of a report, validated.
#[derive(Debug, Clone, Deserialize)]
pub struct ExportEntry {
    pub files: Vec<FileEntry>,
    pub functions: Vec<FunctionEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FileEntry {
    pub filename: String,
    pub summary: FileSummary,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FileSummary {
    pub regions: RegionTotals,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegionTotals {
    pub count: u64,
    pub covered: u64,
    pub notcovered: u64,
    pub percent: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FunctionEntry {
    pub filenames: Vec<String>,
    pub regions: Vec<Region>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "Vec<u64>")]
pub struct Region {
    pub start: Position,
    pub end: Position,
    pub execution_count: u64,
    /// Index into the owning function's `filenames`.
    pub file_id: usize,
}

impl TryFrom<Vec<u64>> for Region {
    type Error = String;

    fn try_from(values: Vec<u64>) -> std::result::Result<Self, Self::Error> {
        // Older export versions stop after the execution count. The expanded
        // file id and region kind that may follow the file id are not used.
        let [line_start, col_start, line_end, col_end, execution_count, rest @ ..] =
            values.as_slice()
        else {
            return Err(format!(
                "a region needs at least 5 values, found {}",
                values.len()
            ));
        };

        let position = |v: u64| u32::try_from(v).map_err(|_| format!("position {v} out of range"));
        let file_id = rest
            .first()
            .map_or(Ok(0), |&v| usize::try_from(v).map_err(|_| format!("file id {v} out of range")))?;

        Ok(Region {
            start: Position::new(position(*line_start)?, position(*col_start)?),
            end: Position::new(position(*line_end)?, position(*col_end)?),
            execution_count: *execution_count,
            file_id,
        })
    }
}

#[derive(Deserialize)]
struct RawExport {
    data: Vec<Value>,
}

/// Parse a whole report and validate its first export entry.
pub fn parse(input: &[u8]) -> Result<ExportEntry> {
    if input.iter().all(u8::is_ascii_whitespace) {
        return Err(Error::invalid_report("empty coverage report"));
    }

    let raw: RawExport = serde_json::from_slice(input)
        .map_err(|e| Error::invalid_report(format!("not an llvm coverage export: {e}")))?;

    let first = raw
        .data
        .into_iter()
        .next()
        .ok_or_else(|| Error::invalid_report("the export contains no data entry"))?;

    ExportEntry::deserialize(first)
        .map_err(|e| Error::invalid_report(format!("malformed export entry: {e}")))
}

impl ExportEntry {
    /// Region summary for `source_file`, matched by exact filename.
    #[must_use]
    pub fn summary_for(&self, source_file: &str) -> Option<CoverageSummary> {
        self.files
            .iter()
            .find(|f| f.filename == source_file)
            .map(|f| {
                let totals = &f.summary.regions;
                CoverageSummary {
                    count: totals.count,
                    covered: totals.covered,
                    not_covered: totals.notcovered,
                    percent: totals.percent,
                }
            })
    }

    /// Whether any function lists `source_file` among its filenames.
    #[must_use]
    pub fn mentions_in_functions(&self, source_file: &str) -> bool {
        self.functions
            .iter()
            .any(|f| f.filenames.iter().any(|name| name == source_file))
    }

    /// Lazily walk the zero-count regions of `source_file`, or `None` when
    /// no function mentions it.
    #[must_use]
    pub fn into_uncovered_regions(self, source_file: &str) -> Option<UncoveredRegions> {
        if !self.mentions_in_functions(source_file) {
            return None;
        }
        Some(UncoveredRegions {
            source_file: source_file.to_string(),
            functions: self.functions.into_iter(),
            current: None,
        })
    }
}

/// Forward-only iterator over uncovered regions, in report order.
///
/// A region belongs to `filenames[file_id]` of its function; regions that
/// belong to another file (macro or include expansions) are skipped. An
/// out-of-range `file_id` falls back to the function's first filename.
#[derive(Debug)]
pub struct UncoveredRegions {
    source_file: String,
    functions: std::vec::IntoIter<FunctionEntry>,
    current: Option<CurrentFunction>,
}

#[derive(Debug)]
struct CurrentFunction {
    /// `owned[i]` is true when `filenames[i]` is the queried file.
    owned: Vec<bool>,
    regions: std::vec::IntoIter<Region>,
}

impl CurrentFunction {
    fn owns(&self, file_id: usize) -> bool {
        self.owned
            .get(file_id)
            .or_else(|| self.owned.first())
            .copied()
            .unwrap_or(false)
    }
}

impl Iterator for UncoveredRegions {
    type Item = RegionCoverageInfo;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(current) = &mut self.current {
                while let Some(region) = current.regions.next() {
                    if region.execution_count == 0 && current.owns(region.file_id) {
                        return Some(RegionCoverageInfo::new(region.start, region.end));
                    }
                }
                self.current = None;
            }

            let function = self.functions.next()?;
            if function.filenames.iter().any(|f| *f == self.source_file) {
                self.current = Some(CurrentFunction {
                    owned: function
                        .filenames
                        .iter()
                        .map(|f| *f == self.source_file)
                        .collect(),
                    regions: function.regions.into_iter(),
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    const MINIMAL: &str = r#"{
        "data": [{
            "files": [{
                "filename": "/a/source/file.cpp",
                "summary": { "regions": { "count": 2, "covered": 2, "notcovered": 0, "percent": 100 } }
            }],
            "functions": [{
                "filenames": ["/a/source/file.cpp"],
                "regions": [[4, 52, 4, 54, 1, 0, 0, 0], [6, 53, 6, 71, 0, 0, 0, 0]]
            }]
        }],
        "type": "llvm.coverage.json.export",
        "version": "2.0.1"
    }"#;

    #[test]
    fn test_parse_minimal() {
        let entry = parse(MINIMAL.as_bytes()).unwrap();
        assert_eq!(entry.files.len(), 1);
        assert_eq!(entry.functions.len(), 1);
        assert_eq!(entry.functions[0].regions[1].start, Position::new(6, 53));
        assert_eq!(entry.functions[0].regions[1].execution_count, 0);
    }

    #[test]
    fn test_summary_for() {
        let entry = parse(MINIMAL.as_bytes()).unwrap();
        let summary = entry.summary_for("/a/source/file.cpp").unwrap();
        assert_eq!(summary.count, 2);
        assert_eq!(summary.covered, 2);
        assert_eq!(summary.not_covered, 0);
        assert_eq!(summary.percent, 100.0);

        // No path normalization.
        assert!(entry.summary_for("/a/source/../source/file.cpp").is_none());
    }

    #[test]
    fn test_uncovered_regions() {
        let entry = parse(MINIMAL.as_bytes()).unwrap();
        let regions: Vec<_> = entry
            .into_uncovered_regions("/a/source/file.cpp")
            .unwrap()
            .collect();
        assert_eq!(
            regions,
            vec![RegionCoverageInfo::new(Position::new(6, 53), Position::new(6, 71))]
        );
    }

    #[test]
    fn test_uncovered_regions_unknown_file() {
        let entry = parse(MINIMAL.as_bytes()).unwrap();
        assert!(entry.into_uncovered_regions("/other.cpp").is_none());
    }

    #[test]
    fn test_regions_keep_report_order_across_functions() {
        let input = r#"{ "data": [{ "files": [], "functions": [
            { "filenames": ["/f.cpp"], "regions": [[9, 1, 9, 5, 0, 0, 0, 0], [2, 1, 2, 5, 0, 0, 0, 3]] },
            { "filenames": ["/g.cpp"], "regions": [[1, 1, 1, 2, 0, 0, 0, 0]] },
            { "filenames": ["/f.cpp"], "regions": [[2, 1, 2, 5, 0, 0, 0, 0], [3, 1, 3, 2, 7, 0, 0, 0]] }
        ] }] }"#;
        let entry = parse(input.as_bytes()).unwrap();
        let lines: Vec<u32> = entry
            .into_uncovered_regions("/f.cpp")
            .unwrap()
            .map(|r| r.range.start.line)
            .collect();
        // Gap regions are kept, overlapping duplicates are not merged.
        assert_eq!(lines, vec![9, 2, 2]);
    }

    #[test]
    fn test_regions_of_expanded_files_are_skipped() {
        let input = r#"{ "data": [{ "files": [], "functions": [
            { "filenames": ["/f.cpp", "/macros.h"],
              "regions": [[10, 1, 12, 2, 0, 0, 0, 0], [3, 9, 3, 20, 0, 1, 0, 0], [11, 3, 11, 8, 0, 0, 1, 1]] }
        ] }] }"#;

        let entry = parse(input.as_bytes()).unwrap();
        let f: Vec<u32> = entry
            .clone()
            .into_uncovered_regions("/f.cpp")
            .unwrap()
            .map(|r| r.range.start.line)
            .collect();
        assert_eq!(f, vec![10, 11]);

        let header: Vec<u32> = entry
            .into_uncovered_regions("/macros.h")
            .unwrap()
            .map(|r| r.range.start.line)
            .collect();
        assert_eq!(header, vec![3]);
    }

    #[test]
    fn test_short_region_arrays() {
        // Five values are enough.
        let ok = r#"{ "data": [{ "files": [], "functions": [
            { "filenames": ["/f.cpp"], "regions": [[1, 2, 3, 4, 0]] } ] }] }"#;
        let entry = parse(ok.as_bytes()).unwrap();
        assert_eq!(entry.functions[0].regions[0].file_id, 0);

        let short = r#"{ "data": [{ "files": [], "functions": [
            { "filenames": ["/f.cpp"], "regions": [[1, 2, 3, 4]] } ] }] }"#;
        let err = parse(short.as_bytes()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidReportFormat);
        let Error::InvalidReportFormat { cause } = err else {
            unreachable!()
        };
        assert!(cause.contains("at least 5 values, found 4"), "{cause}");
    }

    #[test]
    fn test_invalid_inputs() {
        for input in [
            "",
            "   \n",
            "foo",
            r#"{ "data": [] }"#,
            r#"{ "data": [{ "foo": "bar" }, {}] }"#,
            r#"{ "data": [{ "files": [] }] }"#,
            r#"{ "type": "llvm.coverage.json.export" }"#,
        ] {
            let err = parse(input.as_bytes()).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidReportFormat, "input: {input:?}");
        }
    }

    #[test]
    fn test_only_first_entry_is_validated() {
        let input = r#"{ "data": [{ "files": [], "functions": [] }, { "foo": 1 }] }"#;
        assert!(parse(input.as_bytes()).is_ok());
    }

    #[test]
    fn test_function_with_only_other_file_regions_yields_nothing() {
        let input = r#"{ "data": [{ "files": [], "functions": [
            { "filenames": ["/f.cpp", "/macros.h"],
              "regions": [[3, 9, 3, 20, 0, 1, 0, 0], [4, 1, 4, 7, 0, 1, 0, 0], [8, 1, 9, 2, 5, 0, 0, 0]] }
        ] }] }"#;

        let entry = parse(input.as_bytes()).unwrap();
        let regions = entry.into_uncovered_regions("/f.cpp");
        assert_eq!(regions.map(Iterator::count), Some(0));
    }
}
