//! Coverage values handed back to callers. Positions are kept exactly as
//! the report encodes them (1-based lines and columns).

use serde::Serialize;

/// Region totals for one source file.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CoverageSummary {
    pub count: u64,
    pub covered: u64,
    pub not_covered: u64,
    /// 0 to 100.
    pub percent: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Position {
    pub line: u32,
    pub character: u32,
}

impl Position {
    #[must_use]
    pub fn new(line: u32, character: u32) -> Self {
        Self { line, character }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Range {
    pub start: Position,
    pub end: Position,
}

/// A source region that was never executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RegionCoverageInfo {
    pub range: Range,
}

impl RegionCoverageInfo {
    #[must_use]
    pub fn new(start: Position, end: Position) -> Self {
        Self {
            range: Range { start, end },
        }
    }
}
