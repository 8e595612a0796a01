//! Line coverage gate over a JaCoCo CSV report
use crate::error::{BuildError, BuildResult};
use serde::{Deserialize, Serialize};
use std::io::{self, Read, Write};
use std::path::Path;

/// One class row of the report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoverageRow {
    #[serde(rename = "PACKAGE")]
    pub package: String,
    #[serde(rename = "CLASS")]
    pub class: String,
    #[serde(rename = "LINE_MISSED")]
    pub line_missed: u64,
    #[serde(rename = "LINE_COVERED")]
    pub line_covered: u64,
}

impl CoverageRow {
    pub fn total_lines(&self) -> u64 {
        self.line_missed + self.line_covered
    }

    /// Covered share of lines, truncated to a whole percent.
    /// A class without lines counts as fully covered.
    pub fn percent(&self) -> u64 {
        match self.total_lines() {
            0 => 100,
            total => self.line_covered * 100 / total,
        }
    }

    /// `package.Class`, or just the class in the default package
    pub fn qualified_name(&self) -> String {
        if self.package.is_empty() {
            self.class.clone()
        } else {
            format!("{}.{}", self.package, self.class)
        }
    }

    fn meets(&self, threshold: f64) -> bool {
        self.percent() as f64 >= threshold
    }
}

/// Result of checking a report against a minimum
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoverageVerdict {
    pub threshold: f64,
    pub failing: Vec<CoverageRow>,
}

impl CoverageVerdict {
    pub fn passed(&self) -> bool {
        self.failing.is_empty()
    }
}

/// Parsed coverage report
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CoverageReport {
    rows: Vec<CoverageRow>,
}

impl CoverageReport {
    pub fn from_path(path: &Path) -> BuildResult<Self> {
        let file = std::fs::File::open(path).map_err(|e| BuildError::io(path, e))?;
        Self::from_reader(file, path)
    }

    /// Parse CSV with a header row; `path` labels errors only
    pub fn from_reader<R: Read>(reader: R, path: &Path) -> BuildResult<Self> {
        let mut reader = csv::Reader::from_reader(reader);
        let mut rows = Vec::new();
        for (index, record) in reader.deserialize().enumerate() {
            let row: CoverageRow = record.map_err(|e| {
                BuildError::coverage_report(path, format!("row {}: {}", index + 1, e))
            })?;
            rows.push(row);
        }
        Ok(Self { rows })
    }

    pub fn rows(&self) -> &[CoverageRow] {
        &self.rows
    }

    pub fn evaluate(&self, threshold: f64) -> CoverageVerdict {
        CoverageVerdict {
            threshold,
            failing: self
                .rows
                .iter()
                .filter(|row| !row.meets(threshold))
                .cloned()
                .collect(),
        }
    }

    /// Print failing rows and a final pass/fail line.
    /// Column widths come from every row in the report, not just the failing ones.
    pub fn write_verdict(&self, verdict: &CoverageVerdict, out: &mut dyn Write) -> io::Result<()> {
        let name_width = self
            .rows
            .iter()
            .map(|row| row.qualified_name().len())
            .max()
            .unwrap_or(0);
        let count_width = self
            .rows
            .iter()
            .map(|row| row.total_lines().to_string().len())
            .max()
            .unwrap_or(1);

        for row in &verdict.failing {
            writeln!(
                out,
                "  {:<name_width$}  {:>count_width$} of {:>count_width$} lines  {:>3}%",
                row.qualified_name(),
                row.line_covered,
                row.total_lines(),
                row.percent(),
            )?;
        }

        if verdict.passed() {
            writeln!(
                out,
                "Line coverage meets the {}% minimum.",
                verdict.threshold
            )
        } else {
            writeln!(
                out,
                "Line coverage is below the {}% minimum in {} class(es).",
                verdict.threshold,
                verdict.failing.len()
            )
        }
    }
}
