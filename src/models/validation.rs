use crate::models::raw_table::DelimiterDetection;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Findings for one file. Built once by the validator, read-only afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub source: PathBuf,
    pub detection: DelimiterDetection,
    pub has_header: bool,
    pub expected_width: usize,
    pub total_rows: usize,
    /// Rows that became records and feed the statistics engine.
    pub accepted_rows: usize,
    pub column_count_consistent: bool,
    pub months_complete: bool,
    pub coverage: MonthCoverage,
    pub anomalies: Vec<RowAnomaly>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowAnomaly {
    pub line_number: usize,
    pub anomaly_type: AnomalyType,
    pub details: String,
    /// Full row content as read.
    pub content: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnomalyType {
    ColumnCount { expected: usize, found: usize },
    MonthOutOfRange,
    InvalidYear,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MonthCoverage {
    /// Distinct integer month values seen, sorted.
    pub present: Vec<i64>,
    pub missing: Vec<u32>,
    /// Present values outside 1..=12.
    pub extra: Vec<i64>,
    pub duplicates: Vec<DuplicateMonth>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicateMonth {
    pub station_id: String,
    pub year: i32,
    pub month: u32,
    pub occurrences: usize,
}

impl MonthCoverage {
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty() && self.extra.is_empty() && self.duplicates.is_empty()
    }
}

/// Recoverable data-quality defect; recorded, never fatal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationDefect {
    InconsistentColumnCount,
    MonthOutOfRange,
    MonthSequence,
}

impl fmt::Display for ValidationDefect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            ValidationDefect::InconsistentColumnCount => "inconsistent column count",
            ValidationDefect::MonthOutOfRange => "month values out of range",
            ValidationDefect::MonthSequence => "months not in correct order/complete",
        };
        f.write_str(text)
    }
}

impl ValidationReport {
    pub fn defects(&self) -> Vec<ValidationDefect> {
        let mut defects = Vec::new();
        if !self.column_count_consistent {
            defects.push(ValidationDefect::InconsistentColumnCount);
        }
        if self.anomalies.iter().any(|a| {
            matches!(
                a.anomaly_type,
                AnomalyType::MonthOutOfRange | AnomalyType::InvalidYear
            )
        }) {
            defects.push(ValidationDefect::MonthOutOfRange);
        }
        if !self.months_complete {
            defects.push(ValidationDefect::MonthSequence);
        }
        defects
    }

    pub fn is_defective(&self) -> bool {
        !self.defects().is_empty()
    }

    pub fn column_count_anomalies(&self) -> impl Iterator<Item = &RowAnomaly> {
        self.anomalies
            .iter()
            .filter(|a| matches!(a.anomaly_type, AnomalyType::ColumnCount { .. }))
    }

    /// Multi-line findings listing for console output.
    pub fn summary(&self) -> String {
        let mut summary = String::new();

        summary.push_str(&format!("=== Validation: {} ===\n", self.source.display()));
        summary.push_str(&format!(
            "Delimiter: {} ({} of {} sampled lines agree on {} fields)\n",
            self.detection.delimiter,
            self.detection.agreeing_lines,
            self.detection.sampled_lines,
            self.detection.sample_width
        ));
        summary.push_str(&format!(
            "Header row: {}\n",
            if self.has_header { "yes" } else { "no" }
        ));
        summary.push_str(&format!(
            "Rows: {} read, {} accepted (expected width {})\n",
            self.total_rows, self.accepted_rows, self.expected_width
        ));
        summary.push_str(&format!(
            "Column count consistent: {}\n",
            if self.column_count_consistent { "yes" } else { "no" }
        ));
        summary.push_str(&format!(
            "Months complete: {}\n",
            if self.months_complete { "yes" } else { "no" }
        ));

        if !self.coverage.missing.is_empty() {
            summary.push_str(&format!("  Missing months: {:?}\n", self.coverage.missing));
        }
        if !self.coverage.extra.is_empty() {
            summary.push_str(&format!("  Extra months: {:?}\n", self.coverage.extra));
        }
        for dup in self.coverage.duplicates.iter().take(10) {
            summary.push_str(&format!(
                "  Month {} appears {} times for station {} in {}\n",
                dup.month, dup.occurrences, dup.station_id, dup.year
            ));
        }

        if !self.anomalies.is_empty() {
            summary.push_str(&format!("\nRow anomalies: {}\n", self.anomalies.len()));
            for (i, anomaly) in self.anomalies.iter().take(10).enumerate() {
                summary.push_str(&format!(
                    "  {}. Line {}: {}\n     {}\n",
                    i + 1,
                    anomaly.line_number,
                    anomaly.details,
                    anomaly.content
                ));
            }
        }

        summary
    }
}
