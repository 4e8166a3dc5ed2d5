use crate::config::RatioConvention;
use crate::error::FailureKind;
use crate::models::statistics::{format_optional, FileStatistics};
use crate::models::validation::{ValidationDefect, ValidationReport};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileFailure {
    pub kind: FailureKind,
    pub message: String,
}

/// What happened to one discovered file.
#[derive(Debug, Clone, PartialEq)]
pub enum FileOutcome {
    /// Statistics were computed; the report may still carry defects.
    Processed {
        report: ValidationReport,
        statistics: FileStatistics,
    },
    Failed {
        path: PathBuf,
        report: Option<ValidationReport>,
        failure: FileFailure,
    },
    /// Never started because the run was cancelled.
    Unprocessed { path: PathBuf },
}

impl FileOutcome {
    pub fn path(&self) -> &Path {
        match self {
            FileOutcome::Processed { report, .. } => &report.source,
            FileOutcome::Failed { path, .. } | FileOutcome::Unprocessed { path } => path,
        }
    }

    pub fn status(&self) -> FileStatus {
        match self {
            FileOutcome::Processed { report, .. } if report.is_defective() => FileStatus::Defective,
            FileOutcome::Processed { .. } => FileStatus::Clean,
            FileOutcome::Failed { .. } => FileStatus::Failed,
            FileOutcome::Unprocessed { .. } => FileStatus::Unprocessed,
        }
    }

    pub fn report(&self) -> Option<&ValidationReport> {
        match self {
            FileOutcome::Processed { report, .. } => Some(report),
            FileOutcome::Failed { report, .. } => report.as_ref(),
            FileOutcome::Unprocessed { .. } => None,
        }
    }

    pub fn statistics(&self) -> Option<&FileStatistics> {
        match self {
            FileOutcome::Processed { statistics, .. } => Some(statistics),
            _ => None,
        }
    }

    pub fn describe(&self) -> String {
        let name = self
            .path()
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path().display().to_string());

        match self {
            FileOutcome::Processed { report, statistics } => {
                let defects = report.defects();
                if defects.is_empty() {
                    format!(
                        "✅ {}: {} records, {:.2}% sentinel",
                        name, statistics.total_days, statistics.percentage_missing_999
                    )
                } else {
                    format!("⚠️  {}: {}", name, join_defects(&defects))
                }
            }
            FileOutcome::Failed { failure, .. } => {
                format!("❌ {}: {} ({})", name, failure.kind.label(), failure.message)
            }
            FileOutcome::Unprocessed { .. } => format!("⏸  {}: not processed", name),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileStatus {
    Clean,
    Defective,
    Failed,
    Unprocessed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FolderStatus {
    /// No file matched the selection filter.
    NothingToProcess,
    Completed,
    /// Stopped between files; totals cover what finished.
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileSummaryEntry {
    pub path: PathBuf,
    pub status: FileStatus,
    pub defects: Vec<ValidationDefect>,
    pub failure: Option<FileFailure>,
    pub contributed: bool,
}

/// Folder-level reduction handed to the report emitters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FolderSummary {
    pub folder: PathBuf,
    pub status: FolderStatus,
    pub sentinel: f64,
    pub ratio_convention: RatioConvention,

    pub files_discovered: usize,
    pub files_clean: usize,
    pub files_defective: usize,
    pub files_failed: usize,
    pub files_unprocessed: usize,
    /// Files whose statistics went into the totals below.
    pub files_contributing: usize,

    pub total_data: usize,
    pub total_missing_values: usize,
    pub total_non_missing_values: usize,
    pub total_zeros: usize,
    pub total_words: usize,
    pub total_missing_999: usize,
    pub total_days: usize,
    pub days_without_registry: usize,

    pub percentage_missing_999: Option<f64>,
    pub percentage_days_without_registry: Option<f64>,
    pub processing_percent: Option<f64>,
    pub mean_annual_total: Option<f64>,

    pub files: Vec<FileSummaryEntry>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricUnit {
    Count,
    Percent,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Metric {
    pub label: String,
    pub value: Option<f64>,
    pub unit: MetricUnit,
}

impl Metric {
    fn count(label: impl Into<String>, value: usize) -> Self {
        Self {
            label: label.into(),
            value: Some(value as f64),
            unit: MetricUnit::Count,
        }
    }

    fn percent(label: impl Into<String>, value: Option<f64>) -> Self {
        Self {
            label: label.into(),
            value,
            unit: MetricUnit::Percent,
        }
    }

    pub fn formatted_value(&self) -> String {
        match (self.unit, self.value) {
            (MetricUnit::Count, Some(v)) => format!("{}", v as u64),
            (MetricUnit::Percent, Some(v)) => format!("{:.2}%", v),
            (_, None) => "n/a".to_string(),
        }
    }
}

impl FolderSummary {
    pub fn is_nothing_to_process(&self) -> bool {
        self.status == FolderStatus::NothingToProcess
    }

    pub fn excluded_files(&self) -> impl Iterator<Item = &FileSummaryEntry> {
        self.files.iter().filter(|f| !f.contributed)
    }

    /// The reported metric set, in output order.
    pub fn metrics(&self) -> Vec<Metric> {
        let sentinel = format_sentinel(self.sentinel);
        vec![
            Metric::count("Total data", self.total_data),
            Metric::count("Total missing values", self.total_missing_values),
            Metric::count("Total non-missing values", self.total_non_missing_values),
            Metric::count("Total zeros", self.total_zeros),
            Metric::count("Total words", self.total_words),
            Metric::count(format!("Total missing {} values", sentinel), self.total_missing_999),
            Metric::percent(
                format!("Percentage of missing {} values", sentinel),
                self.percentage_missing_999,
            ),
            Metric::percent("Percentage of processed files", self.processing_percent),
            Metric::percent(
                "Percentage of days without registry",
                self.percentage_days_without_registry,
            ),
        ]
    }

    pub fn summary(&self) -> String {
        let mut summary = String::new();

        summary.push_str("=== Folder Summary ===\n");
        summary.push_str(&format!("Folder: {}\n", self.folder.display()));

        match self.status {
            FolderStatus::NothingToProcess => {
                summary.push_str("Nothing to process: no matching files found\n");
                return summary;
            }
            FolderStatus::Cancelled => {
                summary.push_str(&format!(
                    "Run cancelled: {} files left unprocessed\n",
                    self.files_unprocessed
                ));
            }
            FolderStatus::Completed => {}
        }

        summary.push_str(&format!(
            "Files: {} discovered, {} clean, {} with defects, {} failed\n",
            self.files_discovered, self.files_clean, self.files_defective, self.files_failed
        ));
        summary.push_str(&format!(
            "Files in totals: {} (ratios: {})\n\n",
            self.files_contributing,
            self.ratio_convention.name()
        ));

        for metric in self.metrics() {
            summary.push_str(&format!("{}: {}\n", metric.label, metric.formatted_value()));
        }
        summary.push_str(&format!(
            "Mean annual total: {}\n",
            format_optional(self.mean_annual_total, 1)
        ));

        let excluded: Vec<_> = self.excluded_files().collect();
        if !excluded.is_empty() {
            summary.push_str(&format!("\nExcluded files: {}\n", excluded.len()));
            for entry in excluded {
                summary.push_str(&format!("  {} - {}\n", entry.path.display(), entry.reason()));
            }
        }

        summary
    }
}

impl FileSummaryEntry {
    pub fn reason(&self) -> String {
        if let Some(failure) = &self.failure {
            return format!("{}: {}", failure.kind.label(), failure.message);
        }
        match self.status {
            FileStatus::Unprocessed => "not processed".to_string(),
            FileStatus::Clean => "clean".to_string(),
            _ => join_defects(&self.defects),
        }
    }
}

fn join_defects(defects: &[ValidationDefect]) -> String {
    defects
        .iter()
        .map(|d| d.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn format_sentinel(sentinel: f64) -> String {
    if sentinel.fract() == 0.0 {
        format!("{}", sentinel as i64)
    } else {
        format!("{}", sentinel)
    }
}
