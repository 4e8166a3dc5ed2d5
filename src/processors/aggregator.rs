use crate::config::{AuditConfig, DefectiveFilePolicy, RatioConvention};
use crate::models::{
    FileFailure, FileOutcome, FileStatistics, FileStatus, FileSummaryEntry, FolderStatus,
    FolderSummary,
};
use crate::utils::constants::DEFAULT_SENTINEL;
use std::path::Path;
use tracing::debug;

/// Reduces per-file outcomes into one [`FolderSummary`].
pub struct Aggregator {
    ratio_convention: RatioConvention,
    defective_file_policy: DefectiveFilePolicy,
    sentinel: f64,
}

#[derive(Default)]
struct Totals {
    total_data: usize,
    total_missing_values: usize,
    total_non_missing_values: usize,
    total_zeros: usize,
    total_words: usize,
    total_missing_999: usize,
    total_days: usize,
    days_without_registry: usize,
    annual_total_sum: f64,
    year_count: usize,
}

impl Totals {
    fn add(&mut self, stats: &FileStatistics) {
        self.total_data += stats.total_data;
        self.total_missing_values += stats.total_missing_values;
        self.total_non_missing_values += stats.total_non_missing_values;
        self.total_zeros += stats.total_zeros;
        self.total_words += stats.total_words;
        self.total_missing_999 += stats.total_missing_999;
        self.total_days += stats.total_days;
        self.days_without_registry += stats.days_without_registry;
        self.annual_total_sum += stats.annual_total_sum();
        self.year_count += stats.observed_years().count();
    }
}

impl Aggregator {
    pub fn new() -> Self {
        Self {
            ratio_convention: RatioConvention::default(),
            defective_file_policy: DefectiveFilePolicy::default(),
            sentinel: DEFAULT_SENTINEL,
        }
    }

    pub fn from_config(config: &AuditConfig) -> Self {
        Self {
            ratio_convention: config.ratio_convention,
            defective_file_policy: config.defective_file_policy,
            sentinel: config.sentinel,
        }
    }

    pub fn with_ratio_convention(mut self, ratio_convention: RatioConvention) -> Self {
        self.ratio_convention = ratio_convention;
        self
    }

    pub fn with_defective_file_policy(mut self, policy: DefectiveFilePolicy) -> Self {
        self.defective_file_policy = policy;
        self
    }

    pub fn with_sentinel(mut self, sentinel: f64) -> Self {
        self.sentinel = sentinel;
        self
    }

    /// Fold outcomes in path order so the result never depends on which
    /// worker finished first.
    pub fn aggregate(&self, folder: &Path, mut outcomes: Vec<FileOutcome>) -> FolderSummary {
        outcomes.sort_by(|a, b| a.path().cmp(b.path()));

        let mut totals = Totals::default();
        let mut contributing: Vec<&FileStatistics> = Vec::new();
        let mut files = Vec::with_capacity(outcomes.len());
        let (mut clean, mut defective, mut failed, mut unprocessed) = (0usize, 0usize, 0usize, 0usize);

        for outcome in &outcomes {
            let status = outcome.status();
            match status {
                FileStatus::Clean => clean += 1,
                FileStatus::Defective => defective += 1,
                FileStatus::Failed => failed += 1,
                FileStatus::Unprocessed => unprocessed += 1,
            }

            let contributed = match (status, outcome.statistics()) {
                (FileStatus::Clean, Some(stats)) => Some(stats),
                (FileStatus::Defective, Some(stats))
                    if self.defective_file_policy.includes_defective() =>
                {
                    Some(stats)
                }
                _ => None,
            };

            if let Some(stats) = contributed {
                totals.add(stats);
                contributing.push(stats);
            }

            files.push(FileSummaryEntry {
                path: outcome.path().to_path_buf(),
                status,
                defects: outcome.report().map(|r| r.defects()).unwrap_or_default(),
                failure: failure_of(outcome),
                contributed: contributed.is_some(),
            });
        }

        let discovered = outcomes.len();
        let status = if discovered == 0 {
            FolderStatus::NothingToProcess
        } else if unprocessed > 0 {
            FolderStatus::Cancelled
        } else {
            FolderStatus::Completed
        };

        let (percentage_missing_999, percentage_days_without_registry, mean_annual_total) =
            match self.ratio_convention {
                RatioConvention::Global => (
                    ratio(totals.total_missing_999 as f64, totals.total_data as f64),
                    ratio(totals.days_without_registry as f64, totals.total_days as f64),
                    (totals.year_count > 0)
                        .then(|| totals.annual_total_sum / totals.year_count as f64),
                ),
                RatioConvention::MeanOfFiles => (
                    mean(contributing.iter().map(|s| Some(s.percentage_missing_999))),
                    mean(
                        contributing
                            .iter()
                            .map(|s| s.percentage_days_without_registry()),
                    ),
                    mean(contributing.iter().map(|s| s.mean_annual_total())),
                ),
            };

        let processing_percent = ratio(clean as f64, discovered as f64);

        debug!(
            "Aggregated {} files: {} clean, {} defective, {} failed, {} unprocessed",
            discovered, clean, defective, failed, unprocessed
        );

        FolderSummary {
            folder: folder.to_path_buf(),
            status,
            sentinel: self.sentinel,
            ratio_convention: self.ratio_convention,
            files_discovered: discovered,
            files_clean: clean,
            files_defective: defective,
            files_failed: failed,
            files_unprocessed: unprocessed,
            files_contributing: contributing.len(),
            total_data: totals.total_data,
            total_missing_values: totals.total_missing_values,
            total_non_missing_values: totals.total_non_missing_values,
            total_zeros: totals.total_zeros,
            total_words: totals.total_words,
            total_missing_999: totals.total_missing_999,
            total_days: totals.total_days,
            days_without_registry: totals.days_without_registry,
            percentage_missing_999,
            percentage_days_without_registry,
            processing_percent,
            mean_annual_total,
            files,
        }
    }
}

impl Default for Aggregator {
    fn default() -> Self {
        Self::new()
    }
}

fn failure_of(outcome: &FileOutcome) -> Option<FileFailure> {
    match outcome {
        FileOutcome::Failed { failure, .. } => Some(failure.clone()),
        _ => None,
    }
}

/// Percentage, `None` on an empty denominator.
fn ratio(numerator: f64, denominator: f64) -> Option<f64> {
    (denominator > 0.0).then(|| numerator / denominator * 100.0)
}

fn mean(values: impl Iterator<Item = Option<f64>>) -> Option<f64> {
    let values: Vec<f64> = values.flatten().collect();
    (!values.is_empty()).then(|| values.iter().sum::<f64>() / values.len() as f64)
}
