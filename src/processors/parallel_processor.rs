use crate::analyzers::StatisticsEngine;
use crate::config::AuditConfig;
use crate::error::{ProcessingError, Result};
use crate::models::{FileFailure, FileOutcome, FolderStatus, FolderSummary, ValidationReport};
use crate::processors::{Aggregator, StructuralValidator, ValidatedFile};
use crate::readers::{FileDiscovery, RecordParser};
use crate::utils::progress::ProgressReporter;
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, info_span, warn, Dispatch};

/// Shared stop flag plus an optional deadline. Checked before each file;
/// a file already started always runs to completion.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
    deadline: Option<Instant>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Budget counted from now. Clones share the flag, not the deadline.
    pub fn with_time_budget(mut self, budget: Option<Duration>) -> Self {
        if let Some(budget) = budget {
            self.deadline = Some(Instant::now() + budget);
        }
        self
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
            || self.deadline.map_or(false, |d| Instant::now() >= d)
    }
}

/// Result of validating one file without computing statistics.
#[derive(Debug)]
pub struct FileValidation {
    pub path: PathBuf,
    /// `None` when cancellation stopped the file from being read.
    pub result: Option<Result<ValidationReport>>,
}

impl FileValidation {
    pub fn describe(&self) -> String {
        let name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string());

        match &self.result {
            Some(Ok(report)) if report.is_defective() => {
                let defects: Vec<String> = report.defects().iter().map(|d| d.to_string()).collect();
                format!("⚠️  {}: {}", name, defects.join(", "))
            }
            Some(Ok(report)) => format!("✅ {}: {} rows", name, report.accepted_rows),
            Some(Err(e)) => format!("❌ {}: {}", name, e),
            None => format!("⏸  {}: not processed", name),
        }
    }
}

/// Runs Parse → Validate → Statistics per file on a bounded rayon pool and
/// folds the outcomes into a [`FolderSummary`].
pub struct ParallelProcessor {
    config: AuditConfig,
    parser: RecordParser,
    validator: StructuralValidator,
    engine: StatisticsEngine,
    aggregator: Aggregator,
    cancellation: CancellationToken,
    dispatch: Option<Dispatch>,
}

impl ParallelProcessor {
    pub fn new(config: AuditConfig) -> Self {
        Self {
            parser: RecordParser::new()
                .with_sniff_lines(config.sniff_lines)
                .with_mmap(config.use_mmap),
            validator: StructuralValidator::from_config(&config),
            engine: StatisticsEngine::new(),
            aggregator: Aggregator::from_config(&config),
            cancellation: CancellationToken::new(),
            dispatch: None,
            config,
        }
    }

    pub fn with_cancellation(mut self, cancellation: CancellationToken) -> Self {
        self.cancellation = cancellation;
        self
    }

    /// Route this processor's log events to `dispatch` on every worker thread.
    pub fn with_dispatch(mut self, dispatch: Dispatch) -> Self {
        self.dispatch = Some(dispatch);
        self
    }

    pub fn config(&self) -> &AuditConfig {
        &self.config
    }

    /// Parse and validate one file.
    pub fn validate_file(&self, path: &Path) -> Result<ValidatedFile> {
        let table = self.parser.parse_file(path)?;
        self.validator.validate(&table)
    }

    /// Full chain for one file. Never fails: errors become a
    /// [`FileOutcome::Failed`] carrying their kind.
    pub fn process_file(&self, path: &Path) -> FileOutcome {
        let validated = match self.validate_file(path) {
            Ok(validated) => validated,
            Err(e) => return failed(path, None, e),
        };

        match self.engine.compute(path, &validated.records) {
            Ok(statistics) => {
                let defects = validated.report.defects();
                if defects.is_empty() {
                    debug!("{}: clean", path.display());
                } else {
                    warn!("{}: {:?}", path.display(), defects);
                }
                FileOutcome::Processed {
                    report: validated.report,
                    statistics,
                }
            }
            Err(e) => failed(path, Some(validated.report), e),
        }
    }

    /// Discover, process and aggregate every matching file in `dir_path`.
    pub fn process_folder(
        &self,
        dir_path: &Path,
        progress: Option<&ProgressReporter>,
    ) -> Result<FolderSummary> {
        self.in_dispatch(|| -> Result<FolderSummary> {
            let files = FileDiscovery::new(self.config.file_filter.clone()).discover(dir_path)?;
            info!("Auditing {} files in {}", files.len(), dir_path.display());

            if let Some(p) = progress {
                p.set_length(files.len() as u64);
                p.set_message(&format!("Auditing {} files...", files.len()));
            }

            let outcomes: Vec<FileOutcome> = self
                .run_parallel(&files, progress, |path| self.process_file(path))?
                .into_iter()
                .map(|(path, outcome)| outcome.unwrap_or(FileOutcome::Unprocessed { path }))
                .collect();

            if let Some(p) = progress {
                for outcome in &outcomes {
                    p.println(&outcome.describe());
                }
            }

            let summary = self.aggregator.aggregate(dir_path, outcomes);

            match summary.status {
                FolderStatus::NothingToProcess => {
                    warn!("No matching files in {}", dir_path.display())
                }
                FolderStatus::Cancelled => warn!(
                    "Run cancelled, {} files not processed",
                    summary.files_unprocessed
                ),
                FolderStatus::Completed => info!(
                    "Completed: {} clean, {} with defects, {} failed",
                    summary.files_clean, summary.files_defective, summary.files_failed
                ),
            }

            if let Some(p) = progress {
                p.finish_with_message(&format!("Audited {} files", summary.files_discovered));
            }

            Ok(summary)
        })
    }

    /// Structural validation only, one entry per discovered file in name order.
    pub fn validate_folder(
        &self,
        dir_path: &Path,
        progress: Option<&ProgressReporter>,
    ) -> Result<Vec<FileValidation>> {
        self.in_dispatch(|| -> Result<Vec<FileValidation>> {
            let files = FileDiscovery::new(self.config.file_filter.clone()).discover(dir_path)?;
            info!("Validating {} files in {}", files.len(), dir_path.display());

            if let Some(p) = progress {
                p.set_length(files.len() as u64);
            }

            let validations = self
                .run_parallel(&files, progress, |path| {
                    self.validate_file(path).map(|validated| validated.report)
                })?
                .into_iter()
                .map(|(path, result)| FileValidation { path, result })
                .collect();

            if let Some(p) = progress {
                p.finish_with_message(&format!("Validated {} files", files.len()));
            }

            Ok(validations)
        })
    }

    /// Run `work` for each file on the worker pool. Results travel back over
    /// a channel and are returned in the order of `files`; `None` marks a
    /// file skipped after cancellation.
    fn run_parallel<T, F>(
        &self,
        files: &[PathBuf],
        progress: Option<&ProgressReporter>,
        work: F,
    ) -> Result<Vec<(PathBuf, Option<T>)>>
    where
        T: Send,
        F: Fn(&Path) -> T + Sync,
    {
        let cancellation = self
            .cancellation
            .clone()
            .with_time_budget(self.config.time_budget());

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.max_workers)
            .build()
            .map_err(|e| ProcessingError::Config(e.to_string()))?;

        let (tx, rx) = crossbeam::channel::unbounded();
        let finished = AtomicUsize::new(0);

        pool.install(|| {
            files
                .par_iter()
                .enumerate()
                .for_each_with(tx, |tx, (index, path)| {
                    let result = if cancellation.is_cancelled() {
                        None
                    } else {
                        Some(self.in_dispatch(|| {
                            let span = info_span!("file", path = %path.display());
                            let _enter = span.enter();
                            work(path)
                        }))
                    };

                    let count = finished.fetch_add(1, Ordering::Relaxed) + 1;
                    if let Some(p) = progress {
                        p.update(count as u64);
                    }

                    // The receiver lives until every sender is dropped.
                    let _ = tx.send((index, result));
                });
        });

        let mut results: Vec<(usize, Option<T>)> = rx.iter().collect();
        results.sort_by_key(|(index, _)| *index);

        Ok(results
            .into_iter()
            .map(|(index, result)| (files[index].clone(), result))
            .collect())
    }

    fn in_dispatch<R>(&self, f: impl FnOnce() -> R) -> R {
        match &self.dispatch {
            Some(dispatch) => tracing::dispatcher::with_default(dispatch, f),
            None => f(),
        }
    }
}

fn failed(path: &Path, report: Option<ValidationReport>, error: ProcessingError) -> FileOutcome {
    warn!("{}: {}", path.display(), error);
    FileOutcome::Failed {
        path: path.to_path_buf(),
        report,
        failure: FileFailure {
            kind: error.failure_kind(),
            message: error.to_string(),
        },
    }
}
