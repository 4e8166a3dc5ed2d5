//! Run configuration.
//!
//! Values are layered: built-in defaults, then an optional TOML file, then
//! `PRECIP_AUDIT__*` environment variables. CLI flags are applied last by the
//! command layer.

use crate::error::{ProcessingError, Result};
use crate::utils::constants::{
    DEFAULT_DAY_COLUMNS, DEFAULT_FILE_SUFFIX, DEFAULT_SENTINEL, DEFAULT_SNIFF_LINES, ENV_PREFIX,
    ID_COLUMNS, MAX_DAY_COLUMNS,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::debug;
use validator::Validate;

/// How non-additive ratios are combined across files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum RatioConvention {
    /// Summed numerators over summed denominators.
    #[default]
    Global,
    /// Arithmetic mean of the per-file ratios.
    MeanOfFiles,
}

impl RatioConvention {
    pub fn name(&self) -> &'static str {
        match self {
            RatioConvention::Global => "global",
            RatioConvention::MeanOfFiles => "mean of files",
        }
    }
}

/// Whether statistics of files with validation defects enter the folder totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum DefectiveFilePolicy {
    #[default]
    Exclude,
    Include,
}

impl DefectiveFilePolicy {
    pub fn includes_defective(self) -> bool {
        self == DefectiveFilePolicy::Include
    }
}

/// Prefix/suffix file selection. Both must match when both are set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileFilter {
    pub prefix: Option<String>,
    pub suffix: Option<String>,
}

impl Default for FileFilter {
    fn default() -> Self {
        Self {
            prefix: None,
            suffix: Some(DEFAULT_FILE_SUFFIX.to_string()),
        }
    }
}

impl FileFilter {
    pub fn any() -> Self {
        Self {
            prefix: None,
            suffix: None,
        }
    }

    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: Some(prefix.into()),
            suffix: None,
        }
    }

    pub fn with_suffix(suffix: impl Into<String>) -> Self {
        Self {
            prefix: None,
            suffix: Some(suffix.into()),
        }
    }

    pub fn matches(&self, file_name: &str) -> bool {
        let prefix_ok = self
            .prefix
            .as_deref()
            .map_or(true, |p| p.is_empty() || file_name.starts_with(p));
        let suffix_ok = self
            .suffix
            .as_deref()
            .map_or(true, |s| s.is_empty() || file_name.ends_with(s));
        prefix_ok && suffix_ok
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct AuditConfig {
    #[validate(range(min = -1.0e12, max = 1.0e12))]
    pub sentinel: f64,

    #[validate(range(min = 1, max = 31))]
    pub expected_day_columns: usize,

    pub file_filter: FileFilter,

    pub ratio_convention: RatioConvention,

    pub defective_file_policy: DefectiveFilePolicy,

    #[validate(range(min = 1))]
    pub max_workers: usize,

    #[validate(range(min = 1))]
    pub sniff_lines: usize,

    pub use_mmap: bool,

    pub time_budget_secs: Option<u64>,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            sentinel: DEFAULT_SENTINEL,
            expected_day_columns: DEFAULT_DAY_COLUMNS,
            file_filter: FileFilter::default(),
            ratio_convention: RatioConvention::default(),
            defective_file_policy: DefectiveFilePolicy::default(),
            max_workers: num_cpus::get(),
            sniff_lines: DEFAULT_SNIFF_LINES,
            use_mmap: false,
            time_budget_secs: None,
        }
    }
}

impl AuditConfig {
    /// Load defaults, an optional TOML file and `PRECIP_AUDIT__*` variables.
    pub fn load(config_file: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();

        if let Some(path) = config_file {
            if !path.exists() {
                return Err(ProcessingError::Config(format!(
                    "Config file not found: {}",
                    path.display()
                )));
            }
            debug!("Reading configuration from {}", path.display());
            builder = builder.add_source(config::File::from(path));
        }

        builder = builder.add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let config: AuditConfig = builder.build()?.try_deserialize()?;
        config.check()?;
        Ok(config)
    }

    /// Field rules plus the NaN check the range validator lets through.
    pub fn check(&self) -> Result<()> {
        self.validate()?;
        if self.sentinel.is_nan() {
            return Err(ProcessingError::Config(
                "sentinel must be a finite number".to_string(),
            ));
        }
        Ok(())
    }

    /// Row width every record must have: identifiers plus day columns.
    pub fn expected_width(&self) -> usize {
        ID_COLUMNS + self.expected_day_columns.min(MAX_DAY_COLUMNS)
    }

    pub fn time_budget(&self) -> Option<Duration> {
        self.time_budget_secs.map(Duration::from_secs)
    }
}
