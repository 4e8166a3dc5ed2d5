use crate::config::{AuditConfig, DefectiveFilePolicy, FileFilter, RatioConvention};
use crate::utils::constants::{DEFAULT_INSPECT_LINES, DEFAULT_OUTPUT_DIR};
use crate::writers::ReportFormat;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "precip-audit")]
#[command(about = "Validate and summarize folders of daily precipitation files")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(short, long, global = true, help = "Enable verbose logging")]
    pub verbose: bool,

    #[arg(long, global = true, help = "Append log output to this file")]
    pub log_file: Option<PathBuf>,

    #[arg(short, long, global = true, help = "TOML configuration file")]
    pub config: Option<PathBuf>,

    #[arg(
        short,
        long,
        global = true,
        help = "No progress bar and no log output on stderr"
    )]
    pub quiet: bool,
}

/// Overrides shared by every subcommand; unset flags keep the loaded config.
#[derive(Args, Debug, Clone, Default)]
pub struct DataArgs {
    #[arg(long, help = "Only files whose name starts with this prefix")]
    pub prefix: Option<String>,

    #[arg(long, help = "Only files whose name ends with this suffix [default: .dat]")]
    pub suffix: Option<String>,

    #[arg(long, help = "Accept every regular file in the folder")]
    pub all_files: bool,

    #[arg(long, allow_negative_numbers = true, help = "Missing-value sentinel [default: -999]")]
    pub sentinel: Option<f64>,

    #[arg(long, help = "Day columns per record [default: 31]")]
    pub day_columns: Option<usize>,

    #[arg(long, help = "Lines sampled for delimiter detection [default: 20]")]
    pub sniff_lines: Option<usize>,

    #[arg(long, help = "Worker threads [default: number of CPUs]")]
    pub max_workers: Option<usize>,

    #[arg(long, help = "Memory-map input files")]
    pub mmap: bool,
}

impl DataArgs {
    pub fn apply(&self, config: &mut AuditConfig) {
        if self.all_files {
            config.file_filter = FileFilter::any();
        }
        if let Some(prefix) = &self.prefix {
            config.file_filter.prefix = Some(prefix.clone());
        }
        if let Some(suffix) = &self.suffix {
            config.file_filter.suffix = Some(suffix.clone());
        }
        if let Some(sentinel) = self.sentinel {
            config.sentinel = sentinel;
        }
        if let Some(day_columns) = self.day_columns {
            config.expected_day_columns = day_columns;
        }
        if let Some(sniff_lines) = self.sniff_lines {
            config.sniff_lines = sniff_lines;
        }
        if let Some(max_workers) = self.max_workers {
            config.max_workers = max_workers;
        }
        if self.mmap {
            config.use_mmap = true;
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Validate every file in a folder and write the folder summary reports
    Audit {
        #[arg(help = "Folder containing the data files")]
        input_dir: PathBuf,

        #[command(flatten)]
        data: DataArgs,

        #[arg(
            short,
            long,
            value_enum,
            value_delimiter = ',',
            default_values_t = [ReportFormat::Text, ReportFormat::Csv],
            help = "Report formats to write"
        )]
        format: Vec<ReportFormat>,

        #[arg(short, long, default_value = DEFAULT_OUTPUT_DIR)]
        output_dir: PathBuf,

        #[arg(long, value_enum, help = "How ratios combine across files [default: global]")]
        ratio_convention: Option<RatioConvention>,

        #[arg(long, help = "Let files with validation defects enter the totals")]
        include_defective: bool,

        #[arg(long, help = "Stop starting new files after this many seconds")]
        time_budget: Option<u64>,
    },

    /// Run the structural checks only and list the findings per file
    Validate {
        #[arg(help = "Folder containing the data files")]
        input_dir: PathBuf,

        #[command(flatten)]
        data: DataArgs,
    },

    /// Show the head, detected layout and yearly statistics of one file
    Inspect {
        #[arg(help = "Data file to inspect")]
        file: PathBuf,

        #[arg(short = 'n', long, default_value_t = DEFAULT_INSPECT_LINES)]
        lines: usize,

        #[command(flatten)]
        data: DataArgs,
    },
}

impl Commands {
    /// Apply subcommand flags on top of the loaded configuration.
    pub fn apply(&self, config: &mut AuditConfig) {
        match self {
            Commands::Audit {
                data,
                ratio_convention,
                include_defective,
                time_budget,
                ..
            } => {
                data.apply(config);
                if let Some(ratio_convention) = ratio_convention {
                    config.ratio_convention = *ratio_convention;
                }
                if *include_defective {
                    config.defective_file_policy = DefectiveFilePolicy::Include;
                }
                if time_budget.is_some() {
                    config.time_budget_secs = *time_budget;
                }
            }
            Commands::Validate { data, .. } | Commands::Inspect { data, .. } => data.apply(config),
        }
    }
}
