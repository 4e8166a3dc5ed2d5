use crate::analyzers::StatisticsEngine;
use crate::cli::args::{Cli, Commands};
use crate::config::AuditConfig;
use crate::error::Result;
use crate::models::{FolderStatus, FolderSummary};
use crate::processors::{CancellationToken, ParallelProcessor, StructuralValidator};
use crate::readers::RecordParser;
use crate::utils::filename::generate_default_report_filename;
use crate::utils::logging::LogSettings;
use crate::utils::progress::ProgressReporter;
use crate::writers::ReportFormat;
use std::path::{Path, PathBuf};
use tracing::Dispatch;

pub async fn run(cli: Cli) -> Result<()> {
    let dispatch = LogSettings::new(cli.verbose)
        .with_log_file(cli.log_file.as_deref())
        .with_quiet(cli.quiet)
        .build_dispatch()?;

    let mut config = AuditConfig::load(cli.config.as_deref())?;
    cli.command.apply(&mut config);
    config.check()?;

    match cli.command {
        Commands::Audit {
            input_dir,
            format,
            output_dir,
            ..
        } => {
            println!("Auditing precipitation files...");
            println!("Input directory: {}", input_dir.display());
            println!(
                "Sentinel: {}, day columns: {}, workers: {}",
                config.sentinel, config.expected_day_columns, config.max_workers
            );

            let summary = audit_folder(config, input_dir, dispatch, cli.quiet).await?;

            println!("\n{}", summary.summary());

            if summary.is_nothing_to_process() {
                println!("No reports written");
                return Ok(());
            }

            for report_format in format {
                let path = write_report(&summary, report_format, &output_dir)?;
                println!("Wrote {}", path.display());
            }

            if summary.status == FolderStatus::Cancelled {
                println!("⚠️  Run was cancelled; totals cover the files that finished");
            } else {
                println!("Audit complete!");
            }
        }

        Commands::Validate { input_dir, .. } => {
            println!("Validating precipitation files...");
            println!("Input directory: {}", input_dir.display());

            let quiet = cli.quiet;
            let validations = tokio::task::spawn_blocking(move || {
                let progress = if quiet {
                    ProgressReporter::silent()
                } else {
                    ProgressReporter::new(0, "Validating files...", false)
                };
                ParallelProcessor::new(config)
                    .with_dispatch(dispatch)
                    .validate_folder(&input_dir, Some(&progress))
            })
            .await??;

            let mut with_issues = 0;
            for validation in &validations {
                println!("{}", validation.describe());
                match &validation.result {
                    Some(Ok(report)) if report.is_defective() => {
                        with_issues += 1;
                        println!("{}", report.summary());
                    }
                    Some(Ok(_)) => {}
                    _ => with_issues += 1,
                }
            }

            if validations.is_empty() {
                println!("Nothing to process: no matching files found");
            } else if with_issues == 0 {
                println!("✅ All {} files passed validation checks", validations.len());
            } else {
                println!(
                    "⚠️  {} of {} files have validation issues",
                    with_issues,
                    validations.len()
                );
            }
        }

        Commands::Inspect { file, lines, .. } => {
            tracing::dispatcher::with_default(&dispatch, || inspect_file(&config, &file, lines))?;
        }
    }

    Ok(())
}

/// Run the pipeline on a blocking thread; Ctrl-C stops new files from starting.
async fn audit_folder(
    config: AuditConfig,
    input_dir: PathBuf,
    dispatch: Dispatch,
    quiet: bool,
) -> Result<FolderSummary> {
    let cancellation = CancellationToken::new();

    let interrupt = cancellation.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("Interrupt received, finishing files in progress...");
            interrupt.cancel();
        }
    });

    let summary = tokio::task::spawn_blocking(move || {
        let progress = if quiet {
            ProgressReporter::silent()
        } else {
            ProgressReporter::new(0, "Discovering files...", false)
        };
        ParallelProcessor::new(config)
            .with_cancellation(cancellation)
            .with_dispatch(dispatch)
            .process_folder(&input_dir, Some(&progress))
    })
    .await??;

    Ok(summary)
}

fn write_report(
    summary: &FolderSummary,
    report_format: ReportFormat,
    output_dir: &Path,
) -> Result<PathBuf> {
    let path = generate_default_report_filename(output_dir, report_format.extension());
    report_format.emitter().write(summary, &path)?;
    Ok(path)
}

fn inspect_file(config: &AuditConfig, file: &Path, lines: usize) -> Result<()> {
    let parser = RecordParser::new()
        .with_sniff_lines(config.sniff_lines)
        .with_mmap(config.use_mmap);

    println!("Inspecting {}", file.display());
    println!("\nFirst {} lines:", lines);
    for (i, line) in parser.inspect_head(file, lines)?.iter().enumerate() {
        println!("{:>4}: {}", i + 1, line);
    }

    let table = parser.parse_file(file)?;
    println!(
        "\nDelimiter: {}, columns: {}, rows: {}, header: {}",
        table.delimiter(),
        table.column_count(),
        table.row_count(),
        if table.has_header { "yes" } else { "no" }
    );
    if table.has_header {
        println!("Columns: {}", table.columns.join(", "));
    }

    let validated = StructuralValidator::from_config(config).validate(&table)?;
    println!("\n{}", validated.report.summary());

    match StatisticsEngine::new().compute(file, &validated.records) {
        Ok(statistics) => println!("{}", statistics.summary()),
        Err(e) => println!("No statistics: {}", e),
    }

    Ok(())
}
