use crate::utils::constants::REPORT_STEM;
use chrono::{Datelike, Local};
use std::path::{Path, PathBuf};

/// Generate default report filename with format: data-summary-{YYMMDD}.{extension}
pub fn generate_default_report_filename(output_dir: &Path, extension: &str) -> PathBuf {
    let now = Local::now();
    let year = now.year() % 100; // Get last 2 digits of year
    let month = now.month();
    let day = now.day();

    let filename = format!(
        "{}-{:02}{:02}{:02}.{}",
        REPORT_STEM, year, month, day, extension
    );
    output_dir.join(filename)
}
