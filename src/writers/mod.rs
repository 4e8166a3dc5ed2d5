pub mod chart_writer;
pub mod csv_writer;
pub mod json_writer;
pub mod text_writer;

pub use chart_writer::ChartWriter;
pub use csv_writer::CsvWriter;
pub use json_writer::JsonWriter;
pub use text_writer::TextWriter;

use crate::error::Result;
use crate::models::FolderSummary;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Renders a [`FolderSummary`] into one output format.
pub trait ReportEmitter {
    fn format(&self) -> ReportFormat;

    fn render(&self, summary: &FolderSummary) -> Result<String>;

    fn write(&self, summary: &FolderSummary, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(path, self.render(summary)?)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum ReportFormat {
    Text,
    Csv,
    Json,
    Chart,
}

impl ReportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ReportFormat::Text => "txt",
            ReportFormat::Csv => "csv",
            ReportFormat::Json => "json",
            ReportFormat::Chart => "svg",
        }
    }

    pub fn emitter(&self) -> Box<dyn ReportEmitter> {
        match self {
            ReportFormat::Text => Box::new(TextWriter::new()),
            ReportFormat::Csv => Box::new(CsvWriter::new()),
            ReportFormat::Json => Box::new(JsonWriter::new()),
            ReportFormat::Chart => Box::new(ChartWriter::new()),
        }
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::sample_summary;
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_every_format_writes_a_file() {
        let temp_dir = TempDir::new().unwrap();
        let summary = sample_summary();

        for format in [
            ReportFormat::Text,
            ReportFormat::Csv,
            ReportFormat::Json,
            ReportFormat::Chart,
        ] {
            let path = temp_dir
                .path()
                .join("reports")
                .join(format!("summary.{}", format.extension()));
            let emitter = format.emitter();
            assert_eq!(emitter.format(), format);
            emitter.write(&summary, &path).unwrap();
            assert!(path.exists());
            assert!(std::fs::metadata(&path).unwrap().len() > 0);
        }
    }
}
