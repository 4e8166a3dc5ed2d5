use crate::error::{ProcessingError, Result};
use crate::models::{FolderSummary, MetricUnit};
use crate::writers::{ReportEmitter, ReportFormat};

/// Single-row CSV: metric labels as the header, values below.
/// Undefined values are written as empty fields.
pub struct CsvWriter {
    delimiter: u8,
}

impl CsvWriter {
    pub fn new() -> Self {
        Self { delimiter: b',' }
    }

    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }
}

impl Default for CsvWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportEmitter for CsvWriter {
    fn format(&self) -> ReportFormat {
        ReportFormat::Csv
    }

    fn render(&self, summary: &FolderSummary) -> Result<String> {
        let metrics = summary.metrics();

        let mut writer = csv::WriterBuilder::new()
            .delimiter(self.delimiter)
            .from_writer(Vec::new());

        writer.write_record(metrics.iter().map(|m| m.label.as_str()))?;
        writer.write_record(metrics.iter().map(|m| match (m.unit, m.value) {
            (MetricUnit::Count, Some(v)) => format!("{}", v as u64),
            (MetricUnit::Percent, Some(v)) => format!("{:.4}", v),
            (_, None) => String::new(),
        }))?;

        let bytes = writer
            .into_inner()
            .map_err(|e| ProcessingError::Io(std::io::Error::new(e.error().kind(), e.to_string())))?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::writers::test_support::{empty_summary, sample_summary};

    fn parse(content: &str) -> Vec<Vec<String>> {
        csv::ReaderBuilder::new()
            .has_headers(false)
            .from_reader(content.as_bytes())
            .records()
            .map(|r| r.unwrap().iter().map(str::to_string).collect())
            .collect()
    }

    #[test]
    fn test_single_row_with_header() {
        let content = CsvWriter::new().render(&sample_summary()).unwrap();
        let rows = parse(&content);

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].len(), 9);
        assert_eq!(rows[0][0], "Total data");
        assert_eq!(rows[1][0], "310");
        assert_eq!(rows[1][5], "31");
        assert_eq!(rows[1][6], "10.0000");
    }

    #[test]
    fn test_undefined_values_are_empty() {
        let content = CsvWriter::new().render(&empty_summary()).unwrap();
        let rows = parse(&content);
        assert_eq!(rows[1][0], "0");
        assert_eq!(rows[1][7], "");
    }

    #[test]
    fn test_semicolon_delimiter() {
        let content = CsvWriter::new()
            .with_delimiter(b';')
            .render(&sample_summary())
            .unwrap();
        assert!(content.starts_with("Total data;Total missing values;"));
    }
}
