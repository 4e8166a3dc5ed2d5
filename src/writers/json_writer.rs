use crate::error::Result;
use crate::models::FolderSummary;
use crate::writers::{ReportEmitter, ReportFormat};

pub struct JsonWriter {
    pretty: bool,
}

impl JsonWriter {
    pub fn new() -> Self {
        Self { pretty: true }
    }

    pub fn with_pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }
}

impl Default for JsonWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportEmitter for JsonWriter {
    fn format(&self) -> ReportFormat {
        ReportFormat::Json
    }

    fn render(&self, summary: &FolderSummary) -> Result<String> {
        let json = if self.pretty {
            serde_json::to_string_pretty(summary)?
        } else {
            serde_json::to_string(summary)?
        };
        Ok(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::writers::test_support::{empty_summary, sample_summary};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_summary_survives_json() {
        let summary = sample_summary();
        let json = JsonWriter::new().render(&summary).unwrap();
        let restored: FolderSummary = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, summary);
    }

    #[test]
    fn test_status_and_failure_kind_are_snake_case() {
        let json = JsonWriter::new()
            .with_pretty(false)
            .render(&sample_summary())
            .unwrap();
        assert!(json.contains("\"status\":\"completed\""));
        assert!(json.contains("\"kind\":\"parse\""));
        assert!(json.contains("\"month_sequence\""));

        let json = JsonWriter::new()
            .with_pretty(false)
            .render(&empty_summary())
            .unwrap();
        assert!(json.contains("\"nothing_to_process\""));
        assert!(json.contains("\"processing_percent\":null"));
    }
}
