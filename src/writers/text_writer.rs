use crate::error::Result;
use crate::models::{FolderStatus, FolderSummary};
use crate::writers::{ReportEmitter, ReportFormat};

/// One labelled line per metric followed by the files left out of the totals.
pub struct TextWriter;

impl TextWriter {
    pub fn new() -> Self {
        Self
    }
}

impl Default for TextWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportEmitter for TextWriter {
    fn format(&self) -> ReportFormat {
        ReportFormat::Text
    }

    fn render(&self, summary: &FolderSummary) -> Result<String> {
        let mut out = format!("Data summary for {}\n", summary.folder.display());

        if summary.status == FolderStatus::NothingToProcess {
            out.push_str("Nothing to process: no matching files found\n");
            return Ok(out);
        }
        if summary.status == FolderStatus::Cancelled {
            out.push_str(&format!(
                "Run cancelled before {} files were processed\n",
                summary.files_unprocessed
            ));
        }
        out.push('\n');

        for metric in summary.metrics() {
            out.push_str(&format!("{}: {}\n", metric.label, metric.formatted_value()));
        }

        let excluded: Vec<_> = summary.excluded_files().collect();
        out.push_str(&format!("\nFiles with mistakes: {}\n", excluded.len()));
        for entry in excluded {
            out.push_str(&format!("{} - {}\n", entry.path.display(), entry.reason()));
        }

        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::writers::test_support::{empty_summary, sample_summary};

    #[test]
    fn test_render_metrics_and_excluded_files() {
        let text = TextWriter::new().render(&sample_summary()).unwrap();

        assert!(text.contains("Total data: 310\n"));
        assert!(text.contains("Total missing -999 values: 31\n"));
        assert!(text.contains("Percentage of missing -999 values: 10.00%\n"));
        assert!(text.contains("Percentage of processed files: 33.33%\n"));
        assert!(text.contains("Files with mistakes: 2\n"));
        assert!(text.contains("data/b.dat - months not in correct order/complete\n"));
        assert!(text.contains("data/c.dat - parse error: file is empty\n"));
        assert!(!text.contains("a.dat -"));
    }

    #[test]
    fn test_render_nothing_to_process() {
        let text = TextWriter::new().render(&empty_summary()).unwrap();
        assert!(text.contains("Nothing to process"));
        assert!(!text.contains("Total data"));
    }
}
