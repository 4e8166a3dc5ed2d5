use crate::error::{ProcessingError, Result};
use crate::models::{FolderStatus, FolderSummary, MetricUnit};
use crate::writers::{ReportEmitter, ReportFormat};
use plotters::prelude::*;

/// SVG bar chart of the count metrics.
pub struct ChartWriter {
    width: u32,
    height: u32,
}

impl ChartWriter {
    pub fn new() -> Self {
        Self {
            width: 960,
            height: 540,
        }
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }
}

impl Default for ChartWriter {
    fn default() -> Self {
        Self::new()
    }
}

fn chart_error<E: std::fmt::Display>(e: E) -> ProcessingError {
    ProcessingError::Chart(e.to_string())
}

impl ReportEmitter for ChartWriter {
    fn format(&self) -> ReportFormat {
        ReportFormat::Chart
    }

    fn render(&self, summary: &FolderSummary) -> Result<String> {
        let bars: Vec<(String, f64)> = summary
            .metrics()
            .into_iter()
            .filter(|m| m.unit == MetricUnit::Count)
            .filter_map(|m| {
                let label = m.label.trim_start_matches("Total ").to_string();
                m.value.map(|v| (label, v))
            })
            .collect();
        let labels: Vec<String> = bars.iter().map(|(label, _)| label.clone()).collect();

        let y_max = bars.iter().map(|(_, v)| *v).fold(1.0_f64, f64::max) * 1.1;

        let caption = match summary.status {
            FolderStatus::NothingToProcess => {
                format!("Nothing to process: {}", summary.folder.display())
            }
            _ => format!("Data summary: {}", summary.folder.display()),
        };

        let mut svg = String::new();
        {
            let root = SVGBackend::with_string(&mut svg, (self.width, self.height))
                .into_drawing_area();
            root.fill(&WHITE).map_err(chart_error)?;

            let mut chart = ChartBuilder::on(&root)
                .caption(caption, ("sans-serif", 20))
                .margin(20)
                .x_label_area_size(40)
                .y_label_area_size(70)
                .build_cartesian_2d((0..bars.len()).into_segmented(), 0f64..y_max)
                .map_err(chart_error)?;

            chart
                .configure_mesh()
                .disable_x_mesh()
                .x_label_formatter(&|segment| match segment {
                    SegmentValue::CenterOf(i) | SegmentValue::Exact(i) => {
                        labels.get(*i).cloned().unwrap_or_default()
                    }
                    SegmentValue::Last => String::new(),
                })
                .y_desc("cells")
                .draw()
                .map_err(chart_error)?;

            chart
                .draw_series(bars.iter().enumerate().map(|(i, (_, value))| {
                    let mut bar = Rectangle::new(
                        [(SegmentValue::Exact(i), 0.0), (SegmentValue::Exact(i + 1), *value)],
                        BLUE.mix(0.6).filled(),
                    );
                    bar.set_margin(0, 0, 10, 10);
                    bar
                }))
                .map_err(chart_error)?;

            root.present().map_err(chart_error)?;
        }

        Ok(svg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::writers::test_support::{empty_summary, sample_summary};

    #[test]
    fn test_render_svg() {
        let svg = ChartWriter::new().render(&sample_summary()).unwrap();
        assert!(svg.contains("<svg"));
        assert!(svg.contains("Data summary: data"));
        // one bar per count metric
        assert!(svg.matches("<rect").count() >= 6);
    }

    #[test]
    fn test_render_nothing_to_process() {
        let svg = ChartWriter::new()
            .with_size(400, 300)
            .render(&empty_summary())
            .unwrap();
        assert!(svg.contains("Nothing to process"));
    }
}
