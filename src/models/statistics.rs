use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Per-file counters and year-grouped aggregates. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileStatistics {
    pub source: PathBuf,
    /// Day cells considered (records x day columns).
    pub total_data: usize,
    pub total_missing_values: usize,
    pub total_non_missing_values: usize,
    pub total_zeros: usize,
    pub total_words: usize,
    pub total_missing_999: usize,
    pub percentage_missing_999: f64,
    /// Station-month records.
    pub total_days: usize,
    /// Records with no observed day value.
    pub days_without_registry: usize,
    pub yearly: Vec<YearStatistics>,
    pub wettest_year: Option<i32>,
    pub driest_year: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearStatistics {
    pub year: i32,
    pub sum: f64,
    pub mean: Option<f64>,
    /// Sample standard deviation (n - 1).
    pub std_dev: Option<f64>,
    pub days_with_rain: usize,
    pub observed_days: usize,
    /// Percent change of `sum` against the previous year; `None` when undefined.
    pub change_rate: Option<f64>,
}

impl YearStatistics {
    pub fn has_observations(&self) -> bool {
        self.observed_days > 0
    }
}

impl FileStatistics {
    pub fn percentage_days_without_registry(&self) -> Option<f64> {
        if self.total_days == 0 {
            None
        } else {
            Some(self.days_without_registry as f64 / self.total_days as f64 * 100.0)
        }
    }

    /// Years holding at least one observed value.
    pub fn observed_years(&self) -> impl Iterator<Item = &YearStatistics> + '_ {
        self.yearly.iter().filter(|y| y.has_observations())
    }

    /// Mean of the yearly sums of observed years.
    pub fn mean_annual_total(&self) -> Option<f64> {
        match self.observed_years().count() {
            0 => None,
            n => Some(self.annual_total_sum() / n as f64),
        }
    }

    pub fn annual_total_sum(&self) -> f64 {
        self.observed_years().map(|y| y.sum).sum()
    }

    pub fn year(&self, year: i32) -> Option<&YearStatistics> {
        self.yearly.iter().find(|y| y.year == year)
    }

    pub fn summary(&self) -> String {
        let mut summary = format!(
            "Statistics for {}\n\
             Records: {} ({} without any observation)\n\
             Day cells: {} total, {} missing, {} text, {} zero, {} sentinel ({:.2}%)\n",
            self.source.display(),
            self.total_days,
            self.days_without_registry,
            self.total_data,
            self.total_missing_values,
            self.total_words,
            self.total_zeros,
            self.total_missing_999,
            self.percentage_missing_999
        );

        if let (Some(wettest), Some(driest)) = (self.wettest_year, self.driest_year) {
            summary.push_str(&format!("Wettest year: {}, driest year: {}\n", wettest, driest));
        }

        if !self.yearly.is_empty() {
            summary.push_str(&format!(
                "\n{:>6} {:>10} {:>8} {:>8} {:>6} {:>9}\n",
                "Year", "Sum", "Mean", "StdDev", "Rain", "Change%"
            ));
            for year in &self.yearly {
                summary.push_str(&format!(
                    "{:>6} {:>10.1} {:>8} {:>8} {:>6} {:>9}\n",
                    year.year,
                    year.sum,
                    format_optional(year.mean, 2),
                    format_optional(year.std_dev, 2),
                    year.days_with_rain,
                    format_optional(year.change_rate, 1),
                ));
            }
        }

        summary
    }
}

pub(crate) fn format_optional(value: Option<f64>, precision: usize) -> String {
    match value {
        Some(v) => format!("{:.*}", precision, v),
        None => "n/a".to_string(),
    }
}
