use crate::error::{ProcessingError, Result};
use crate::models::{DayValue, FileRecord, FileStatistics, YearStatistics};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

#[derive(Default)]
struct YearAccumulator {
    values: Vec<f64>,
}

impl YearAccumulator {
    /// `previous_sum` is the sum of the last earlier year with observations.
    fn finish(self, year: i32, previous_sum: Option<f64>) -> YearStatistics {
        let n = self.values.len();
        let sum: f64 = self.values.iter().sum();
        let mean = (n > 0).then(|| sum / n as f64);

        let std_dev = match mean {
            Some(mean) if n >= 2 => {
                let variance = self
                    .values
                    .iter()
                    .map(|v| (v - mean).powi(2))
                    .sum::<f64>()
                    / (n - 1) as f64;
                Some(variance.sqrt())
            }
            _ => None,
        };

        let change_rate = match previous_sum {
            Some(prev) if n > 0 && prev != 0.0 => Some((sum - prev) / prev * 100.0),
            _ => None,
        };

        YearStatistics {
            year,
            sum,
            mean,
            std_dev,
            days_with_rain: self.values.iter().filter(|v| **v > 0.0).count(),
            observed_days: n,
            change_rate,
        }
    }
}

/// Sentinel-aware descriptive statistics for one file.
pub struct StatisticsEngine;

impl StatisticsEngine {
    pub fn new() -> Self {
        Self
    }

    /// Counters run over day cells only; sentinel cells never enter sums,
    /// means or deviations.
    pub fn compute(&self, source: &Path, records: &[FileRecord]) -> Result<FileStatistics> {
        let total_data: usize = records.iter().map(|r| r.days.len()).sum();
        if records.is_empty() || total_data == 0 {
            return Err(ProcessingError::EmptyInput {
                path: source.to_path_buf(),
            });
        }

        let mut total_missing_values = 0;
        let mut total_zeros = 0;
        let mut total_words = 0;
        let mut total_missing_999 = 0;
        let mut days_without_registry = 0;
        let mut years: BTreeMap<i32, YearAccumulator> = BTreeMap::new();

        for record in records {
            for day in &record.days {
                match day {
                    DayValue::Sentinel => total_missing_999 += 1,
                    DayValue::Missing => total_missing_values += 1,
                    DayValue::Text(_) => total_words += 1,
                    DayValue::Observed(_) => {}
                }
            }

            if record.has_no_observation() {
                days_without_registry += 1;
            }

            let year = years.entry(record.year).or_default();
            for value in record.observed_values() {
                if value == 0.0 {
                    total_zeros += 1;
                }
                year.values.push(value);
            }
        }

        let mut yearly = Vec::with_capacity(years.len());
        let mut previous_sum = None;
        for (year, accumulator) in years {
            let stats = accumulator.finish(year, previous_sum);
            if stats.has_observations() {
                previous_sum = Some(stats.sum);
            }
            yearly.push(stats);
        }

        let (wettest_year, driest_year) = Self::extremes(&yearly);

        let statistics = FileStatistics {
            source: source.to_path_buf(),
            total_data,
            total_missing_values,
            total_non_missing_values: total_data - total_missing_values,
            total_zeros,
            total_words,
            total_missing_999,
            percentage_missing_999: total_missing_999 as f64 / total_data as f64 * 100.0,
            total_days: records.len(),
            days_without_registry,
            yearly,
            wettest_year,
            driest_year,
        };

        debug!(
            "{}: {} cells, {} sentinel, {} years",
            source.display(),
            statistics.total_data,
            statistics.total_missing_999,
            statistics.yearly.len()
        );

        Ok(statistics)
    }

    /// Years are ascending, so strict comparisons keep the earliest on ties.
    /// Years without observations are never extremes.
    fn extremes(yearly: &[YearStatistics]) -> (Option<i32>, Option<i32>) {
        let mut wettest: Option<&YearStatistics> = None;
        let mut driest: Option<&YearStatistics> = None;

        for year in yearly.iter().filter(|y| y.has_observations()) {
            if wettest.map_or(true, |w| year.sum > w.sum) {
                wettest = Some(year);
            }
            if driest.map_or(true, |d| year.sum < d.sum) {
                driest = Some(year);
            }
        }

        (wettest.map(|y| y.year), driest.map(|y| y.year))
    }
}

impl Default for StatisticsEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(year: i32, month: u32, days: Vec<DayValue>) -> FileRecord {
        FileRecord {
            station_id: "S1".to_string(),
            year,
            month,
            days,
            line_number: month as usize,
        }
    }

    fn observed(values: &[f64]) -> Vec<DayValue> {
        values.iter().map(|v| DayValue::Observed(*v)).collect()
    }

    #[test]
    fn test_sentinel_percentage_over_day_cells() {
        // 10 records x 31 days, 31 sentinel cells
        let records: Vec<FileRecord> = (1..=10)
            .map(|m| {
                let mut days = observed(&[1.0; 31]);
                for slot in days.iter_mut().skip((m as usize - 1) * 3).take(3) {
                    *slot = DayValue::Sentinel;
                }
                if m == 10 {
                    days[30] = DayValue::Sentinel;
                }
                record(2006, m, days)
            })
            .collect();

        let stats = StatisticsEngine::new()
            .compute(Path::new("a.dat"), &records)
            .unwrap();

        assert_eq!(stats.total_data, 310);
        assert_eq!(stats.total_missing_999, 31);
        assert!((stats.percentage_missing_999 - 10.0).abs() < 1e-9);
        // sentinel cells are excluded from the sum
        assert_eq!(stats.yearly[0].sum, 279.0);
        assert_eq!(stats.yearly[0].observed_days, 279);
    }

    #[test]
    fn test_counters() {
        let records = vec![
            record(
                2006,
                1,
                vec![
                    DayValue::Observed(0.0),
                    DayValue::Observed(2.5),
                    DayValue::Missing,
                    DayValue::Text("trace".into()),
                ],
            ),
            record(
                2006,
                2,
                vec![
                    DayValue::Sentinel,
                    DayValue::Missing,
                    DayValue::Sentinel,
                    DayValue::Text("x".into()),
                ],
            ),
        ];

        let stats = StatisticsEngine::new()
            .compute(Path::new("a.dat"), &records)
            .unwrap();

        assert_eq!(stats.total_data, 8);
        assert_eq!(stats.total_missing_values, 2);
        assert_eq!(stats.total_non_missing_values, 6);
        assert_eq!(stats.total_zeros, 1);
        assert_eq!(stats.total_words, 2);
        assert_eq!(stats.total_missing_999, 2);
        assert_eq!(stats.total_days, 2);
        assert_eq!(stats.days_without_registry, 1);
        assert_eq!(stats.percentage_days_without_registry(), Some(50.0));
    }

    #[test]
    fn test_year_statistics() {
        let records = vec![
            record(2006, 1, observed(&[2.0, 4.0, 0.0])),
            record(2006, 2, observed(&[4.0, 5.0, 0.0])),
            record(2007, 1, observed(&[10.0, 0.0, 0.0])),
            record(2008, 1, vec![DayValue::Observed(7.0), DayValue::Sentinel]),
        ];

        let stats = StatisticsEngine::new()
            .compute(Path::new("a.dat"), &records)
            .unwrap();

        let y2006 = stats.year(2006).unwrap();
        assert_eq!(y2006.sum, 15.0);
        assert_eq!(y2006.mean, Some(2.5));
        assert_eq!(y2006.days_with_rain, 4);
        assert_eq!(y2006.observed_days, 6);
        // squared deviations from 2.5 sum to 23.5
        let expected_std = (23.5_f64 / 5.0).sqrt();
        assert!((y2006.std_dev.unwrap() - expected_std).abs() < 1e-9);
        assert_eq!(y2006.change_rate, None);

        let y2007 = stats.year(2007).unwrap();
        assert!((y2007.change_rate.unwrap() - (-100.0 / 3.0)).abs() < 1e-9);

        // a single observed value has no sample deviation
        let y2008 = stats.year(2008).unwrap();
        assert_eq!(y2008.std_dev, None);
        assert!((y2008.change_rate.unwrap() - (-30.0)).abs() < 1e-9);

        assert_eq!(stats.wettest_year, Some(2006));
        assert_eq!(stats.driest_year, Some(2008));
        assert_eq!(stats.mean_annual_total(), Some(32.0 / 3.0));
    }

    #[test]
    fn test_change_rate_undefined_after_dry_year() {
        let records = vec![
            record(2006, 1, observed(&[0.0, 0.0])),
            record(2007, 1, observed(&[3.0, 1.0])),
        ];

        let stats = StatisticsEngine::new()
            .compute(Path::new("a.dat"), &records)
            .unwrap();

        assert_eq!(stats.year(2007).unwrap().change_rate, None);
    }

    #[test]
    fn test_ties_resolve_to_earliest_year() {
        let records = vec![
            record(2008, 1, observed(&[5.0])),
            record(2006, 1, observed(&[5.0])),
            record(2007, 1, observed(&[5.0])),
        ];

        let stats = StatisticsEngine::new()
            .compute(Path::new("a.dat"), &records)
            .unwrap();

        let years: Vec<i32> = stats.yearly.iter().map(|y| y.year).collect();
        assert_eq!(years, vec![2006, 2007, 2008]);
        assert_eq!(stats.wettest_year, Some(2006));
        assert_eq!(stats.driest_year, Some(2006));
    }

    #[test]
    fn test_year_without_observations() {
        let records = vec![record(2006, 1, vec![DayValue::Sentinel, DayValue::Missing])];

        let stats = StatisticsEngine::new()
            .compute(Path::new("a.dat"), &records)
            .unwrap();

        let year = &stats.yearly[0];
        assert_eq!(year.sum, 0.0);
        assert_eq!(year.mean, None);
        assert_eq!(year.std_dev, None);
        assert_eq!(stats.days_without_registry, 1);
    }

    #[test]
    fn test_unobserved_year_is_skipped_for_extremes_and_change_rate() {
        let records = vec![
            record(2006, 1, observed(&[5.0, 3.0])),
            record(2007, 1, vec![DayValue::Sentinel, DayValue::Missing]),
            record(2008, 1, observed(&[1.0, 1.0])),
        ];

        let stats = StatisticsEngine::new()
            .compute(Path::new("a.dat"), &records)
            .unwrap();

        assert_eq!(stats.wettest_year, Some(2006));
        assert_eq!(stats.driest_year, Some(2008));
        assert_eq!(stats.year(2007).unwrap().change_rate, None);
        // 2008 is compared with 2006, the last year holding observations
        assert!((stats.year(2008).unwrap().change_rate.unwrap() - (-75.0)).abs() < 1e-9);
        assert_eq!(stats.mean_annual_total(), Some(5.0));
    }

    #[test]
    fn test_all_years_unobserved_have_no_extremes() {
        let records = vec![
            record(2006, 1, vec![DayValue::Sentinel]),
            record(2007, 1, vec![DayValue::Missing]),
        ];

        let stats = StatisticsEngine::new()
            .compute(Path::new("a.dat"), &records)
            .unwrap();

        assert_eq!(stats.wettest_year, None);
        assert_eq!(stats.driest_year, None);
        assert_eq!(stats.mean_annual_total(), None);
    }

    #[test]
    fn test_sentinel_and_missing_cells_leave_zeros_and_sums_alone() {
        let layout = |gap: DayValue| -> Vec<FileRecord> {
            vec![
                record(
                    2006,
                    1,
                    vec![
                        DayValue::Observed(0.0),
                        gap.clone(),
                        DayValue::Observed(4.0),
                        DayValue::Observed(0.0),
                    ],
                ),
                record(2006, 2, vec![gap.clone(), gap.clone(), DayValue::Observed(0.0)]),
                record(2007, 1, vec![DayValue::Observed(2.0), gap]),
            ]
        };

        let engine = StatisticsEngine::new();
        let with_sentinel = engine
            .compute(Path::new("a.dat"), &layout(DayValue::Sentinel))
            .unwrap();
        let with_missing = engine
            .compute(Path::new("a.dat"), &layout(DayValue::Missing))
            .unwrap();

        assert_eq!(with_sentinel.total_zeros, 3);
        assert_eq!(with_sentinel.total_zeros, with_missing.total_zeros);
        assert_eq!(with_sentinel.yearly, with_missing.yearly);
        assert_eq!(with_sentinel.days_without_registry, with_missing.days_without_registry);

        assert_eq!(with_sentinel.total_missing_999, 4);
        assert_eq!(with_sentinel.total_missing_values, 0);
        assert_eq!(with_missing.total_missing_999, 0);
        assert_eq!(with_missing.total_missing_values, 4);
    }

    #[test]
    fn test_empty_input() {
        let err = StatisticsEngine::new()
            .compute(Path::new("a.dat"), &[])
            .unwrap_err();
        assert!(matches!(err, ProcessingError::EmptyInput { .. }));

        let err = StatisticsEngine::new()
            .compute(Path::new("a.dat"), &[record(2006, 1, Vec::new())])
            .unwrap_err();
        assert!(matches!(err, ProcessingError::EmptyInput { .. }));
    }
}
