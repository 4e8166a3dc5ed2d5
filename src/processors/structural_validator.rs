use crate::config::AuditConfig;
use crate::error::{ProcessingError, Result};
use crate::models::{
    AnomalyType, DayValue, DuplicateMonth, FileRecord, MonthCoverage, RawRow, RawTable,
    RowAnomaly, ValidationReport,
};
use crate::utils::constants::{
    DEFAULT_DAY_COLUMNS, DEFAULT_SENTINEL, ID_COLUMNS, MAX_MONTH, MIN_MONTH, MONTH_COLUMN,
    STATION_COLUMN, YEAR_COLUMN,
};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Records that passed the row checks plus the findings for the whole file.
#[derive(Debug, Clone)]
pub struct ValidatedFile {
    pub records: Vec<FileRecord>,
    pub report: ValidationReport,
}

/// Turns a [`RawTable`] into station-month records.
///
/// Column count, month range and month coverage are checked independently;
/// a failing check is recorded in the report and the other checks still run.
pub struct StructuralValidator {
    expected_width: usize,
    sentinel: f64,
}

impl StructuralValidator {
    pub fn new(expected_day_columns: usize, sentinel: f64) -> Self {
        Self {
            expected_width: ID_COLUMNS + expected_day_columns,
            sentinel,
        }
    }

    pub fn from_config(config: &AuditConfig) -> Self {
        Self {
            expected_width: config.expected_width(),
            sentinel: config.sentinel,
        }
    }

    pub fn expected_width(&self) -> usize {
        self.expected_width
    }

    /// Validate a table. Only an uninterpretable shape is an error; every
    /// other problem ends up in the report.
    pub fn validate(&self, table: &RawTable) -> Result<ValidatedFile> {
        if table.column_count() <= ID_COLUMNS {
            return Err(ProcessingError::structural(
                &table.source,
                format!(
                    "{} columns cannot hold identifier, year, month and day values",
                    table.column_count()
                ),
            ));
        }

        let mut anomalies = Vec::new();

        // Column count
        let mut shaped_rows: Vec<&RawRow> = Vec::with_capacity(table.row_count());
        for row in &table.rows {
            if row.width() == self.expected_width {
                shaped_rows.push(row);
            } else {
                anomalies.push(RowAnomaly {
                    line_number: row.line_number,
                    anomaly_type: AnomalyType::ColumnCount {
                        expected: self.expected_width,
                        found: row.width(),
                    },
                    details: format!(
                        "expected {} columns, found {}",
                        self.expected_width,
                        row.width()
                    ),
                    content: row.render(),
                });
            }
        }
        let column_count_consistent = anomalies.is_empty();

        if shaped_rows.is_empty() && !table.is_empty() {
            let widths: BTreeSet<usize> = table.rows.iter().map(RawRow::width).collect();
            return Err(ProcessingError::structural(
                &table.source,
                format!(
                    "no row has the expected {} columns (found widths {:?})",
                    self.expected_width, widths
                ),
            ));
        }

        // Month and year validity
        let mut records = Vec::with_capacity(shaped_rows.len());
        let mut month_values = BTreeSet::new();

        for row in shaped_rows {
            let month_cell = &row.cells[MONTH_COLUMN];
            if let Some(month) = month_cell.as_integer() {
                month_values.insert(month);
            }

            let month = match month_cell.as_integer() {
                Some(m) if (MIN_MONTH as i64..=MAX_MONTH as i64).contains(&m) => m as u32,
                _ => {
                    anomalies.push(RowAnomaly {
                        line_number: row.line_number,
                        anomaly_type: AnomalyType::MonthOutOfRange,
                        details: format!(
                            "month '{}' is outside [{}, {}]",
                            month_cell, MIN_MONTH, MAX_MONTH
                        ),
                        content: row.render(),
                    });
                    continue;
                }
            };

            let year_cell = &row.cells[YEAR_COLUMN];
            let year = match year_cell.as_integer().and_then(|y| i32::try_from(y).ok()) {
                Some(y) => y,
                None => {
                    anomalies.push(RowAnomaly {
                        line_number: row.line_number,
                        anomaly_type: AnomalyType::InvalidYear,
                        details: format!("year '{}' is not an integer", year_cell),
                        content: row.render(),
                    });
                    continue;
                }
            };

            records.push(FileRecord {
                station_id: row.cells[STATION_COLUMN].to_string(),
                year,
                month,
                days: row.cells[ID_COLUMNS..]
                    .iter()
                    .map(|cell| DayValue::from_cell(cell, self.sentinel))
                    .collect(),
                line_number: row.line_number,
            });
        }

        // Month coverage
        let coverage = self.check_coverage(&month_values, &records);
        let months_complete = coverage.is_complete();

        anomalies.sort_by_key(|a| a.line_number);

        let report = ValidationReport {
            source: table.source.clone(),
            detection: table.detection.clone(),
            has_header: table.has_header,
            expected_width: self.expected_width,
            total_rows: table.row_count(),
            accepted_rows: records.len(),
            column_count_consistent,
            months_complete,
            coverage,
            anomalies,
        };

        debug!(
            "{}: {}/{} rows accepted, defects: {:?}",
            table.source.display(),
            report.accepted_rows,
            report.total_rows,
            report.defects()
        );

        Ok(ValidatedFile { records, report })
    }

    /// Distinct months must be exactly 1..=12 and no (station, year) may
    /// repeat a month.
    fn check_coverage(&self, month_values: &BTreeSet<i64>, records: &[FileRecord]) -> MonthCoverage {
        let missing = (MIN_MONTH..=MAX_MONTH)
            .filter(|m| !month_values.contains(&(*m as i64)))
            .collect();
        let extra = month_values
            .iter()
            .copied()
            .filter(|m| !(MIN_MONTH as i64..=MAX_MONTH as i64).contains(m))
            .collect();

        let mut occurrences: BTreeMap<(&str, i32, u32), usize> = BTreeMap::new();
        for record in records {
            *occurrences
                .entry((record.station_id.as_str(), record.year, record.month))
                .or_default() += 1;
        }

        let duplicates = occurrences
            .into_iter()
            .filter(|(_, count)| *count > 1)
            .map(|((station_id, year, month), count)| DuplicateMonth {
                station_id: station_id.to_string(),
                year,
                month,
                occurrences: count,
            })
            .collect();

        MonthCoverage {
            present: month_values.iter().copied().collect(),
            missing,
            extra,
            duplicates,
        }
    }
}

impl Default for StructuralValidator {
    fn default() -> Self {
        Self::new(DEFAULT_DAY_COLUMNS, DEFAULT_SENTINEL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ValidationDefect;
    use crate::readers::RecordParser;
    use std::path::Path;

    const DAYS: usize = 3;

    fn table(lines: &[String]) -> RawTable {
        RecordParser::new()
            .parse_content(Path::new("test.dat"), &lines.join("\n"))
            .unwrap()
    }

    fn line(month: &str, days: &str) -> String {
        format!("S1 2006 {} {}", month, days)
    }

    fn full_year() -> Vec<String> {
        (1..=12).map(|m| line(&m.to_string(), "0.0 1.5 -999")).collect()
    }

    #[test]
    fn test_well_formed_file_is_clean() {
        let validator = StructuralValidator::new(DAYS, -999.0);
        let validated = validator.validate(&table(&full_year())).unwrap();

        assert_eq!(validated.records.len(), 12);
        assert!(validated.report.column_count_consistent);
        assert!(validated.report.months_complete);
        assert!(!validated.report.is_defective());
        assert_eq!(validated.records[0].days[2], DayValue::Sentinel);
        assert_eq!(validated.records[0].days[0], DayValue::Observed(0.0));
    }

    #[test]
    fn test_short_row_flags_inconsistent_column_count() {
        let mut lines = full_year();
        lines[4] = line("5", "0.0 1.5");

        let validator = StructuralValidator::new(DAYS, -999.0);
        let validated = validator.validate(&table(&lines)).unwrap();
        let report = &validated.report;

        assert!(!report.column_count_consistent);
        assert!(report
            .defects()
            .contains(&ValidationDefect::InconsistentColumnCount));
        assert_eq!(report.column_count_anomalies().count(), 1);
        assert_eq!(report.anomalies[0].line_number, 5);
        assert_eq!(
            report.anomalies[0].anomaly_type,
            AnomalyType::ColumnCount {
                expected: 6,
                found: 5
            }
        );
        // statistics still get the well-shaped rows, and May is now missing
        assert_eq!(validated.records.len(), 11);
        assert_eq!(report.coverage.missing, vec![5]);
    }

    #[test]
    fn test_duplicate_and_missing_month() {
        let months = ["1", "2", "2", "4", "5", "6", "7", "8", "9", "10", "11", "12"];
        let lines: Vec<String> = months.iter().map(|m| line(m, "1 2 3")).collect();

        let validator = StructuralValidator::new(DAYS, -999.0);
        let report = validator.validate(&table(&lines)).unwrap().report;

        assert!(!report.months_complete);
        assert!(report.defects().contains(&ValidationDefect::MonthSequence));
        assert_eq!(report.coverage.missing, vec![3]);
        assert_eq!(report.coverage.duplicates.len(), 1);
        assert_eq!(report.coverage.duplicates[0].month, 2);
        assert_eq!(report.coverage.duplicates[0].occurrences, 2);
    }

    #[test]
    fn test_month_out_of_range_is_reported_with_content() {
        let mut lines = full_year();
        lines.push(line("13", "9 9 9"));

        let validator = StructuralValidator::new(DAYS, -999.0);
        let validated = validator.validate(&table(&lines)).unwrap();
        let report = &validated.report;

        assert_eq!(validated.records.len(), 12);
        assert_eq!(report.anomalies.len(), 1);
        assert_eq!(report.anomalies[0].anomaly_type, AnomalyType::MonthOutOfRange);
        assert_eq!(report.anomalies[0].content, "S1 2006 13 9 9 9");
        assert_eq!(report.coverage.extra, vec![13]);
        assert!(report.defects().contains(&ValidationDefect::MonthOutOfRange));
        assert!(report.defects().contains(&ValidationDefect::MonthSequence));
    }

    #[test]
    fn test_non_numeric_month_and_year() {
        let mut lines = full_year();
        lines.push(line("March", "1 1 1"));
        lines.push("S1 200x 6 1 1 1".to_string());

        let validator = StructuralValidator::new(DAYS, -999.0);
        let report = validator.validate(&table(&lines)).unwrap().report;

        let kinds: Vec<AnomalyType> = report.anomalies.iter().map(|a| a.anomaly_type).collect();
        assert_eq!(kinds, vec![AnomalyType::MonthOutOfRange, AnomalyType::InvalidYear]);
        assert_eq!(report.accepted_rows, 12);
        // the malformed year row did not create a duplicate June
        assert!(report.coverage.duplicates.is_empty());
    }

    #[test]
    fn test_multi_year_file_is_complete() {
        let lines: Vec<String> = (2006..=2008)
            .flat_map(|year| (1..=12).map(move |m| format!("S1 {} {} 1 2 3", year, m)))
            .collect();

        let validator = StructuralValidator::new(DAYS, -999.0);
        let report = validator.validate(&table(&lines)).unwrap().report;

        assert!(report.months_complete);
        assert_eq!(report.accepted_rows, 36);
    }

    #[test]
    fn test_no_row_of_expected_width_is_structural() {
        let validator = StructuralValidator::new(31, -999.0);
        let err = validator.validate(&table(&full_year())).unwrap_err();
        assert!(matches!(err, ProcessingError::Structural { .. }));
    }

    #[test]
    fn test_too_few_columns_is_structural() {
        let lines: Vec<String> = (1..=12).map(|m| format!("S1 {}", m)).collect();
        let err = StructuralValidator::default()
            .validate(&table(&lines))
            .unwrap_err();
        assert!(matches!(err, ProcessingError::Structural { .. }));
    }
}
