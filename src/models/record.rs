use crate::models::raw_table::Cell;
use serde::{Deserialize, Serialize};

/// One day column of a station-month record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum DayValue {
    Observed(f64),
    /// Cell held the configured missing-value sentinel.
    Sentinel,
    /// Cell was empty or an NA token.
    Missing,
    /// Cell held non-numeric text.
    Text(String),
}

impl DayValue {
    /// Exact comparison against the sentinel, no tolerance.
    pub fn from_cell(cell: &Cell, sentinel: f64) -> Self {
        match cell {
            Cell::Number(v) if *v == sentinel => DayValue::Sentinel,
            Cell::Number(v) => DayValue::Observed(*v),
            Cell::Text(s) => DayValue::Text(s.clone()),
            Cell::Empty => DayValue::Missing,
        }
    }

    pub fn observed(&self) -> Option<f64> {
        match self {
            DayValue::Observed(v) => Some(*v),
            _ => None,
        }
    }
}

/// Validated station-month record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileRecord {
    pub station_id: String,
    pub year: i32,
    pub month: u32,
    pub days: Vec<DayValue>,
    pub line_number: usize,
}

impl FileRecord {
    pub fn observed_values(&self) -> impl Iterator<Item = f64> + '_ {
        self.days.iter().filter_map(DayValue::observed)
    }

    /// True when not a single day column carries an observation.
    pub fn has_no_observation(&self) -> bool {
        self.days.iter().all(|d| d.observed().is_none())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentinel_is_exact() {
        assert_eq!(
            DayValue::from_cell(&Cell::Number(-999.0), -999.0),
            DayValue::Sentinel
        );
        assert_eq!(
            DayValue::from_cell(&Cell::Number(-999.0001), -999.0),
            DayValue::Observed(-999.0001)
        );
        assert_eq!(
            DayValue::from_cell(&Cell::Number(0.0), -999.0),
            DayValue::Observed(0.0)
        );
        assert_eq!(DayValue::from_cell(&Cell::Empty, -999.0), DayValue::Missing);
    }

    #[test]
    fn test_record_without_observations() {
        let record = FileRecord {
            station_id: "S1".to_string(),
            year: 2006,
            month: 1,
            days: vec![DayValue::Sentinel, DayValue::Missing, DayValue::Text("x".into())],
            line_number: 1,
        };
        assert!(record.has_no_observation());
        assert_eq!(record.observed_values().count(), 0);
    }
}
