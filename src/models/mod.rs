pub mod raw_table;
pub mod record;
pub mod statistics;
pub mod summary;
pub mod validation;

pub use raw_table::{Cell, Delimiter, DelimiterDetection, RawRow, RawTable};
pub use record::{DayValue, FileRecord};
pub use statistics::{FileStatistics, YearStatistics};
pub use summary::{
    FileFailure, FileOutcome, FileStatus, FileSummaryEntry, FolderStatus, FolderSummary, Metric,
    MetricUnit,
};
pub use validation::{
    AnomalyType, DuplicateMonth, MonthCoverage, RowAnomaly, ValidationDefect, ValidationReport,
};
