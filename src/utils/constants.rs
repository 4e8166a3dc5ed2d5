/// Record shape
pub const ID_COLUMNS: usize = 3;
pub const STATION_COLUMN: usize = 0;
pub const YEAR_COLUMN: usize = 1;
pub const MONTH_COLUMN: usize = 2;
pub const MAX_DAY_COLUMNS: usize = 31;
pub const DEFAULT_DAY_COLUMNS: usize = 31;

/// Month constraints
pub const MIN_MONTH: u32 = 1;
pub const MAX_MONTH: u32 = 12;

/// Missing-value sentinel
pub const DEFAULT_SENTINEL: f64 = -999.0;

/// Tokens read as an empty cell
pub const MISSING_TOKENS: &[&str] = &["", "NA", "N/A", "NaN", "nan", "null", "NULL"];

/// Parsing defaults
pub const DEFAULT_SNIFF_LINES: usize = 20;
pub const DEFAULT_INSPECT_LINES: usize = 5;
pub const DEFAULT_BUFFER_SIZE: usize = 8192 * 16; // 128KB

/// File selection
pub const DEFAULT_FILE_SUFFIX: &str = ".dat";

/// Report names
pub const REPORT_STEM: &str = "data-summary";
pub const DEFAULT_OUTPUT_DIR: &str = "output";

/// Environment prefix for layered configuration
pub const ENV_PREFIX: &str = "PRECIP_AUDIT";
