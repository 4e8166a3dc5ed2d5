pub mod constants;
pub mod filename;
pub mod logging;
pub mod progress;

pub use constants::*;
pub use filename::generate_default_report_filename;
pub use logging::LogSettings;
pub use progress::ProgressReporter;
