pub mod file_discovery;
pub mod record_parser;

pub use file_discovery::FileDiscovery;
pub use record_parser::{detect_delimiter, split_line, RecordParser};
