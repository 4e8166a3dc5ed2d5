pub mod aggregator;
pub mod parallel_processor;
pub mod structural_validator;

pub use aggregator::Aggregator;
pub use parallel_processor::{CancellationToken, FileValidation, ParallelProcessor};
pub use structural_validator::{StructuralValidator, ValidatedFile};
