pub mod args;
pub mod commands;

pub use args::{Cli, Commands, DataArgs};
pub use commands::run;
