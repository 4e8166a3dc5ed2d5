pub mod statistics_engine;

pub use statistics_engine::StatisticsEngine;
