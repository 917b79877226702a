//! Configuration loading and management for the fare engine.
//!
//! This module provides functionality to load fare schedules from YAML files,
//! including schedule metadata, fare tables, peak-hour windows, tolerance
//! bands and charge constants.
//!
//! # Example
//!
//! ```no_run
//! use fare_engine::config::ConfigLoader;
//!
//! let loader = ConfigLoader::load("./config/standard_city").unwrap();
//! println!("Loaded schedule: {}", loader.metadata().name);
//! ```

mod loader;
#[cfg(test)]
pub(crate) mod test_fixtures;
mod types;

pub use loader::ConfigLoader;
pub use types::{
    Charges, DistanceFares, DistanceTier, FareSchedule, FaresConfig, FixedFares, PeakWindow,
    PeakWindows, RatePair, RentalFares, ScheduleMetadata, ToleranceBand, ToleranceBands,
};
