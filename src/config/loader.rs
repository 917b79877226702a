//! Configuration loading functionality.
//!
//! This module provides the [`ConfigLoader`] type for loading fare
//! schedules from YAML files.

use std::fs;
use std::path::Path;

use tracing::info;

use crate::error::{EngineError, EngineResult};

use super::types::{
    Charges, FareSchedule, FaresConfig, PeakWindows, ScheduleMetadata, ToleranceBands,
};

/// Loads and provides access to a fare schedule.
///
/// The `ConfigLoader` reads YAML configuration files from a schedule
/// directory, validates them, and hands out the resulting [`FareSchedule`].
/// Several loaders may coexist, one per city schedule; nothing is global.
///
/// # Directory Structure
///
/// The configuration directory should have the following structure:
/// ```text
/// config/standard_city/
/// ├── schedule.yaml    # Schedule metadata
/// ├── fares.yaml       # Distance tiers, fixed fares, rental packages
/// ├── peak_hours.yaml  # Peak windows per service class
/// ├── tolerance.yaml   # Tolerance bands per route type
/// └── charges.yaml     # GST, surcharge cap, lateness charges
/// ```
///
/// # Example
///
/// ```no_run
/// use fare_engine::config::ConfigLoader;
///
/// let loader = ConfigLoader::load("./config/standard_city").unwrap();
/// println!("Schedule: {}", loader.metadata().name);
/// println!("GST rate: {}", loader.schedule().charges().gst_rate);
/// ```
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    schedule: FareSchedule,
}

impl ConfigLoader {
    /// Loads a fare schedule from the specified directory.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the schedule directory (e.g., "./config/standard_city")
    ///
    /// # Returns
    ///
    /// Returns a `ConfigLoader` instance on success, or an error if:
    /// - Any required file is missing (`ConfigNotFound`)
    /// - Any file contains invalid YAML (`ConfigParseError`)
    /// - The loaded tables fail validation (`ConfigValidation`)
    ///
    /// # Example
    ///
    /// ```no_run
    /// use fare_engine::config::ConfigLoader;
    ///
    /// let loader = ConfigLoader::load("./config/standard_city")?;
    /// # Ok::<(), fare_engine::error::EngineError>(())
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> EngineResult<Self> {
        let path = path.as_ref();

        let metadata = Self::load_yaml::<ScheduleMetadata>(&path.join("schedule.yaml"))?;
        let fares = Self::load_yaml::<FaresConfig>(&path.join("fares.yaml"))?;
        let peak_windows = Self::load_yaml::<PeakWindows>(&path.join("peak_hours.yaml"))?;
        let tolerance = Self::load_yaml::<ToleranceBands>(&path.join("tolerance.yaml"))?;
        let charges = Self::load_yaml::<Charges>(&path.join("charges.yaml"))?;

        let schedule = FareSchedule::new(metadata, fares, peak_windows, tolerance, charges)?;

        info!(
            code = %schedule.metadata().code,
            city = %schedule.metadata().city,
            version = %schedule.metadata().version,
            "Loaded fare schedule"
        );

        Ok(Self { schedule })
    }

    /// Loads and parses a YAML file.
    fn load_yaml<T: serde::de::DeserializeOwned>(path: &Path) -> EngineResult<T> {
        let path_str = path.display().to_string();

        let content = fs::read_to_string(path).map_err(|_| EngineError::ConfigNotFound {
            path: path_str.clone(),
        })?;

        serde_yaml::from_str(&content).map_err(|e| EngineError::ConfigParseError {
            path: path_str,
            message: e.to_string(),
        })
    }

    /// Returns the loaded fare schedule.
    pub fn schedule(&self) -> &FareSchedule {
        &self.schedule
    }

    /// Returns the schedule metadata.
    pub fn metadata(&self) -> &ScheduleMetadata {
        self.schedule.metadata()
    }
}
