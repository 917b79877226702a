//! Error types for the fare engine.
//!
//! This module provides strongly-typed errors using the `thiserror` crate
//! for all error conditions that can occur during pricing, tolerance
//! evaluation and settlement.

use rust_decimal::Decimal;
use thiserror::Error;

/// The main error type for the fare engine.
///
/// All operations in the engine return this error type, making it easy
/// to handle errors consistently throughout the application.
///
/// Variants fall into three classes: configuration errors (`ConfigNotFound`,
/// `ConfigParseError`, `ConfigValidation`, `NoPricingTier`,
/// `NoPricingTableEntry`) are server-side bugs and must propagate; input
/// errors (`InvalidInput`, `InvalidRouteType`) are caller mistakes and are
/// surfaced as client errors.
///
/// # Example
///
/// ```
/// use fare_engine::error::EngineError;
///
/// let error = EngineError::ConfigNotFound {
///     path: "/missing/file.yaml".to_string(),
/// };
/// assert_eq!(error.to_string(), "Configuration file not found: /missing/file.yaml");
/// ```
#[derive(Debug, Error)]
pub enum EngineError {
    /// Configuration file was not found at the specified path.
    #[error("Configuration file not found: {path}")]
    ConfigNotFound {
        /// The path that was not found.
        path: String,
    },

    /// Configuration file could not be parsed.
    #[error("Failed to parse configuration file '{path}': {message}")]
    ConfigParseError {
        /// The path to the file that failed to parse.
        path: String,
        /// A description of the parse error.
        message: String,
    },

    /// A loaded fare schedule failed validation.
    #[error("Invalid fare schedule: {message}")]
    ConfigValidation {
        /// A description of the validation failure.
        message: String,
    },

    /// A caller-supplied value was invalid (non-positive distance or price,
    /// missing required field, malformed date).
    #[error("Invalid input '{field}': {message}")]
    InvalidInput {
        /// The field that was invalid.
        field: String,
        /// A description of what made the field invalid.
        message: String,
    },

    /// No distance tier covers the requested distance.
    ///
    /// The tier table is validated to be contiguous at load time, so this
    /// indicates a gap in an unvalidated table, not a user error.
    #[error("No pricing tier found for distance {distance_km} km")]
    NoPricingTier {
        /// The distance that no tier covered.
        distance_km: Decimal,
    },

    /// A fixed pricing table has no entry for the requested key.
    #[error("No entry in pricing table '{table}' for key '{key}'")]
    NoPricingTableEntry {
        /// The table that was consulted.
        table: String,
        /// The key that had no entry.
        key: String,
    },

    /// The caller supplied an unknown route type.
    #[error("Invalid route type: {value}")]
    InvalidRouteType {
        /// The value that did not match a known route type.
        value: String,
    },
}

/// A type alias for Results that return EngineError.
pub type EngineResult<T> = Result<T, EngineError>;
