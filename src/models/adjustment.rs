//! Route types, tolerance outcomes and the trip-start adjustment record.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::EngineError;

use super::ServiceType;

/// The route preference a booking was made with.
///
/// Parsed case-insensitively from caller-supplied strings; an unknown value
/// is a client error.
///
/// # Example
///
/// ```
/// use fare_engine::models::RouteType;
/// use std::str::FromStr;
///
/// assert_eq!(RouteType::from_str("FASTEST").unwrap(), RouteType::Fastest);
/// assert!(RouteType::from_str("scenic").is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteType {
    /// Route optimized for travel time.
    Fastest,
    /// Route optimized for distance.
    Shortest,
    /// Route trading distance against time.
    Balanced,
}

impl FromStr for RouteType {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "fastest" => Ok(RouteType::Fastest),
            "shortest" => Ok(RouteType::Shortest),
            "balanced" => Ok(RouteType::Balanced),
            _ => Err(EngineError::InvalidRouteType {
                value: s.to_string(),
            }),
        }
    }
}

impl std::fmt::Display for RouteType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RouteType::Fastest => write!(f, "fastest"),
            RouteType::Shortest => write!(f, "shortest"),
            RouteType::Balanced => write!(f, "balanced"),
        }
    }
}

/// How the observed trip-start distance compared to the booked estimate.
///
/// The decrease and increase paths are deliberately separate branches, not
/// a single signed-tolerance formula; a shorter route is always free for
/// the customer while a longer one is judged against the tolerance band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToleranceOutcome {
    /// The observed distance is shorter than booked.
    Decrease,
    /// The observed distance equals the booked distance.
    Unchanged,
    /// The overrun stayed within the route type's tolerance band.
    WithinTolerance,
    /// The overrun exceeded the tolerance band.
    Overrun,
}

impl std::fmt::Display for ToleranceOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ToleranceOutcome::Decrease => write!(f, "decrease"),
            ToleranceOutcome::Unchanged => write!(f, "unchanged"),
            ToleranceOutcome::WithinTolerance => write!(f, "within_tolerance"),
            ToleranceOutcome::Overrun => write!(f, "overrun"),
        }
    }
}

/// The overall status of a trip-start price adjustment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AdjustmentStatus {
    /// No surcharge applies; the booked price stands.
    Ok,
    /// A surcharge applies; the customer must confirm the new price.
    Warning,
    /// Internal re-pricing failed; the booked price is preserved.
    Error,
}

/// The result of reconciling a booked price against the trip-start distance.
///
/// Computed once per trip-start event and persisted by the caller.
///
/// # Invariants
///
/// * `trip_start_price > booking_price` only when `status == Warning`
/// * `additional_charge <= booking_price * max_price_increase_cap`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdjustmentResult {
    /// Distance estimate the booking was priced at.
    pub booking_distance_km: Decimal,
    /// Distance observed at trip start.
    pub trip_start_distance_km: Decimal,
    /// Signed distance delta in kilometres.
    pub distance_change_km: Decimal,
    /// Signed percentage change relative to the booked distance.
    pub percentage_change: Decimal,
    /// The route preference the booking was made with.
    pub route_type: RouteType,
    /// The tolerance percentage applied for that route type.
    pub tolerance_percent: Decimal,
    /// The service the booking is for.
    pub service_type: ServiceType,
    /// The price quoted at booking time, whole currency units.
    pub booking_price: Decimal,
    /// The price applicable from trip start, whole currency units.
    pub trip_start_price: Decimal,
    /// The surcharge over the booked price, whole currency units.
    pub additional_charge: Decimal,
    /// Whether the change stayed within tolerance (decreases count as within).
    pub within_tolerance: bool,
    /// The discriminated comparison outcome.
    pub result: ToleranceOutcome,
    /// Overall adjustment status.
    pub status: AdjustmentStatus,
    /// Human-readable explanation of the decision.
    pub reason: String,
}
