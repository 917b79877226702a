//! Distance tolerance evaluation.
//!
//! This module compares a booked distance estimate against the distance
//! observed at trip start and classifies the delta against the tolerance
//! band configured for the booking's route type.

use rust_decimal::Decimal;
use std::str::FromStr;

use crate::config::ToleranceBands;
use crate::error::{EngineError, EngineResult};
use crate::models::{AuditStep, RouteType, ToleranceOutcome};

use super::rounding::round_money;

/// The result of a tolerance evaluation, including the audit step.
#[derive(Debug, Clone)]
pub struct ToleranceEvaluation {
    /// Signed distance delta in kilometres.
    pub distance_change_km: Decimal,
    /// Signed percentage change relative to the booked distance, 2 decimals.
    pub percentage_change: Decimal,
    /// The route type the booking was made with.
    pub route_type: RouteType,
    /// The tolerance percentage applied for that route type.
    pub tolerance_percent: Decimal,
    /// Whether the change stayed within tolerance. Decreases always count
    /// as within; how they are priced is the reconciliation engine's call.
    pub within_tolerance: bool,
    /// The discriminated comparison outcome.
    pub outcome: ToleranceOutcome,
    /// The audit step recording this evaluation.
    pub audit_step: AuditStep,
}

/// Evaluates an observed distance against the booked estimate.
///
/// # Arguments
///
/// * `booking_distance_km` - The distance the booking was priced at
/// * `trip_start_distance_km` - The distance observed at trip start
/// * `route_type` - The route preference, parsed case-insensitively
/// * `bands` - The configured tolerance bands
/// * `step_number` - The step number for audit trail sequencing
///
/// # Errors
///
/// * `InvalidInput` - either distance is zero or negative
/// * `InvalidRouteType` - the route type string is not a known value
///
/// # Example
///
/// ```
/// use fare_engine::calculation::evaluate_tolerance;
/// use fare_engine::config::{ToleranceBand, ToleranceBands};
/// use fare_engine::models::ToleranceOutcome;
/// use rust_decimal::Decimal;
///
/// let band = |percent: i64, mandatory| ToleranceBand {
///     tolerance_percent: Decimal::from(percent),
///     mandatory,
///     reason: String::new(),
/// };
/// let bands = ToleranceBands {
///     fastest: band(30, false),
///     shortest: band(20, true),
///     balanced: band(15, false),
/// };
///
/// let eval = evaluate_tolerance(
///     Decimal::from(20),
///     Decimal::from(24),
///     "fastest",
///     &bands,
///     1,
/// ).unwrap();
/// assert_eq!(eval.outcome, ToleranceOutcome::WithinTolerance);
/// assert_eq!(eval.percentage_change, Decimal::from(20));
/// ```
pub fn evaluate_tolerance(
    booking_distance_km: Decimal,
    trip_start_distance_km: Decimal,
    route_type: &str,
    bands: &ToleranceBands,
    step_number: u32,
) -> EngineResult<ToleranceEvaluation> {
    if booking_distance_km <= Decimal::ZERO {
        return Err(EngineError::InvalidInput {
            field: "booking_distance_km".to_string(),
            message: "must be greater than zero".to_string(),
        });
    }
    if trip_start_distance_km <= Decimal::ZERO {
        return Err(EngineError::InvalidInput {
            field: "trip_start_distance_km".to_string(),
            message: "must be greater than zero".to_string(),
        });
    }

    let route = RouteType::from_str(route_type)?;
    let band = bands.band(route);

    let distance_change_km = trip_start_distance_km - booking_distance_km;
    let percentage_change =
        round_money(distance_change_km / booking_distance_km * Decimal::ONE_HUNDRED);

    // Decrease and increase stay separate branches: a shorter route is
    // always acceptable, a longer one is measured against the band.
    let outcome = if distance_change_km < Decimal::ZERO {
        ToleranceOutcome::Decrease
    } else if distance_change_km == Decimal::ZERO {
        ToleranceOutcome::Unchanged
    } else if percentage_change <= band.tolerance_percent {
        ToleranceOutcome::WithinTolerance
    } else {
        ToleranceOutcome::Overrun
    };
    let within_tolerance = outcome != ToleranceOutcome::Overrun;

    let audit_step = AuditStep {
        step_number,
        rule_id: "tolerance_check".to_string(),
        rule_name: "Distance Tolerance Check".to_string(),
        input: serde_json::json!({
            "booking_distance_km": booking_distance_km.to_string(),
            "trip_start_distance_km": trip_start_distance_km.to_string(),
            "route_type": route.to_string()
        }),
        output: serde_json::json!({
            "distance_change_km": distance_change_km.to_string(),
            "percentage_change": percentage_change.to_string(),
            "tolerance_percent": band.tolerance_percent.to_string(),
            "outcome": outcome.to_string(),
            "within_tolerance": within_tolerance
        }),
        reasoning: format!(
            "{} km booked, {} km observed: {}% change against a {}% band for the {} route ({})",
            booking_distance_km,
            trip_start_distance_km,
            percentage_change,
            band.tolerance_percent,
            route,
            outcome
        ),
    };

    Ok(ToleranceEvaluation {
        distance_change_km,
        percentage_change,
        route_type: route,
        tolerance_percent: band.tolerance_percent,
        within_tolerance,
        outcome,
        audit_step,
    })
}
