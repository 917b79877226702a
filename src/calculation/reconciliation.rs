//! Trip-start price reconciliation.
//!
//! This module decides whether, and by how much, a final price may rise
//! above the originally quoted price once the trip-start distance is known.
//! Decreases are always free, overruns inside the tolerance band are free,
//! and overruns beyond it re-price the trip subject to a hard percentage
//! cap. An internal re-pricing failure never propagates: it downgrades the
//! adjustment to a non-charging error status, because under-charging is
//! safer than failing a trip-start call.

use rust_decimal::Decimal;
use tracing::warn;

use crate::config::FareSchedule;
use crate::error::{EngineError, EngineResult};
use crate::models::{
    AdjustmentResult, AdjustmentStatus, AuditStep, FareRequest, ServiceType, ToleranceOutcome,
};

use super::base_fare::{BaseFareResult, calculate_base_fare};
use super::rounding::round_whole;
use super::tolerance::{ToleranceEvaluation, evaluate_tolerance};

/// The result of a price reconciliation, including the audit steps taken.
#[derive(Debug, Clone)]
pub struct PriceReconciliation {
    /// The adjustment record to persist.
    pub adjustment: AdjustmentResult,
    /// The audit steps recording the decision.
    pub audit_steps: Vec<AuditStep>,
}

/// Reconciles a booked price against the distance observed at trip start.
///
/// The decision table is evaluated in order:
///
/// 1. distance decreased - no charge, the customer keeps the shorter route
/// 2. distance unchanged - no charge
/// 3. overrun within the route type's tolerance band - no charge
/// 4. overrun beyond the band - re-price at the observed distance (city
///    rides only; fixed-fare and rental services never re-price), capped at
///    `booking_price * max_price_increase_cap`
///
/// # Errors
///
/// Only caller-supplied bad inputs surface as errors (`InvalidInput`,
/// `InvalidRouteType`). Internal re-pricing failures are absorbed into an
/// [`AdjustmentStatus::Error`] result with the booked price preserved.
///
/// # Example
///
/// ```no_run
/// use fare_engine::calculation::reconcile_price;
/// use fare_engine::config::ConfigLoader;
/// use fare_engine::models::{AdjustmentStatus, ServiceType};
/// use rust_decimal::Decimal;
///
/// let loader = ConfigLoader::load("./config/standard_city")?;
/// let reconciliation = reconcile_price(
///     Decimal::from(20),
///     Decimal::from(24),
///     Decimal::from(499),
///     "12:30",
///     "fastest",
///     ServiceType::CityRide,
///     loader.schedule(),
/// )?;
/// assert_eq!(reconciliation.adjustment.status, AdjustmentStatus::Ok);
/// # Ok::<(), fare_engine::error::EngineError>(())
/// ```
pub fn reconcile_price(
    booking_distance_km: Decimal,
    trip_start_distance_km: Decimal,
    booking_price: Decimal,
    pickup_time: &str,
    route_type: &str,
    service_type: ServiceType,
    schedule: &FareSchedule,
) -> EngineResult<PriceReconciliation> {
    if booking_price <= Decimal::ZERO {
        return Err(EngineError::InvalidInput {
            field: "booking_price".to_string(),
            message: "must be greater than zero".to_string(),
        });
    }

    let evaluation = evaluate_tolerance(
        booking_distance_km,
        trip_start_distance_km,
        route_type,
        schedule.tolerance_bands(),
        1,
    )?;
    let mut audit_steps = vec![evaluation.audit_step.clone()];

    let adjustment = match evaluation.outcome {
        ToleranceOutcome::Decrease => no_charge_adjustment(
            &evaluation,
            booking_distance_km,
            trip_start_distance_km,
            service_type,
            booking_price,
            AdjustmentStatus::Ok,
            format!(
                "Observed distance is {} km below the booking; no charge, the customer benefits from the shorter route",
                -evaluation.distance_change_km
            ),
        ),
        ToleranceOutcome::Unchanged => no_charge_adjustment(
            &evaluation,
            booking_distance_km,
            trip_start_distance_km,
            service_type,
            booking_price,
            AdjustmentStatus::Ok,
            "Observed distance matches the booking; no charge".to_string(),
        ),
        ToleranceOutcome::WithinTolerance => no_charge_adjustment(
            &evaluation,
            booking_distance_km,
            trip_start_distance_km,
            service_type,
            booking_price,
            AdjustmentStatus::Ok,
            format!(
                "Change of {}% is within the {}% tolerance for the {} route; no charge",
                evaluation.percentage_change, evaluation.tolerance_percent, evaluation.route_type
            ),
        ),
        ToleranceOutcome::Overrun => {
            if service_type == ServiceType::CityRide {
                let reprice = calculate_base_fare(
                    &FareRequest {
                        service_type,
                        distance_km: Some(trip_start_distance_km),
                        hours: None,
                        pickup_time: pickup_time.to_string(),
                    },
                    schedule,
                    2,
                );
                overrun_adjustment(
                    &evaluation,
                    booking_distance_km,
                    trip_start_distance_km,
                    booking_price,
                    reprice,
                    schedule.charges().max_price_increase_cap,
                    &mut audit_steps,
                )
            } else {
                no_charge_adjustment(
                    &evaluation,
                    booking_distance_km,
                    trip_start_distance_km,
                    service_type,
                    booking_price,
                    AdjustmentStatus::Ok,
                    format!(
                        "Distance overrun does not change the price; {} uses fixed pricing",
                        service_type
                    ),
                )
            }
        }
    };

    let decision_step = AuditStep {
        step_number: audit_steps.len() as u32 + 1,
        rule_id: "price_reconciliation".to_string(),
        rule_name: "Trip-Start Price Reconciliation".to_string(),
        input: serde_json::json!({
            "booking_price": adjustment.booking_price.to_string(),
            "outcome": adjustment.result.to_string(),
            "service_type": service_type.to_string()
        }),
        output: serde_json::json!({
            "trip_start_price": adjustment.trip_start_price.to_string(),
            "additional_charge": adjustment.additional_charge.to_string(),
            "status": adjustment.status
        }),
        reasoning: adjustment.reason.clone(),
    };
    audit_steps.push(decision_step);

    Ok(PriceReconciliation {
        adjustment,
        audit_steps,
    })
}

/// Builds a non-charging adjustment from a tolerance evaluation.
#[allow(clippy::too_many_arguments)]
fn no_charge_adjustment(
    evaluation: &ToleranceEvaluation,
    booking_distance_km: Decimal,
    trip_start_distance_km: Decimal,
    service_type: ServiceType,
    booking_price: Decimal,
    status: AdjustmentStatus,
    reason: String,
) -> AdjustmentResult {
    AdjustmentResult {
        booking_distance_km,
        trip_start_distance_km,
        distance_change_km: evaluation.distance_change_km,
        percentage_change: evaluation.percentage_change,
        route_type: evaluation.route_type,
        tolerance_percent: evaluation.tolerance_percent,
        service_type,
        booking_price,
        trip_start_price: booking_price,
        additional_charge: Decimal::ZERO,
        within_tolerance: evaluation.within_tolerance,
        result: evaluation.outcome,
        status,
        reason,
    }
}

/// Applies a re-priced fare to an out-of-tolerance overrun.
///
/// A failed re-pricing is absorbed here: the booked price is preserved and
/// the result is marked [`AdjustmentStatus::Error`] so the caller can flag
/// the booking without charging more.
#[allow(clippy::too_many_arguments)]
fn overrun_adjustment(
    evaluation: &ToleranceEvaluation,
    booking_distance_km: Decimal,
    trip_start_distance_km: Decimal,
    booking_price: Decimal,
    reprice: EngineResult<BaseFareResult>,
    max_price_increase_cap: Decimal,
    audit_steps: &mut Vec<AuditStep>,
) -> AdjustmentResult {
    let build = |status, trip_start_price, additional_charge, reason: String| AdjustmentResult {
        booking_distance_km,
        trip_start_distance_km,
        distance_change_km: evaluation.distance_change_km,
        percentage_change: evaluation.percentage_change,
        route_type: evaluation.route_type,
        tolerance_percent: evaluation.tolerance_percent,
        service_type: ServiceType::CityRide,
        booking_price,
        trip_start_price,
        additional_charge,
        within_tolerance: evaluation.within_tolerance,
        result: evaluation.outcome,
        status,
        reason,
    };

    match reprice {
        Ok(repriced) => {
            audit_steps.push(repriced.audit_step.clone());
            let new_price = repriced.quote.final_price;
            let price_difference = new_price - booking_price;

            if price_difference <= Decimal::ZERO {
                return build(
                    AdjustmentStatus::Ok,
                    booking_price,
                    Decimal::ZERO,
                    format!(
                        "Re-priced fare {} does not exceed the booked price {}; no charge",
                        new_price, booking_price
                    ),
                );
            }

            let cap_amount = round_whole(booking_price * max_price_increase_cap);
            if price_difference > cap_amount {
                let capped_price = booking_price + cap_amount;
                warn!(
                    booking_price = %booking_price,
                    repriced = %new_price,
                    capped = %capped_price,
                    "Trip-start price increase capped"
                );
                return build(
                    AdjustmentStatus::Warning,
                    capped_price,
                    cap_amount,
                    format!(
                        "Overrun of {}% exceeds the {}% tolerance; re-priced fare {} capped at {} ({}% above the booked price)",
                        evaluation.percentage_change,
                        evaluation.tolerance_percent,
                        new_price,
                        capped_price,
                        max_price_increase_cap * Decimal::ONE_HUNDRED
                    ),
                );
            }

            build(
                AdjustmentStatus::Warning,
                new_price,
                price_difference,
                format!(
                    "Overrun of {}% exceeds the {}% tolerance; re-priced at the observed distance for an additional {}",
                    evaluation.percentage_change, evaluation.tolerance_percent, price_difference
                ),
            )
        }
        Err(error) => {
            warn!(
                error = %error,
                "Re-pricing failed at trip start; preserving booked price"
            );
            build(
                AdjustmentStatus::Error,
                booking_price,
                Decimal::ZERO,
                format!(
                    "Re-pricing failed ({}); booked price preserved without additional charge",
                    error
                ),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_fixtures::test_schedule;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn reconcile_city(
        booking_km: &str,
        trip_start_km: &str,
        booking_price: &str,
        pickup_time: &str,
        route_type: &str,
    ) -> PriceReconciliation {
        reconcile_price(
            dec(booking_km),
            dec(trip_start_km),
            dec(booking_price),
            pickup_time,
            route_type,
            ServiceType::CityRide,
            &test_schedule(),
        )
        .unwrap()
    }

    /// PR-001: a shorter observed route never charges
    #[test]
    fn test_decrease_keeps_booked_price() {
        let result = reconcile_city("20", "15", "499", "12:30", "fastest");
        let adjustment = &result.adjustment;

        assert_eq!(adjustment.status, AdjustmentStatus::Ok);
        assert_eq!(adjustment.result, ToleranceOutcome::Decrease);
        assert_eq!(adjustment.trip_start_price, dec("499"));
        assert_eq!(adjustment.additional_charge, Decimal::ZERO);
        assert!(adjustment.within_tolerance);
        assert!(adjustment.reason.contains("shorter route"));
    }

    /// PR-002: an unchanged distance never charges
    #[test]
    fn test_unchanged_keeps_booked_price() {
        let result = reconcile_city("12", "12", "399", "09:00", "balanced");
        let adjustment = &result.adjustment;

        assert_eq!(adjustment.status, AdjustmentStatus::Ok);
        assert_eq!(adjustment.result, ToleranceOutcome::Unchanged);
        assert_eq!(adjustment.additional_charge, Decimal::ZERO);
    }

    /// PR-003: 20 -> 24 km on fastest (30%) is inside the free zone
    #[test]
    fn test_within_tolerance_is_free() {
        let result = reconcile_city("20", "24", "499", "12:30", "fastest");
        let adjustment = &result.adjustment;

        assert_eq!(adjustment.percentage_change, dec("20.00"));
        assert_eq!(adjustment.status, AdjustmentStatus::Ok);
        assert_eq!(adjustment.result, ToleranceOutcome::WithinTolerance);
        assert_eq!(adjustment.trip_start_price, dec("499"));
        assert_eq!(adjustment.additional_charge, Decimal::ZERO);
    }

    /// PR-004: an overrun beyond tolerance re-prices at the observed distance
    #[test]
    fn test_overrun_reprices_below_cap() {
        // 10 -> 16 km off-peak: re-priced to 399 against a 299 booking;
        // the 100 increase stays under the 150 cap.
        let result = reconcile_city("10", "16", "299", "12:30", "balanced");
        let adjustment = &result.adjustment;

        assert_eq!(adjustment.percentage_change, dec("60.00"));
        assert_eq!(adjustment.status, AdjustmentStatus::Warning);
        assert_eq!(adjustment.result, ToleranceOutcome::Overrun);
        assert_eq!(adjustment.trip_start_price, dec("399"));
        assert_eq!(adjustment.additional_charge, dec("100"));
        assert!(!adjustment.within_tolerance);
    }

    /// PR-005: the increase is clamped at 50% of the booked price
    #[test]
    fn test_overrun_capped_at_half_booked_price() {
        // 10 -> 16 km at peak re-prices to 499; the 200 increase exceeds
        // the cap of round(299 * 0.5) = 150.
        let result = reconcile_city("10", "16", "299", "09:00", "balanced");
        let adjustment = &result.adjustment;

        assert_eq!(adjustment.status, AdjustmentStatus::Warning);
        assert_eq!(adjustment.trip_start_price, dec("449"));
        assert_eq!(adjustment.additional_charge, dec("150"));
        assert!(adjustment.reason.contains("capped"));
    }

    /// PR-006: the cap invariant holds across overruns
    #[test]
    fn test_additional_charge_never_exceeds_cap() {
        let schedule = test_schedule();
        let cap = schedule.charges().max_price_increase_cap;
        for (booking_km, trip_km, price) in [
            ("5", "9", "249"),
            ("10", "16", "299"),
            ("10", "29", "299"),
            ("15", "45", "399"),
        ] {
            let result = reconcile_city(booking_km, trip_km, price, "09:00", "balanced");
            let adjustment = &result.adjustment;
            assert!(
                adjustment.additional_charge <= round_whole(dec(price) * cap),
                "cap exceeded for {} -> {} km",
                booking_km,
                trip_km
            );
            assert_eq!(
                adjustment.trip_start_price,
                adjustment.booking_price + adjustment.additional_charge
            );
        }
    }

    /// PR-007: fixed-fare services never charge for overruns
    #[test]
    fn test_fixed_service_never_charges() {
        let result = reconcile_price(
            dec("10"),
            dec("16"),
            dec("899"),
            "09:00",
            "balanced",
            ServiceType::AirportDrop,
            &test_schedule(),
        )
        .unwrap();
        let adjustment = &result.adjustment;

        assert_eq!(adjustment.status, AdjustmentStatus::Ok);
        assert_eq!(adjustment.result, ToleranceOutcome::Overrun);
        assert_eq!(adjustment.trip_start_price, dec("899"));
        assert_eq!(adjustment.additional_charge, Decimal::ZERO);
        assert!(adjustment.reason.contains("fixed pricing"));
    }

    /// PR-008: rentals are duration-priced and never re-price on distance
    #[test]
    fn test_rental_service_never_charges() {
        let result = reconcile_price(
            dec("10"),
            dec("16"),
            dec("1200"),
            "09:00",
            "balanced",
            ServiceType::HourlyRental,
            &test_schedule(),
        )
        .unwrap();

        assert_eq!(result.adjustment.status, AdjustmentStatus::Ok);
        assert_eq!(result.adjustment.additional_charge, Decimal::ZERO);
    }

    /// PR-009: a re-pricing failure downgrades to ERROR without charging
    #[test]
    fn test_repricing_failure_downgrades_to_error() {
        let schedule = test_schedule();
        let evaluation = evaluate_tolerance(
            dec("10"),
            dec("16"),
            "balanced",
            schedule.tolerance_bands(),
            1,
        )
        .unwrap();
        let mut audit_steps = Vec::new();

        let adjustment = overrun_adjustment(
            &evaluation,
            dec("10"),
            dec("16"),
            dec("299"),
            Err(EngineError::NoPricingTier {
                distance_km: dec("16"),
            }),
            schedule.charges().max_price_increase_cap,
            &mut audit_steps,
        );

        assert_eq!(adjustment.status, AdjustmentStatus::Error);
        assert_eq!(adjustment.trip_start_price, dec("299"));
        assert_eq!(adjustment.additional_charge, Decimal::ZERO);
        assert!(adjustment.reason.contains("Re-pricing failed"));
    }

    /// PR-010: a re-priced fare at or below the booking keeps the booked price
    #[test]
    fn test_reprice_not_above_booking_keeps_price() {
        let schedule = test_schedule();
        let evaluation = evaluate_tolerance(
            dec("10"),
            dec("16"),
            "balanced",
            schedule.tolerance_bands(),
            1,
        )
        .unwrap();
        let mut audit_steps = Vec::new();

        let reprice = calculate_base_fare(
            &FareRequest {
                service_type: ServiceType::CityRide,
                distance_km: Some(dec("16")),
                hours: None,
                pickup_time: "12:30".to_string(),
            },
            &schedule,
            2,
        );
        // Booked at 450, re-priced to 399: the fare went down, not up.
        let adjustment = overrun_adjustment(
            &evaluation,
            dec("10"),
            dec("16"),
            dec("450"),
            reprice,
            schedule.charges().max_price_increase_cap,
            &mut audit_steps,
        );

        assert_eq!(adjustment.status, AdjustmentStatus::Ok);
        assert_eq!(adjustment.trip_start_price, dec("450"));
        assert_eq!(adjustment.additional_charge, Decimal::ZERO);
    }

    /// PR-011: caller-supplied bad inputs surface as errors
    #[test]
    fn test_bad_inputs_surface() {
        let schedule = test_schedule();

        let result = reconcile_price(
            dec("10"),
            dec("16"),
            dec("0"),
            "09:00",
            "balanced",
            ServiceType::CityRide,
            &schedule,
        );
        assert!(matches!(result, Err(EngineError::InvalidInput { .. })));

        let result = reconcile_price(
            dec("10"),
            dec("16"),
            dec("299"),
            "09:00",
            "scenic",
            ServiceType::CityRide,
            &schedule,
        );
        assert!(matches!(result, Err(EngineError::InvalidRouteType { .. })));

        let result = reconcile_price(
            dec("-1"),
            dec("16"),
            dec("299"),
            "09:00",
            "balanced",
            ServiceType::CityRide,
            &schedule,
        );
        assert!(matches!(result, Err(EngineError::InvalidInput { .. })));
    }

    /// PR-012: a malformed pickup time re-prices as non-peak
    #[test]
    fn test_malformed_pickup_time_reprices_non_peak() {
        let result = reconcile_city("10", "16", "299", "whenever", "balanced");
        // Non-peak re-price for 16 km is 399
        assert_eq!(result.adjustment.trip_start_price, dec("399"));
        assert_eq!(result.adjustment.additional_charge, dec("100"));
    }

    /// PR-013: the audit trail records evaluation, re-price and decision
    #[test]
    fn test_audit_steps_cover_the_decision() {
        let result = reconcile_city("10", "16", "299", "12:30", "balanced");
        let rule_ids: Vec<&str> = result
            .audit_steps
            .iter()
            .map(|s| s.rule_id.as_str())
            .collect();

        assert_eq!(
            rule_ids,
            vec!["tolerance_check", "base_fare_tier", "price_reconciliation"]
        );
    }

    /// PR-014: no-charge paths skip the re-pricing step
    #[test]
    fn test_no_charge_paths_skip_reprice() {
        let result = reconcile_city("20", "24", "499", "12:30", "fastest");
        let rule_ids: Vec<&str> = result
            .audit_steps
            .iter()
            .map(|s| s.rule_id.as_str())
            .collect();

        assert_eq!(rule_ids, vec!["tolerance_check", "price_reconciliation"]);
    }

    #[test]
    fn test_warning_only_when_price_rises() {
        for (booking_km, trip_km, price, time, route) in [
            ("20", "15", "499", "12:30", "fastest"),
            ("12", "12", "399", "09:00", "balanced"),
            ("20", "24", "499", "12:30", "fastest"),
            ("10", "16", "299", "12:30", "balanced"),
            ("10", "16", "299", "09:00", "balanced"),
        ] {
            let result = reconcile_city(booking_km, trip_km, price, time, route);
            let adjustment = &result.adjustment;
            if adjustment.trip_start_price > adjustment.booking_price {
                assert_eq!(adjustment.status, AdjustmentStatus::Warning);
            } else {
                assert_ne!(adjustment.status, AdjustmentStatus::Warning);
            }
        }
    }
}
