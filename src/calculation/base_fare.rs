//! Base fare calculation.
//!
//! This module turns a fare request into a [`PricingQuote`], branching on
//! service type: tiered distance pricing for city rides (with an open-ended
//! per-km formula beyond the tier table), fixed fares for airport trips, and
//! duration packages for hourly rentals.
//!
//! Base price and GST keep 2 decimal places while the final price is a whole
//! currency unit; finance reconciles on the integer totals.

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

use crate::config::{DistanceTier, FareSchedule};
use crate::error::{EngineError, EngineResult};
use crate::models::{AuditStep, FareRequest, PricingQuote, ServiceType};

use super::peak_hours::is_peak;
use super::rounding::{round_money, round_whole};

/// The result of a base fare calculation, including the audit step.
#[derive(Debug, Clone)]
pub struct BaseFareResult {
    /// The priced quote.
    pub quote: PricingQuote,
    /// The audit step recording this calculation.
    pub audit_step: AuditStep,
}

/// Prices a fare request against a schedule.
///
/// The pickup time is classified as peak or non-peak for the service's
/// window class first; the branch taken then depends on the service type:
///
/// * [`ServiceType::CityRide`] - distance required; tier lookup up to the
///   tier limit, per-km formula beyond it
/// * [`ServiceType::AirportDrop`] / [`ServiceType::AirportPickup`] - fixed
///   price per direction; peak is reported but does not affect the total
/// * [`ServiceType::HourlyRental`] - hours rounded to the nearest whole
///   hour, clamped to the bookable range, and looked up in the package table
///
/// # Errors
///
/// * `InvalidInput` - missing or non-positive distance/hours
/// * `NoPricingTier` - the tier table has a gap (configuration bug)
/// * `NoPricingTableEntry` - no rental package after clamping (defensive;
///   cannot occur on a validated schedule)
///
/// # Example
///
/// ```no_run
/// use fare_engine::calculation::calculate_base_fare;
/// use fare_engine::config::ConfigLoader;
/// use fare_engine::models::{FareRequest, ServiceType};
/// use rust_decimal::Decimal;
///
/// let loader = ConfigLoader::load("./config/standard_city")?;
/// let request = FareRequest {
///     service_type: ServiceType::CityRide,
///     distance_km: Some(Decimal::from(10)),
///     hours: None,
///     pickup_time: "09:00".to_string(),
/// };
/// let result = calculate_base_fare(&request, loader.schedule(), 1)?;
/// assert_eq!(result.quote.final_price, Decimal::from(399));
/// # Ok::<(), fare_engine::error::EngineError>(())
/// ```
pub fn calculate_base_fare(
    request: &FareRequest,
    schedule: &FareSchedule,
    step_number: u32,
) -> EngineResult<BaseFareResult> {
    let peak = is_peak(
        &request.pickup_time,
        request.service_type.service_class(),
        schedule.peak_windows(),
    );

    match request.service_type {
        ServiceType::CityRide => city_ride_fare(request, peak, schedule, step_number),
        ServiceType::AirportDrop | ServiceType::AirportPickup => {
            fixed_fare(request.service_type, peak, schedule, step_number)
        }
        ServiceType::HourlyRental => rental_fare(request, peak, schedule, step_number),
    }
}

/// Looks up the unique tier containing a distance.
///
/// Distances are compared at 0.1 km granularity, matching the tier bounds,
/// so a GPS-derived value like 4.04 km resolves into the adjacent tier
/// instead of falling between two bounds.
fn find_tier(tiers: &[DistanceTier], distance_km: Decimal) -> EngineResult<&DistanceTier> {
    let lookup_km = distance_km.round_dp_with_strategy(
        1,
        rust_decimal::RoundingStrategy::MidpointAwayFromZero,
    );
    tiers
        .iter()
        .find(|tier| lookup_km >= tier.min_km && lookup_km <= tier.max_km)
        .ok_or(EngineError::NoPricingTier {
            distance_km: lookup_km,
        })
}

fn city_ride_fare(
    request: &FareRequest,
    peak: bool,
    schedule: &FareSchedule,
    step_number: u32,
) -> EngineResult<BaseFareResult> {
    let distance_km = request
        .distance_km
        .ok_or_else(|| EngineError::InvalidInput {
            field: "distance_km".to_string(),
            message: "required for city rides".to_string(),
        })?;
    if distance_km <= Decimal::ZERO {
        return Err(EngineError::InvalidInput {
            field: "distance_km".to_string(),
            message: "must be greater than zero".to_string(),
        });
    }

    let fares = schedule.distance_fares();
    let gst_rate = schedule.charges().gst_rate;

    if distance_km <= fares.tier_limit_km {
        let tier = find_tier(&fares.tiers, distance_km)?;
        let base_price = if peak {
            tier.peak_base_price
        } else {
            tier.non_peak_base_price
        };
        let gst_amount = round_money(base_price * gst_rate);
        let final_price = round_whole(base_price + gst_amount);

        let audit_step = AuditStep {
            step_number,
            rule_id: "base_fare_tier".to_string(),
            rule_name: "Distance Tier Lookup".to_string(),
            input: serde_json::json!({
                "service_type": request.service_type.to_string(),
                "distance_km": distance_km.to_string(),
                "pickup_time": request.pickup_time,
                "is_peak": peak
            }),
            output: serde_json::json!({
                "tier_min_km": tier.min_km.to_string(),
                "tier_max_km": tier.max_km.to_string(),
                "base_price": base_price.to_string(),
                "gst_amount": gst_amount.to_string(),
                "final_price": final_price.to_string()
            }),
            reasoning: format!(
                "{} km falls in the {}-{} km tier; {} base {} + GST {} = {}",
                distance_km,
                tier.min_km,
                tier.max_km,
                if peak { "peak" } else { "non-peak" },
                base_price,
                gst_amount,
                final_price
            ),
        };

        return Ok(BaseFareResult {
            quote: PricingQuote {
                service_type: request.service_type,
                distance_km: Some(distance_km),
                hours: None,
                is_peak: peak,
                base_price,
                gst_amount,
                final_price,
            },
            audit_step,
        });
    }

    // Beyond the tier table: distance rounds up to whole kilometres and the
    // per-km total is tax-inclusive. The pre-tax base is backed out by
    // dividing through the GST rate and the tax is the remainder, each
    // rounded to 2 decimals on its own; this matches the published fare
    // table and must not be collapsed into a single rounding.
    let billable_km = distance_km.ceil();
    let (per_km, base_charge) = if peak {
        (fares.beyond_per_km.peak, fares.beyond_base_charge.peak)
    } else {
        (
            fares.beyond_per_km.non_peak,
            fares.beyond_base_charge.non_peak,
        )
    };
    let inclusive_total = billable_km * per_km + base_charge;
    let divisor = Decimal::ONE + gst_rate;
    let base_price = round_money(inclusive_total / divisor);
    let gst_amount = round_money(inclusive_total - inclusive_total / divisor);
    let final_price = round_whole(base_price + gst_amount);

    let audit_step = AuditStep {
        step_number,
        rule_id: "base_fare_beyond_range".to_string(),
        rule_name: "Beyond-Range Distance Pricing".to_string(),
        input: serde_json::json!({
            "service_type": request.service_type.to_string(),
            "distance_km": distance_km.to_string(),
            "billable_km": billable_km.to_string(),
            "pickup_time": request.pickup_time,
            "is_peak": peak
        }),
        output: serde_json::json!({
            "per_km_rate": per_km.to_string(),
            "base_charge": base_charge.to_string(),
            "inclusive_total": inclusive_total.to_string(),
            "base_price": base_price.to_string(),
            "gst_amount": gst_amount.to_string(),
            "final_price": final_price.to_string()
        }),
        reasoning: format!(
            "{} km rounds up to {} km; {} x {} + {} = {} inclusive; base {} + GST {} = {}",
            distance_km,
            billable_km,
            billable_km,
            per_km,
            base_charge,
            inclusive_total,
            base_price,
            gst_amount,
            final_price
        ),
    };

    Ok(BaseFareResult {
        quote: PricingQuote {
            service_type: request.service_type,
            distance_km: Some(distance_km),
            hours: None,
            is_peak: peak,
            base_price,
            gst_amount,
            final_price,
        },
        audit_step,
    })
}

fn fixed_fare(
    service_type: ServiceType,
    peak: bool,
    schedule: &FareSchedule,
    step_number: u32,
) -> EngineResult<BaseFareResult> {
    let fixed = schedule.fixed_fares();
    let inclusive_total = match service_type {
        ServiceType::AirportDrop => fixed.airport_drop,
        ServiceType::AirportPickup => fixed.airport_pickup,
        // calculate_base_fare only routes the airport services here
        _ => unreachable!("fixed_fare called for non-fixed service"),
    };

    let gst_rate = schedule.charges().gst_rate;
    let divisor = Decimal::ONE + gst_rate;
    let base_price = round_money(inclusive_total / divisor);
    let gst_amount = round_money(inclusive_total - inclusive_total / divisor);
    let final_price = round_whole(base_price + gst_amount);

    let audit_step = AuditStep {
        step_number,
        rule_id: "base_fare_fixed".to_string(),
        rule_name: "Fixed Airport Fare".to_string(),
        input: serde_json::json!({
            "service_type": service_type.to_string(),
            "is_peak": peak
        }),
        output: serde_json::json!({
            "inclusive_total": inclusive_total.to_string(),
            "base_price": base_price.to_string(),
            "gst_amount": gst_amount.to_string(),
            "final_price": final_price.to_string()
        }),
        reasoning: format!(
            "Fixed fare {} for {}; peak status reported but does not change the total",
            inclusive_total, service_type
        ),
    };

    Ok(BaseFareResult {
        quote: PricingQuote {
            service_type,
            distance_km: None,
            hours: None,
            is_peak: peak,
            base_price,
            gst_amount,
            final_price,
        },
        audit_step,
    })
}

fn rental_fare(
    request: &FareRequest,
    peak: bool,
    schedule: &FareSchedule,
    step_number: u32,
) -> EngineResult<BaseFareResult> {
    let hours = request.hours.ok_or_else(|| EngineError::InvalidInput {
        field: "hours".to_string(),
        message: "required for hourly rentals".to_string(),
    })?;
    if hours <= Decimal::ZERO {
        return Err(EngineError::InvalidInput {
            field: "hours".to_string(),
            message: "must be greater than zero".to_string(),
        });
    }

    let rental = schedule.rental_fares();
    let rounded = round_whole(hours)
        .to_u32()
        .ok_or_else(|| EngineError::InvalidInput {
            field: "hours".to_string(),
            message: "not a representable whole hour count".to_string(),
        })?;
    let clamped = rounded.clamp(rental.min_hours, rental.max_hours);

    let base_price = *rental.packages.get(&clamped).ok_or_else(|| {
        EngineError::NoPricingTableEntry {
            table: "rental_packages".to_string(),
            key: clamped.to_string(),
        }
    })?;
    let gst_amount = round_money(base_price * schedule.charges().gst_rate);
    let final_price = round_whole(base_price + gst_amount);

    let audit_step = AuditStep {
        step_number,
        rule_id: "base_fare_rental".to_string(),
        rule_name: "Hourly Rental Package".to_string(),
        input: serde_json::json!({
            "service_type": request.service_type.to_string(),
            "requested_hours": hours.to_string(),
            "is_peak": peak
        }),
        output: serde_json::json!({
            "billed_hours": clamped,
            "base_price": base_price.to_string(),
            "gst_amount": gst_amount.to_string(),
            "final_price": final_price.to_string()
        }),
        reasoning: format!(
            "{} hours billed as the {}-hour package; base {} + GST {} = {}",
            hours, clamped, base_price, gst_amount, final_price
        ),
    };

    Ok(BaseFareResult {
        quote: PricingQuote {
            service_type: request.service_type,
            distance_km: None,
            hours: Some(clamped),
            is_peak: peak,
            base_price,
            gst_amount,
            final_price,
        },
        audit_step,
    })
}
