//! Arrival compensation, late fees and trip settlement.
//!
//! Both lateness directions share one model: a free buffer after the
//! scheduled time, then billing in fixed-minute intervals with a minimum
//! charge once any delay is billable. Driver lateness produces a payout
//! deduction and a parallel promo credit for the customer; customer
//! lateness produces a late fee. Settlement combines the three into the
//! final chargeable price.
//!
//! The driver-side branch clamps the arrival up to the effective service
//! time before measuring, so compensation can never go negative; the promo
//! credit branch instead compares strictly and yields nothing at or below
//! the buffer. The asymmetry is intentional and must not be unified.

use std::time::Instant;

use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::Charges;
use crate::error::{EngineError, EngineResult};
use crate::models::{
    AuditStep, AuditTrace, AuditWarning, CompensationResult, LateFeeResult, SettlementRecord,
    TripSettlement,
};

use super::rounding::round_whole;

/// Parses a client-supplied timestamp.
///
/// Accepts `YYYY-MM-DD HH:MM:SS`, `YYYY-MM-DDTHH:MM:SS`, `YYYY-MM-DD HH:MM`
/// and RFC 3339. Unlike peak classification, settlement needs a full point
/// in time, so failure here is an error the caller decides how to absorb.
pub fn parse_timestamp(raw: &str) -> EngineResult<NaiveDateTime> {
    let raw = raw.trim();

    if let Ok(datetime) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Ok(datetime);
    }
    if let Ok(datetime) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S") {
        return Ok(datetime);
    }
    if let Ok(datetime) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M") {
        return Ok(datetime);
    }
    if let Ok(datetime) = DateTime::parse_from_rfc3339(raw) {
        return Ok(datetime.naive_local());
    }

    Err(EngineError::InvalidInput {
        field: "timestamp".to_string(),
        message: format!("'{}' is not a recognized timestamp", raw),
    })
}

/// Bills a delay in whole intervals.
///
/// Returns the charge, the number of started intervals and the billed
/// minutes. A non-positive delay bills nothing; any positive delay is
/// rounded up to whole intervals and floored at the minimum charge.
fn bill_delay(delay_minutes: i64, charges: &Charges) -> (Decimal, i64, i64) {
    if delay_minutes <= 0 {
        return (Decimal::ZERO, 0, 0);
    }
    let intervals =
        (delay_minutes + charges.interval_minutes - 1) / charges.interval_minutes;
    let amount =
        (Decimal::from(intervals) * charges.charge_per_interval).max(charges.minimum_charge);
    (amount, intervals, intervals * charges.interval_minutes)
}

/// The result of a driver-lateness compensation, including the audit step.
#[derive(Debug, Clone)]
pub struct DriverLatenessResult {
    /// The compensation deducted from the driver payout.
    pub compensation: CompensationResult,
    /// The audit step recording this calculation.
    pub audit_step: AuditStep,
}

/// Computes the deduction from the driver payout for a late arrival.
///
/// The effective service time is the scheduled time plus the free buffer.
/// The arrival is clamped up to that point first, so an early driver
/// measures a zero delay rather than a negative one.
///
/// # Example
///
/// ```
/// use fare_engine::calculation::{calculate_driver_compensation, parse_timestamp};
/// use fare_engine::config::Charges;
/// use rust_decimal::Decimal;
///
/// let charges = Charges {
///     gst_rate: Decimal::new(5, 2),
///     max_price_increase_cap: Decimal::new(50, 2),
///     free_buffer_minutes: 10,
///     interval_minutes: 5,
///     charge_per_interval: Decimal::from(50),
///     minimum_charge: Decimal::from(50),
/// };
/// let scheduled = parse_timestamp("2025-04-01 10:00:00").unwrap();
/// let arrival = parse_timestamp("2025-04-01 10:23:00").unwrap();
///
/// let result = calculate_driver_compensation(scheduled, arrival, &charges, 1);
/// assert_eq!(result.compensation.delay_minutes, 13);
/// assert_eq!(result.compensation.intervals, 3);
/// assert_eq!(result.compensation.compensation, Decimal::from(150));
/// ```
pub fn calculate_driver_compensation(
    scheduled_time: NaiveDateTime,
    driver_arrival: NaiveDateTime,
    charges: &Charges,
    step_number: u32,
) -> DriverLatenessResult {
    let effective_service_time = scheduled_time + Duration::minutes(charges.free_buffer_minutes);
    // Clamp upward so an early arrival cannot produce a negative delay.
    let measured_arrival = driver_arrival.max(effective_service_time);
    let delay_minutes = (measured_arrival - effective_service_time).num_minutes();

    let (compensation, intervals, compensable_minutes) = bill_delay(delay_minutes, charges);
    let result = CompensationResult {
        compensation,
        delay_minutes,
        compensable_minutes,
        intervals,
    };

    let audit_step = AuditStep {
        step_number,
        rule_id: "driver_lateness".to_string(),
        rule_name: "Driver Lateness Compensation".to_string(),
        input: serde_json::json!({
            "scheduled_time": scheduled_time.to_string(),
            "driver_arrival": driver_arrival.to_string(),
            "effective_service_time": effective_service_time.to_string()
        }),
        output: serde_json::json!({
            "delay_minutes": delay_minutes,
            "intervals": intervals,
            "compensation": compensation.to_string()
        }),
        reasoning: if delay_minutes == 0 {
            "Driver arrived within the free buffer; no compensation".to_string()
        } else {
            format!(
                "Driver {} minutes past the buffered service time: {} intervals of {} minutes at {} each, floored at {}",
                delay_minutes,
                intervals,
                charges.interval_minutes,
                charges.charge_per_interval,
                charges.minimum_charge
            )
        },
    };

    DriverLatenessResult {
        compensation: result,
        audit_step,
    }
}

/// The result of a customer promo-credit computation, including the audit step.
#[derive(Debug, Clone)]
pub struct CustomerCreditResult {
    /// The promo credit owed to the customer.
    pub credit: CompensationResult,
    /// The audit step recording this calculation.
    pub audit_step: AuditStep,
}

/// Computes the promo credit owed to the customer for a late driver.
///
/// Runs in parallel with [`calculate_driver_compensation`] from the same
/// arrival time, but compares strictly: an arrival at or before the
/// buffered service time yields no credit. The amount itself uses the
/// identical interval math.
pub fn calculate_customer_credit(
    scheduled_time: NaiveDateTime,
    driver_arrival: NaiveDateTime,
    charges: &Charges,
    step_number: u32,
) -> CustomerCreditResult {
    let effective_service_time = scheduled_time + Duration::minutes(charges.free_buffer_minutes);

    let credit = if driver_arrival <= effective_service_time {
        CompensationResult::none()
    } else {
        let delay_minutes = (driver_arrival - effective_service_time).num_minutes();
        let (compensation, intervals, compensable_minutes) = bill_delay(delay_minutes, charges);
        CompensationResult {
            compensation,
            delay_minutes,
            compensable_minutes,
            intervals,
        }
    };

    let audit_step = AuditStep {
        step_number,
        rule_id: "customer_credit".to_string(),
        rule_name: "Customer Promo Credit".to_string(),
        input: serde_json::json!({
            "scheduled_time": scheduled_time.to_string(),
            "driver_arrival": driver_arrival.to_string(),
            "effective_service_time": effective_service_time.to_string()
        }),
        output: serde_json::json!({
            "delay_minutes": credit.delay_minutes,
            "intervals": credit.intervals,
            "promo_amount": credit.compensation.to_string()
        }),
        reasoning: if credit.compensation.is_zero() {
            "Driver arrived at or before the buffered service time; no promo credit".to_string()
        } else {
            format!(
                "Promo credit of {} for {} minutes of driver lateness",
                credit.compensation, credit.delay_minutes
            )
        },
    };

    CustomerCreditResult { credit, audit_step }
}

/// The result of a customer-lateness late fee, including the audit step.
#[derive(Debug, Clone)]
pub struct CustomerLatenessResult {
    /// The late fee charged to the customer.
    pub late_fee: LateFeeResult,
    /// The audit step recording this calculation.
    pub audit_step: AuditStep,
}

/// Computes the late fee charged to a customer who kept the driver waiting.
///
/// The buffer window runs from the scheduled time to the scheduled time
/// plus the free buffer; lateness is measured from the end of that window
/// with the identical interval math.
pub fn calculate_late_fee(
    scheduled_time: NaiveDateTime,
    customer_arrival: NaiveDateTime,
    charges: &Charges,
    step_number: u32,
) -> CustomerLatenessResult {
    let buffer_end = scheduled_time + Duration::minutes(charges.free_buffer_minutes);

    let late_fee = if customer_arrival <= buffer_end {
        LateFeeResult::none()
    } else {
        let delay_minutes = (customer_arrival - buffer_end).num_minutes();
        let (compensation, intervals, compensable_minutes) = bill_delay(delay_minutes, charges);
        LateFeeResult {
            compensation,
            delay_minutes,
            compensable_minutes,
            intervals,
        }
    };

    let audit_step = AuditStep {
        step_number,
        rule_id: "customer_lateness".to_string(),
        rule_name: "Customer Late Fee".to_string(),
        input: serde_json::json!({
            "scheduled_time": scheduled_time.to_string(),
            "customer_arrival": customer_arrival.to_string(),
            "buffer_end": buffer_end.to_string()
        }),
        output: serde_json::json!({
            "delay_minutes": late_fee.delay_minutes,
            "intervals": late_fee.intervals,
            "late_fee": late_fee.compensation.to_string()
        }),
        reasoning: if late_fee.compensation.is_zero() {
            "Customer arrived within the buffer window; no late fee".to_string()
        } else {
            format!(
                "Late fee of {} for {} minutes past the buffer window",
                late_fee.compensation, late_fee.delay_minutes
            )
        },
    };

    CustomerLatenessResult {
        late_fee,
        audit_step,
    }
}

/// Settles a completed trip from its arrival signals.
///
/// Each timestamp is parsed independently; a branch whose timestamp is
/// missing or unparsable contributes no adjustment and, when unparsable, a
/// warning; one bad timestamp never blocks trip closure. An unreadable
/// scheduled time voids both arrival branches the same way.
///
/// The final price is `max(0, base - driver compensation + late fee)` in
/// whole currency units. The customer promo credit is reported for the
/// promo-issuance flow and does not reduce the charged price.
///
/// # Errors
///
/// * `InvalidInput` - `base_final_price` is zero or negative
///
/// # Example
///
/// ```no_run
/// use fare_engine::calculation::settle_trip;
/// use fare_engine::config::ConfigLoader;
/// use rust_decimal::Decimal;
///
/// let loader = ConfigLoader::load("./config/standard_city")?;
/// let record = settle_trip(
///     Decimal::from(399),
///     "2025-04-01 10:00:00",
///     Some("2025-04-01 10:23:00"),
///     None,
///     loader.schedule().charges(),
/// )?;
/// assert_eq!(record.settlement.final_price, Decimal::from(249));
/// # Ok::<(), fare_engine::error::EngineError>(())
/// ```
pub fn settle_trip(
    base_final_price: Decimal,
    scheduled_time: &str,
    driver_arrival: Option<&str>,
    customer_arrival: Option<&str>,
    charges: &Charges,
) -> EngineResult<SettlementRecord> {
    if base_final_price <= Decimal::ZERO {
        return Err(EngineError::InvalidInput {
            field: "base_final_price".to_string(),
            message: "must be greater than zero".to_string(),
        });
    }

    let started = Instant::now();
    let mut steps: Vec<AuditStep> = Vec::new();
    let mut warnings: Vec<AuditWarning> = Vec::new();

    let scheduled = match parse_timestamp(scheduled_time) {
        Ok(scheduled) => Some(scheduled),
        Err(error) => {
            warn!(error = %error, "Scheduled time unparsable; settling without arrival adjustments");
            warnings.push(AuditWarning {
                code: "UNPARSABLE_SCHEDULED_TIME".to_string(),
                message: format!(
                    "scheduled time '{}' could not be parsed; no arrival adjustments applied",
                    scheduled_time
                ),
                severity: "high".to_string(),
            });
            None
        }
    };

    let mut driver_compensation = CompensationResult::none();
    let mut customer_credit = CompensationResult::none();
    let mut customer_late_fee = LateFeeResult::none();

    if let Some(scheduled) = scheduled {
        if let Some(raw) = driver_arrival {
            match parse_timestamp(raw) {
                Ok(arrival) => {
                    let lateness = calculate_driver_compensation(
                        scheduled,
                        arrival,
                        charges,
                        steps.len() as u32 + 1,
                    );
                    steps.push(lateness.audit_step);
                    driver_compensation = lateness.compensation;

                    let credit = calculate_customer_credit(
                        scheduled,
                        arrival,
                        charges,
                        steps.len() as u32 + 1,
                    );
                    steps.push(credit.audit_step);
                    customer_credit = credit.credit;
                }
                Err(error) => {
                    warn!(error = %error, "Driver arrival unparsable; skipping driver-side adjustments");
                    warnings.push(AuditWarning {
                        code: "UNPARSABLE_DRIVER_ARRIVAL".to_string(),
                        message: format!("driver arrival '{}' could not be parsed", raw),
                        severity: "medium".to_string(),
                    });
                }
            }
        }

        if let Some(raw) = customer_arrival {
            match parse_timestamp(raw) {
                Ok(arrival) => {
                    let lateness =
                        calculate_late_fee(scheduled, arrival, charges, steps.len() as u32 + 1);
                    steps.push(lateness.audit_step);
                    customer_late_fee = lateness.late_fee;
                }
                Err(error) => {
                    warn!(error = %error, "Customer arrival unparsable; skipping late fee");
                    warnings.push(AuditWarning {
                        code: "UNPARSABLE_CUSTOMER_ARRIVAL".to_string(),
                        message: format!("customer arrival '{}' could not be parsed", raw),
                        severity: "medium".to_string(),
                    });
                }
            }
        }
    }

    let final_price = round_whole(
        (base_final_price - driver_compensation.compensation + customer_late_fee.compensation)
            .max(Decimal::ZERO),
    );

    let settlement = TripSettlement {
        base_final_price,
        driver_compensation: driver_compensation.compensation,
        customer_late_fee: customer_late_fee.compensation,
        customer_compensation: customer_credit.compensation,
        final_price,
    };

    steps.push(AuditStep {
        step_number: steps.len() as u32 + 1,
        rule_id: "trip_settlement".to_string(),
        rule_name: "Trip Settlement".to_string(),
        input: serde_json::json!({
            "base_final_price": base_final_price.to_string(),
            "driver_compensation": settlement.driver_compensation.to_string(),
            "customer_late_fee": settlement.customer_late_fee.to_string()
        }),
        output: serde_json::json!({
            "final_price": final_price.to_string(),
            "customer_compensation": settlement.customer_compensation.to_string()
        }),
        reasoning: format!(
            "max(0, {} - {} + {}) = {}",
            base_final_price,
            settlement.driver_compensation,
            settlement.customer_late_fee,
            final_price
        ),
    });

    let record = SettlementRecord {
        settlement_id: Uuid::new_v4(),
        timestamp: Utc::now(),
        engine_version: env!("CARGO_PKG_VERSION").to_string(),
        settlement,
        audit: AuditTrace {
            steps,
            warnings,
            duration_us: started.elapsed().as_micros() as u64,
        },
    };

    info!(
        settlement_id = %record.settlement_id,
        final_price = %record.settlement.final_price,
        "Trip settled"
    );

    Ok(record)
}
