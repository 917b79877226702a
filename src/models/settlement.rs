//! Arrival compensation and trip settlement records.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::AuditTrace;

/// The result of one lateness computation.
///
/// Used for driver-lateness compensation and the parallel customer promo
/// credit; [`LateFeeResult`] is the customer-side counterpart with the same
/// shape.
///
/// # Invariants
///
/// * `compensation == 0` iff `delay_minutes == 0`
/// * otherwise `compensation == max(minimum_charge, intervals * charge_per_interval)`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompensationResult {
    /// The amount charged or credited, whole currency units.
    pub compensation: Decimal,
    /// Whole minutes of billable delay past the free buffer.
    pub delay_minutes: i64,
    /// Minutes actually billed, rounded up to whole intervals.
    pub compensable_minutes: i64,
    /// Number of started billing intervals.
    pub intervals: i64,
}

impl CompensationResult {
    /// A zero result for an arrival inside the free buffer.
    pub fn none() -> Self {
        Self {
            compensation: Decimal::ZERO,
            delay_minutes: 0,
            compensable_minutes: 0,
            intervals: 0,
        }
    }
}

/// The late fee charged to a customer who kept the driver waiting.
///
/// Same interval math as [`CompensationResult`], applied to the customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LateFeeResult {
    /// The fee charged, whole currency units.
    pub compensation: Decimal,
    /// Whole minutes of billable delay past the free buffer.
    pub delay_minutes: i64,
    /// Minutes actually billed, rounded up to whole intervals.
    pub compensable_minutes: i64,
    /// Number of started billing intervals.
    pub intervals: i64,
}

impl LateFeeResult {
    /// A zero result for an arrival inside the free buffer.
    pub fn none() -> Self {
        Self {
            compensation: Decimal::ZERO,
            delay_minutes: 0,
            compensable_minutes: 0,
            intervals: 0,
        }
    }
}

/// The final reconciliation of a trip's price after arrival adjustments.
///
/// Computed once per trip-completion event. The customer compensation is a
/// promo credit minted downstream; it does not reduce the charged price.
///
/// # Invariants
///
/// * `final_price == max(0, base_final_price - driver_compensation + customer_late_fee)`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TripSettlement {
    /// The price the trip would close at before arrival adjustments.
    pub base_final_price: Decimal,
    /// Deduction from the driver payout for late arrival.
    pub driver_compensation: Decimal,
    /// Fee charged to the customer for late arrival.
    pub customer_late_fee: Decimal,
    /// Promo credit owed to the customer for driver lateness.
    pub customer_compensation: Decimal,
    /// The final chargeable price, whole currency units, floored at zero.
    pub final_price: Decimal,
}

/// The persisted settlement aggregate for one trip completion.
///
/// Wraps the [`TripSettlement`] with the identifiers and audit trace the
/// booking service stores alongside it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementRecord {
    /// Unique identifier for this settlement.
    pub settlement_id: Uuid,
    /// When the settlement was computed.
    pub timestamp: DateTime<Utc>,
    /// The version of the engine that computed it.
    pub engine_version: String,
    /// The settlement amounts.
    pub settlement: TripSettlement,
    /// Complete audit trace of settlement decisions.
    pub audit: AuditTrace,
}
