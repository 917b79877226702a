//! Calculation logic for the fare engine.
//!
//! This module contains all the calculation functions of the engine:
//! peak-hour classification, base fare calculation across the four service
//! types, distance tolerance evaluation, trip-start price reconciliation,
//! and arrival compensation with trip settlement.

mod base_fare;
mod compensation;
mod peak_hours;
mod reconciliation;
mod rounding;
mod tolerance;

pub use base_fare::{BaseFareResult, calculate_base_fare};
pub use compensation::{
    CustomerCreditResult, CustomerLatenessResult, DriverLatenessResult, calculate_customer_credit,
    calculate_driver_compensation, calculate_late_fee, parse_timestamp, settle_trip,
};
pub use peak_hours::{is_peak, parse_clock_hour};
pub use reconciliation::{PriceReconciliation, reconcile_price};
pub use tolerance::{ToleranceEvaluation, evaluate_tolerance};
