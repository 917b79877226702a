//! Trip Pricing, Tolerance-Adjustment and Arrival-Compensation Engine
//!
//! This crate provides the pricing core of a ride-booking platform: quoting a
//! fare for a proposed trip, deciding whether a distance overrun observed at
//! trip start justifies a surcharge, and settling driver/customer arrival
//! lateness into compensation, late fees and a final chargeable price.

#![warn(missing_docs)]

pub mod calculation;
pub mod config;
pub mod error;
pub mod models;
