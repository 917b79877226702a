//! Service types, fare requests and pricing quotes.
//!
//! This module defines the input and output records of the base fare
//! calculator.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// The bookable service types.
///
/// Each service type prices differently: city rides use the tiered distance
/// table, airport trips are fixed per direction, and rentals use hourly
/// packages.
///
/// # Example
///
/// ```
/// use fare_engine::models::ServiceType;
///
/// let service = ServiceType::CityRide;
/// assert_eq!(serde_json::to_string(&service).unwrap(), "\"city_ride\"");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceType {
    /// Point-to-point city ride priced by distance tier.
    CityRide,
    /// Fixed-fare drop to the airport.
    AirportDrop,
    /// Fixed-fare pickup from the airport.
    AirportPickup,
    /// Hourly rental priced by duration package.
    HourlyRental,
}

impl ServiceType {
    /// Returns the peak-window class this service is judged against.
    pub fn service_class(self) -> ServiceClass {
        match self {
            ServiceType::CityRide | ServiceType::HourlyRental => ServiceClass::City,
            ServiceType::AirportDrop | ServiceType::AirportPickup => ServiceClass::Airport,
        }
    }
}

impl std::fmt::Display for ServiceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ServiceType::CityRide => write!(f, "city_ride"),
            ServiceType::AirportDrop => write!(f, "airport_drop"),
            ServiceType::AirportPickup => write!(f, "airport_pickup"),
            ServiceType::HourlyRental => write!(f, "hourly_rental"),
        }
    }
}

/// The two peak-window classes.
///
/// Peak windows are configured per class rather than per service type; city
/// rides and rentals share one set, airport services the other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceClass {
    /// City rides and hourly rentals.
    City,
    /// Airport drops and pickups.
    Airport,
}

/// A request to price a trip.
///
/// `distance_km` is required for city rides, `hours` for rentals; the fixed
/// airport services need neither. `pickup_time` is the client-supplied
/// free-text time used for peak classification; it is parsed permissively
/// and an unreadable value simply classifies as non-peak.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FareRequest {
    /// The service being priced.
    pub service_type: ServiceType,
    /// Trip distance in kilometres, if distance-priced.
    #[serde(default)]
    pub distance_km: Option<Decimal>,
    /// Rental duration in hours, if duration-priced.
    #[serde(default)]
    pub hours: Option<Decimal>,
    /// Client-supplied pickup time (wall clock or point in time).
    pub pickup_time: String,
}

/// A priced quote for a trip.
///
/// Produced once at booking time and re-derived (never mutated) at trip
/// start if the tolerance is exceeded. Identical inputs always produce an
/// identical quote.
///
/// # Invariants
///
/// * `final_price == round(base_price + gst_amount)` in whole currency units
/// * `base_price`, `gst_amount` and `final_price` are non-negative
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingQuote {
    /// The service this quote is for.
    pub service_type: ServiceType,
    /// The distance the quote was priced at, if distance-priced.
    pub distance_km: Option<Decimal>,
    /// The rental duration the quote was priced at, after rounding and
    /// clamping, if duration-priced.
    pub hours: Option<u32>,
    /// Whether the pickup time fell in a peak window.
    pub is_peak: bool,
    /// Pre-tax base price, 2 decimal places.
    pub base_price: Decimal,
    /// GST amount, 2 decimal places.
    pub gst_amount: Decimal,
    /// Final chargeable price in whole currency units.
    pub final_price: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_service_type_serialization() {
        assert_eq!(
            serde_json::to_string(&ServiceType::CityRide).unwrap(),
            "\"city_ride\""
        );
        assert_eq!(
            serde_json::to_string(&ServiceType::AirportDrop).unwrap(),
            "\"airport_drop\""
        );
        assert_eq!(
            serde_json::to_string(&ServiceType::AirportPickup).unwrap(),
            "\"airport_pickup\""
        );
        assert_eq!(
            serde_json::to_string(&ServiceType::HourlyRental).unwrap(),
            "\"hourly_rental\""
        );
    }

    #[test]
    fn test_service_type_deserialization() {
        let service: ServiceType = serde_json::from_str("\"hourly_rental\"").unwrap();
        assert_eq!(service, ServiceType::HourlyRental);
    }

    #[test]
    fn test_service_class_mapping() {
        assert_eq!(ServiceType::CityRide.service_class(), ServiceClass::City);
        assert_eq!(ServiceType::HourlyRental.service_class(), ServiceClass::City);
        assert_eq!(
            ServiceType::AirportDrop.service_class(),
            ServiceClass::Airport
        );
        assert_eq!(
            ServiceType::AirportPickup.service_class(),
            ServiceClass::Airport
        );
    }

    #[test]
    fn test_service_type_display() {
        assert_eq!(ServiceType::CityRide.to_string(), "city_ride");
        assert_eq!(ServiceType::AirportPickup.to_string(), "airport_pickup");
    }

    #[test]
    fn test_fare_request_deserialization_defaults() {
        let json = r#"{
            "service_type": "airport_drop",
            "pickup_time": "09:30"
        }"#;

        let request: FareRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.service_type, ServiceType::AirportDrop);
        assert_eq!(request.distance_km, None);
        assert_eq!(request.hours, None);
        assert_eq!(request.pickup_time, "09:30");
    }

    #[test]
    fn test_pricing_quote_serialization_round_trip() {
        let quote = PricingQuote {
            service_type: ServiceType::CityRide,
            distance_km: Some(dec("10")),
            hours: None,
            is_peak: true,
            base_price: dec("380.00"),
            gst_amount: dec("19.00"),
            final_price: dec("399"),
        };

        let json = serde_json::to_string(&quote).unwrap();
        let deserialized: PricingQuote = serde_json::from_str(&json).unwrap();
        assert_eq!(quote, deserialized);
    }

    #[test]
    fn test_pricing_quote_invariant_holds_for_sample() {
        let quote = PricingQuote {
            service_type: ServiceType::CityRide,
            distance_km: Some(dec("10")),
            hours: None,
            is_peak: false,
            base_price: dec("284.76"),
            gst_amount: dec("14.24"),
            final_price: dec("299"),
        };

        assert_eq!(quote.base_price + quote.gst_amount, dec("299.00"));
        assert!(quote.base_price >= Decimal::ZERO);
        assert!(quote.gst_amount >= Decimal::ZERO);
        assert!(quote.final_price >= Decimal::ZERO);
    }
}
