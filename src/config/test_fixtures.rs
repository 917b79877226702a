//! Shared test fixtures building an in-memory fare schedule.
//!
//! Mirrors the shipped `config/standard_city` schedule so unit tests do not
//! depend on files on disk.

use rust_decimal::Decimal;
use std::collections::HashMap;
use std::str::FromStr;

use super::types::{
    Charges, DistanceFares, DistanceTier, FareSchedule, FaresConfig, FixedFares, PeakWindow,
    PeakWindows, RatePair, RentalFares, ScheduleMetadata, ToleranceBand, ToleranceBands,
};

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

/// Metadata matching the shipped standard city schedule.
pub fn test_metadata() -> ScheduleMetadata {
    ScheduleMetadata {
        code: "BLR-STD".to_string(),
        name: "Standard City Fare Schedule".to_string(),
        city: "Bengaluru".to_string(),
        currency: "INR".to_string(),
        version: "2025-04-01".to_string(),
    }
}

fn tier(min: &str, max: &str, peak: &str, non_peak: &str) -> DistanceTier {
    DistanceTier {
        min_km: dec(min),
        max_km: dec(max),
        peak_base_price: dec(peak),
        non_peak_base_price: dec(non_peak),
    }
}

/// The full fares table: 8 distance tiers, beyond-range rates, fixed airport
/// fares and the 2-12 hour rental packages.
pub fn test_fares() -> FaresConfig {
    let tiers = vec![
        tier("0.1", "4", "189.52", "141.90"),
        tier("4.1", "8", "284.76", "237.14"),
        tier("8.1", "12", "380.00", "284.76"),
        tier("12.1", "16", "475.24", "380.00"),
        tier("16.1", "20", "570.48", "475.24"),
        tier("20.1", "24", "665.71", "570.48"),
        tier("24.1", "27", "760.95", "637.14"),
        tier("27.1", "30", "856.19", "713.33"),
    ];

    let packages: HashMap<u32, Decimal> = [
        (2, "1142.86"),
        (3, "1571.43"),
        (4, "2000.00"),
        (5, "2428.57"),
        (6, "2857.14"),
        (7, "3285.71"),
        (8, "3714.29"),
        (9, "4142.86"),
        (10, "4571.43"),
        (11, "5000.00"),
        (12, "5428.57"),
    ]
    .into_iter()
    .map(|(h, p)| (h, dec(p)))
    .collect();

    FaresConfig {
        distance: DistanceFares {
            tier_limit_km: dec("30"),
            tiers,
            beyond_per_km: RatePair {
                peak: dec("30"),
                non_peak: dec("25"),
            },
            beyond_base_charge: RatePair {
                peak: dec("40"),
                non_peak: dec("30"),
            },
        },
        fixed: FixedFares {
            airport_drop: dec("899"),
            airport_pickup: dec("999"),
        },
        rental: RentalFares {
            min_hours: 2,
            max_hours: 12,
            packages,
        },
    }
}

/// City windows 07-11 and 17-20; airport windows 05-09 and 22-06 (wrapping).
pub fn test_peak_windows() -> PeakWindows {
    PeakWindows {
        city: vec![
            PeakWindow { start: 7, end: 11 },
            PeakWindow { start: 17, end: 20 },
        ],
        airport: vec![
            PeakWindow { start: 5, end: 9 },
            PeakWindow { start: 22, end: 6 },
        ],
    }
}

/// Fastest 30%, shortest 20% (mandatory), balanced 15%.
pub fn test_tolerance() -> ToleranceBands {
    ToleranceBands {
        fastest: ToleranceBand {
            tolerance_percent: dec("30"),
            mandatory: false,
            reason: "Fastest routes vary with live traffic".to_string(),
        },
        shortest: ToleranceBand {
            tolerance_percent: dec("20"),
            mandatory: true,
            reason: "Shortest route is fixed at booking time".to_string(),
        },
        balanced: ToleranceBand {
            tolerance_percent: dec("15"),
            mandatory: false,
            reason: "Balanced routes trade distance against time".to_string(),
        },
    }
}

/// The engine constants: 5% GST, 50% cap, 10 min buffer, 5 min intervals.
pub fn test_charges() -> Charges {
    Charges {
        gst_rate: dec("0.05"),
        max_price_increase_cap: dec("0.50"),
        free_buffer_minutes: 10,
        interval_minutes: 5,
        charge_per_interval: dec("50"),
        minimum_charge: dec("50"),
    }
}

/// A fully validated schedule assembled from the fixtures above.
pub fn test_schedule() -> FareSchedule {
    FareSchedule::new(
        test_metadata(),
        test_fares(),
        test_peak_windows(),
        test_tolerance(),
        test_charges(),
    )
    .expect("test schedule is valid")
}
