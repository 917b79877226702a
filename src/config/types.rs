//! Configuration types for fare schedules.
//!
//! This module contains the strongly-typed configuration structures that
//! are deserialized from YAML configuration files and validated into a
//! [`FareSchedule`].

use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::HashMap;

use crate::error::{EngineError, EngineResult};
use crate::models::{RouteType, ServiceClass};

/// Metadata about a fare schedule.
///
/// Identifies the schedule a quote or adjustment was priced against, so the
/// surrounding service can run several schedules (one per city) side by side.
#[derive(Debug, Clone, Deserialize)]
pub struct ScheduleMetadata {
    /// Short schedule code (e.g., "BLR-STD").
    pub code: String,
    /// The human-readable name of the schedule.
    pub name: String,
    /// The city this schedule applies to.
    pub city: String,
    /// ISO 4217 currency code for all amounts in the schedule.
    pub currency: String,
    /// The version or effective date of the schedule.
    pub version: String,
}

/// A single distance tier with its peak and non-peak base prices.
///
/// Tiers are closed ranges; a distance belongs to the tier whose
/// `[min_km, max_km]` range contains it. Prices are pre-tax.
#[derive(Debug, Clone, Deserialize)]
pub struct DistanceTier {
    /// Lower bound of the tier in kilometres (inclusive).
    pub min_km: Decimal,
    /// Upper bound of the tier in kilometres (inclusive).
    pub max_km: Decimal,
    /// Pre-tax base price during peak hours.
    pub peak_base_price: Decimal,
    /// Pre-tax base price outside peak hours.
    pub non_peak_base_price: Decimal,
}

/// A peak/non-peak pair of rates or charges.
#[derive(Debug, Clone, Deserialize)]
pub struct RatePair {
    /// The value applied during peak hours.
    pub peak: Decimal,
    /// The value applied outside peak hours.
    pub non_peak: Decimal,
}

/// Distance-based fare configuration for the tiered city-ride service.
#[derive(Debug, Clone, Deserialize)]
pub struct DistanceFares {
    /// Upper bound of the tier table in kilometres; beyond this the
    /// open-ended per-km formula applies.
    pub tier_limit_km: Decimal,
    /// The tier table, ascending and contiguous.
    pub tiers: Vec<DistanceTier>,
    /// Per-km rate beyond the tier limit (tax-inclusive).
    pub beyond_per_km: RatePair,
    /// Flag-down charge added beyond the tier limit (tax-inclusive).
    pub beyond_base_charge: RatePair,
}

/// Fixed tax-inclusive fares for the airport services.
#[derive(Debug, Clone, Deserialize)]
pub struct FixedFares {
    /// Fixed price for a drop to the airport.
    pub airport_drop: Decimal,
    /// Fixed price for a pickup from the airport.
    pub airport_pickup: Decimal,
}

/// Hourly-rental package configuration.
///
/// Packages are keyed by whole hours; requested durations are rounded and
/// clamped into `[min_hours, max_hours]` before lookup.
#[derive(Debug, Clone, Deserialize)]
pub struct RentalFares {
    /// Minimum bookable package duration in hours.
    pub min_hours: u32,
    /// Maximum bookable package duration in hours.
    pub max_hours: u32,
    /// Pre-tax package price by duration in hours.
    pub packages: HashMap<u32, Decimal>,
}

/// Fares configuration file structure (`fares.yaml`).
#[derive(Debug, Clone, Deserialize)]
pub struct FaresConfig {
    /// Tiered distance fares.
    pub distance: DistanceFares,
    /// Fixed airport fares.
    pub fixed: FixedFares,
    /// Hourly rental fares.
    pub rental: RentalFares,
}

/// A half-open hour range `[start, end)` during which peak pricing applies.
///
/// A window may wrap past midnight (`start > end`), in which case it matches
/// `hour >= start || hour < end`.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PeakWindow {
    /// First hour of the window (0-23, inclusive).
    pub start: u32,
    /// Hour the window ends (0-23, exclusive).
    pub end: u32,
}

/// Peak-hour window sets per service class (`peak_hours.yaml`).
#[derive(Debug, Clone, Deserialize)]
pub struct PeakWindows {
    /// Windows for city rides and rentals.
    pub city: Vec<PeakWindow>,
    /// Windows for airport services.
    pub airport: Vec<PeakWindow>,
}

impl PeakWindows {
    /// Returns the window set for a service class.
    pub fn windows_for(&self, class: ServiceClass) -> &[PeakWindow] {
        match class {
            ServiceClass::City => &self.city,
            ServiceClass::Airport => &self.airport,
        }
    }
}

/// The tolerance band for one route type.
#[derive(Debug, Clone, Deserialize)]
pub struct ToleranceBand {
    /// Percentage by which the observed distance may exceed the booked
    /// distance before a surcharge applies.
    pub tolerance_percent: Decimal,
    /// Whether the driver is required to follow the booked route choice.
    pub mandatory: bool,
    /// Human-readable explanation of why this band was chosen.
    pub reason: String,
}

/// Tolerance bands keyed by route type (`tolerance.yaml`).
#[derive(Debug, Clone, Deserialize)]
pub struct ToleranceBands {
    /// Band for the fastest-route preference.
    pub fastest: ToleranceBand,
    /// Band for the shortest-route preference.
    pub shortest: ToleranceBand,
    /// Band for the balanced-route preference.
    pub balanced: ToleranceBand,
}

impl ToleranceBands {
    /// Returns the band for a route type.
    pub fn band(&self, route_type: RouteType) -> &ToleranceBand {
        match route_type {
            RouteType::Fastest => &self.fastest,
            RouteType::Shortest => &self.shortest,
            RouteType::Balanced => &self.balanced,
        }
    }
}

/// Tax rate, surcharge cap and arrival-charge constants (`charges.yaml`).
#[derive(Debug, Clone, Deserialize)]
pub struct Charges {
    /// GST rate applied to all pre-tax base prices (e.g., 0.05).
    pub gst_rate: Decimal,
    /// Hard cap on a trip-start price increase, as a fraction of the booked
    /// price (e.g., 0.50 for 50%).
    pub max_price_increase_cap: Decimal,
    /// Grace period after the scheduled time before lateness becomes billable.
    pub free_buffer_minutes: i64,
    /// Billing interval for lateness, in minutes.
    pub interval_minutes: i64,
    /// Charge per started lateness interval, in whole currency units.
    pub charge_per_interval: Decimal,
    /// Floor applied to any non-zero lateness charge.
    pub minimum_charge: Decimal,
}

/// The complete fare schedule loaded from YAML files.
///
/// This struct aggregates all configuration loaded from a schedule
/// directory. It can only be constructed through [`FareSchedule::new`],
/// which validates the tables; code holding a `FareSchedule` may therefore
/// rely on the tier table being contiguous and the charge constants sane.
#[derive(Debug, Clone)]
pub struct FareSchedule {
    /// Schedule metadata.
    metadata: ScheduleMetadata,
    /// Fares configuration.
    fares: FaresConfig,
    /// Peak-hour windows.
    peak_windows: PeakWindows,
    /// Tolerance bands.
    tolerance: ToleranceBands,
    /// Tax and charge constants.
    charges: Charges,
}

impl FareSchedule {
    /// Creates a validated FareSchedule from its component parts.
    ///
    /// Tiers are sorted ascending by `min_km` before validation, so file
    /// order does not matter.
    ///
    /// # Errors
    ///
    /// Returns `ConfigValidation` if any table is inconsistent: tiers that
    /// overlap, leave gaps, or invert their bounds; rental packages that do
    /// not cover every bookable hour; peak windows outside 0-23; negative
    /// tolerance percentages; or non-positive charge constants.
    pub fn new(
        metadata: ScheduleMetadata,
        fares: FaresConfig,
        peak_windows: PeakWindows,
        tolerance: ToleranceBands,
        charges: Charges,
    ) -> EngineResult<Self> {
        let mut fares = fares;
        fares
            .distance
            .tiers
            .sort_by(|a, b| a.min_km.cmp(&b.min_km));

        let schedule = Self {
            metadata,
            fares,
            peak_windows,
            tolerance,
            charges,
        };
        schedule.validate()?;
        Ok(schedule)
    }

    fn validate(&self) -> EngineResult<()> {
        self.validate_tiers()?;
        self.validate_rental()?;
        self.validate_peak_windows()?;
        self.validate_tolerance()?;
        self.validate_charges()?;
        Ok(())
    }

    fn validate_tiers(&self) -> EngineResult<()> {
        let distance = &self.fares.distance;
        if distance.tiers.is_empty() {
            return Err(EngineError::ConfigValidation {
                message: "distance tier table is empty".to_string(),
            });
        }

        // Tiers are closed ranges stepping in 0.1 km: the next tier must
        // start exactly 0.1 km above the previous tier's upper bound.
        let step = Decimal::new(1, 1);
        let mut previous_max: Option<Decimal> = None;
        for tier in &distance.tiers {
            if tier.min_km >= tier.max_km {
                return Err(EngineError::ConfigValidation {
                    message: format!(
                        "tier [{}, {}] has min_km >= max_km",
                        tier.min_km, tier.max_km
                    ),
                });
            }
            if tier.peak_base_price < Decimal::ZERO || tier.non_peak_base_price < Decimal::ZERO {
                return Err(EngineError::ConfigValidation {
                    message: format!(
                        "tier [{}, {}] has a negative base price",
                        tier.min_km, tier.max_km
                    ),
                });
            }
            if tier.peak_base_price < tier.non_peak_base_price {
                return Err(EngineError::ConfigValidation {
                    message: format!(
                        "tier [{}, {}] prices non-peak above peak",
                        tier.min_km, tier.max_km
                    ),
                });
            }
            if let Some(prev) = previous_max {
                let expected = prev + step;
                if tier.min_km != expected {
                    return Err(EngineError::ConfigValidation {
                        message: format!(
                            "tier table not contiguous: expected a tier starting at {} km, found {} km",
                            expected, tier.min_km
                        ),
                    });
                }
            }
            previous_max = Some(tier.max_km);
        }

        let last_max = previous_max.unwrap_or(Decimal::ZERO);
        if last_max != distance.tier_limit_km {
            return Err(EngineError::ConfigValidation {
                message: format!(
                    "last tier ends at {} km but tier_limit_km is {} km",
                    last_max, distance.tier_limit_km
                ),
            });
        }

        for (name, pair) in [
            ("beyond_per_km", &distance.beyond_per_km),
            ("beyond_base_charge", &distance.beyond_base_charge),
        ] {
            if pair.peak < Decimal::ZERO || pair.non_peak < Decimal::ZERO {
                return Err(EngineError::ConfigValidation {
                    message: format!("{} contains a negative value", name),
                });
            }
        }

        Ok(())
    }

    fn validate_rental(&self) -> EngineResult<()> {
        let rental = &self.fares.rental;
        if rental.min_hours == 0 || rental.min_hours > rental.max_hours {
            return Err(EngineError::ConfigValidation {
                message: format!(
                    "rental hour bounds [{}, {}] are invalid",
                    rental.min_hours, rental.max_hours
                ),
            });
        }
        for hours in rental.min_hours..=rental.max_hours {
            match rental.packages.get(&hours) {
                Some(price) if *price >= Decimal::ZERO => {}
                Some(_) => {
                    return Err(EngineError::ConfigValidation {
                        message: format!("rental package for {} hours has a negative price", hours),
                    });
                }
                None => {
                    return Err(EngineError::ConfigValidation {
                        message: format!("rental package table missing entry for {} hours", hours),
                    });
                }
            }
        }
        Ok(())
    }

    fn validate_peak_windows(&self) -> EngineResult<()> {
        for (class, windows) in [
            ("city", &self.peak_windows.city),
            ("airport", &self.peak_windows.airport),
        ] {
            for window in windows {
                if window.start > 23 || window.end > 23 {
                    return Err(EngineError::ConfigValidation {
                        message: format!(
                            "peak window {}-{} for class '{}' has an hour outside 0-23",
                            window.start, window.end, class
                        ),
                    });
                }
            }
        }
        Ok(())
    }

    fn validate_tolerance(&self) -> EngineResult<()> {
        for (name, band) in [
            ("fastest", &self.tolerance.fastest),
            ("shortest", &self.tolerance.shortest),
            ("balanced", &self.tolerance.balanced),
        ] {
            if band.tolerance_percent < Decimal::ZERO {
                return Err(EngineError::ConfigValidation {
                    message: format!("tolerance for route type '{}' is negative", name),
                });
            }
        }
        Ok(())
    }

    fn validate_charges(&self) -> EngineResult<()> {
        let charges = &self.charges;
        if charges.gst_rate < Decimal::ZERO {
            return Err(EngineError::ConfigValidation {
                message: "gst_rate is negative".to_string(),
            });
        }
        if charges.max_price_increase_cap < Decimal::ZERO {
            return Err(EngineError::ConfigValidation {
                message: "max_price_increase_cap is negative".to_string(),
            });
        }
        if charges.free_buffer_minutes < 0 {
            return Err(EngineError::ConfigValidation {
                message: "free_buffer_minutes is negative".to_string(),
            });
        }
        if charges.interval_minutes <= 0 {
            return Err(EngineError::ConfigValidation {
                message: "interval_minutes must be positive".to_string(),
            });
        }
        if charges.charge_per_interval < Decimal::ZERO || charges.minimum_charge < Decimal::ZERO {
            return Err(EngineError::ConfigValidation {
                message: "lateness charges must be non-negative".to_string(),
            });
        }
        Ok(())
    }

    /// Returns the schedule metadata.
    pub fn metadata(&self) -> &ScheduleMetadata {
        &self.metadata
    }

    /// Returns the distance fare configuration.
    pub fn distance_fares(&self) -> &DistanceFares {
        &self.fares.distance
    }

    /// Returns the fixed airport fares.
    pub fn fixed_fares(&self) -> &FixedFares {
        &self.fares.fixed
    }

    /// Returns the rental fare configuration.
    pub fn rental_fares(&self) -> &RentalFares {
        &self.fares.rental
    }

    /// Returns the peak-hour windows.
    pub fn peak_windows(&self) -> &PeakWindows {
        &self.peak_windows
    }

    /// Returns the tolerance bands.
    pub fn tolerance_bands(&self) -> &ToleranceBands {
        &self.tolerance
    }

    /// Returns the tax and charge constants.
    pub fn charges(&self) -> &Charges {
        &self.charges
    }
}
