//! Market constants for the launch city and per-ride unit economics.
//!
//! These values are tuning constants, not algorithm outputs. They are kept
//! as `const`s so every projection in a process sees the same market.

/// Months covered by a projection.
pub const HORIZON_MONTHS: u32 = 36;

/// Calendar year of month 1 (month 1 = January of this year).
pub const START_YEAR: i32 = 2026;

/// Resident population of the launch city (IBGE 2024 estimate).
pub const CITY_POPULATION: u64 = 355_919;

/// Share of the population that is digitally reachable, in percent.
pub const DEFAULT_SAM_PCT: f64 = 50.0;

/// Serviceable addressable market: digitally reachable users. User growth
/// stalls once this ceiling is hit.
pub const SAM_CEILING: f64 = 177_960.0;

/// Average rides a single active driver completes per day.
pub const RIDES_PER_DRIVER_PER_DAY: f64 = 10.0;

/// Average days per month used for capacity.
pub const DAYS_PER_MONTH: f64 = 30.5;

/// Users one driver is expected to cover at a coverage index of 1.0.
pub const USERS_PER_DRIVER_COVERAGE: f64 = 200.0;

/// Utilization (fraction) above which supply is a bottleneck.
pub const BOTTLENECK_UTILIZATION: f64 = 0.90;

/// Utilization (fraction) below which the fleet may be oversized.
pub const OVERSUPPLY_UTILIZATION: f64 = 0.20;

/// Coverage index below which the fleet is undersized.
pub const UNDERSUPPLY_COVERAGE: f64 = 0.8;

/// Coverage index above which the fleet is oversized.
pub const OVERSUPPLY_COVERAGE: f64 = 5.0;

/// Minimum fleet the operation should run, whatever the user base.
pub const MIN_FLEET_TARGET: u32 = 50;

/// Cap on expected user lifetime (months). Used as the LTV sentinel when
/// churn is zero.
pub const MAX_LIFETIME_MONTHS: f64 = 120.0;

/// Theoretical monthly ride capacity of one driver.
pub fn rides_per_driver_month() -> f64 {
    RIDES_PER_DRIVER_PER_DAY * DAYS_PER_MONTH
}

// ═══════════════════════════════════════════════════════════════════════
// Market sizing
// ═══════════════════════════════════════════════════════════════════════

/// Total / serviceable / obtainable market in users.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarketSize {
    pub tam: u64,
    pub sam: u64,
    pub som: u64,
}

/// Size the market from a population, the digitally reachable share and a
/// target market share (both percentages 0-100). Rounds like the
/// dashboard: SAM and SOM are rounded to whole users at each step.
pub fn tam_sam_som(population: u64, sam_pct: f64, share_pct: f64) -> MarketSize {
    let sam = (population as f64 * (sam_pct.max(0.0) / 100.0)).round() as u64;
    let som = (sam as f64 * (share_pct.max(0.0) / 100.0)).round() as u64;
    MarketSize {
        tam: population,
        sam,
        som,
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Per-ride unit economics
// ═══════════════════════════════════════════════════════════════════════

/// Fixed pricing rule for the technical ticket estimator.
pub const TICKET_BASE_FARE: f64 = 11.5;
pub const TICKET_KM_RATE: f64 = 2.0;

/// Per-ride deductions applied before the driver payout.
pub const GATEWAY_PCT: f64 = 2.5;
pub const INSURANCE_PER_RIDE: f64 = 0.60;
pub const MAINTENANCE_PER_RIDE: f64 = 0.40;
pub const LEGAL_PROVISION_PER_RIDE: f64 = 0.35;

/// Breakdown of one ride's fare.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RideEconomics {
    pub fare: f64,
    pub gateway: f64,
    pub insurance: f64,
    pub maintenance: f64,
    pub legal_provision: f64,
    /// Fare minus per-ride deductions.
    pub operating_margin: f64,
    pub platform_commission: f64,
    /// What the driver keeps.
    pub driver_payout: f64,
}

/// Split one ride's fare into deductions, platform commission and driver payout.
pub fn ride_economics(fare: f64, take_rate_pct: f64) -> RideEconomics {
    let gateway = fare * GATEWAY_PCT / 100.0;
    let operating_margin =
        fare - gateway - INSURANCE_PER_RIDE - MAINTENANCE_PER_RIDE - LEGAL_PROVISION_PER_RIDE;
    let platform_commission = fare * take_rate_pct / 100.0;
    RideEconomics {
        fare,
        gateway,
        insurance: INSURANCE_PER_RIDE,
        maintenance: MAINTENANCE_PER_RIDE,
        legal_provision: LEGAL_PROVISION_PER_RIDE,
        operating_margin,
        platform_commission,
        driver_payout: operating_margin - platform_commission,
    }
}

/// Ticket implied by the pricing rule for a trip.
///
/// `(min_fare * hour_multiplier + base + km_rate * km) * (1 + dynamic_pct/100)`,
/// floored at zero.
pub fn technical_ticket(min_fare: f64, hour_multiplier: f64, km: f64, dynamic_pct: f64) -> f64 {
    let base = min_fare * hour_multiplier + TICKET_BASE_FARE + TICKET_KM_RATE * km;
    (base * (1.0 + dynamic_pct / 100.0)).max(0.0)
}
