//! Supply/demand balance: how much of the requested demand the fleet can
//! serve, and whether the fleet is under- or oversized.

use crate::market::{
    rides_per_driver_month, BOTTLENECK_UTILIZATION, MIN_FLEET_TARGET, OVERSUPPLY_COVERAGE,
    OVERSUPPLY_UTILIZATION, UNDERSUPPLY_COVERAGE, USERS_PER_DRIVER_COVERAGE,
};
use serde::{Deserialize, Serialize};

/// Served vs requested rides for one month.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SupplyBalance {
    /// Theoretical rides the fleet can serve.
    pub capacity: f64,
    /// Requested rides before clipping.
    pub demand: f64,
    /// Rides actually served: `min(demand, capacity)`.
    pub rides: f64,
    /// Unserved demand: `max(0, demand - capacity)`.
    pub gap: f64,
    /// `rides / capacity` as a fraction, 0 when there is no capacity.
    pub utilization: f64,
    pub coverage_index: f64,
    pub bottleneck: bool,
    pub oversupply: bool,
}

/// Fleet capacity for a month.
pub fn supply_capacity(drivers: u32) -> f64 {
    drivers as f64 * rides_per_driver_month()
}

/// Drivers per `USERS_PER_DRIVER_COVERAGE` users. 0 when there are no users.
pub fn coverage_index(drivers: u32, users: f64) -> f64 {
    if users > 0.0 {
        drivers as f64 * USERS_PER_DRIVER_COVERAGE / users
    } else {
        0.0
    }
}

/// Clip demand to capacity and derive the balance flags.
pub fn balance(drivers: u32, users: f64, demand: f64) -> SupplyBalance {
    let capacity = supply_capacity(drivers);
    let demand = demand.max(0.0);
    let rides = demand.min(capacity);
    let gap = (demand - capacity).max(0.0);
    let utilization = if capacity > 0.0 { rides / capacity } else { 0.0 };
    let coverage = coverage_index(drivers, users);

    SupplyBalance {
        capacity,
        demand,
        rides,
        gap,
        utilization,
        coverage_index: coverage,
        bottleneck: utilization > BOTTLENECK_UTILIZATION,
        oversupply: capacity > 0.0
            && utilization < OVERSUPPLY_UTILIZATION
            && coverage > OVERSUPPLY_COVERAGE,
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Fleet plan
// ═══════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoverageStatus {
    Undersupplied,
    Balanced,
    Oversupplied,
}

impl CoverageStatus {
    pub fn from_index(coverage: f64) -> Self {
        if coverage < UNDERSUPPLY_COVERAGE {
            CoverageStatus::Undersupplied
        } else if coverage > OVERSUPPLY_COVERAGE {
            CoverageStatus::Oversupplied
        } else {
            CoverageStatus::Balanced
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Undersupplied => "UNDERSUPPLIED",
            Self::Balanced => "BALANCED",
            Self::Oversupplied => "OVERSUPPLIED",
        }
    }
}

/// Fleet the user base calls for, never below [`MIN_FLEET_TARGET`].
pub fn fleet_target(users: f64) -> u32 {
    let needed = (users.max(0.0) / USERS_PER_DRIVER_COVERAGE).round() as u32;
    needed.max(MIN_FLEET_TARGET)
}
