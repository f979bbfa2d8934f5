//! Growth model: fleet onboarding, compounding user base and ride demand.

use crate::capacity::{self, SupplyBalance};
use crate::market::{HORIZON_MONTHS, SAM_CEILING, USERS_PER_DRIVER_COVERAGE};
use crate::params::SimulationParameters;
use crate::scenarios::ScenarioTag;

/// Operational volumes for one month.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthlyVolumes {
    pub month: u32,
    pub drivers: u32,
    /// Active users (continuous; rounded only for reporting).
    pub users: f64,
    pub previous_users: f64,
    /// `max(0, users - previous_users)`.
    pub net_new_users: f64,
    pub supply: SupplyBalance,
}

/// Active drivers at `month` (1-based). Month 1 shows the launch fleet;
/// additions arrive from month 2 on and stop at the scenario cap.
pub fn drivers_at(params: &SimulationParameters, scenario: ScenarioTag, month: u32) -> u32 {
    let onboarded = params.monthly_driver_additions as u64 * month.saturating_sub(1) as u64;
    let uncapped = params.initial_drivers as u64 + onboarded;
    uncapped.min(scenario.fleet_cap() as u64) as u32
}

/// User base at month 0.
///
/// Uses `initial_users` when set; otherwise the user base the launch fleet
/// covers at `min_coverage_ratio`.
pub fn seed_users(params: &SimulationParameters) -> f64 {
    let seed = if params.initial_users > 0.0 {
        params.initial_users
    } else if params.min_coverage_ratio > 0.0 {
        params.initial_drivers as f64 * USERS_PER_DRIVER_COVERAGE / params.min_coverage_ratio
    } else {
        0.0
    };
    seed.clamp(0.0, SAM_CEILING)
}

/// One month of compounding growth net of churn, kept within
/// `[0, SAM_CEILING]`.
pub fn next_users(previous: f64, params: &SimulationParameters) -> f64 {
    let grown = previous
        * (1.0 + params.user_growth_pct / 100.0)
        * (1.0 - params.churn_rate_pct / 100.0);
    grown.clamp(0.0, SAM_CEILING)
}

/// Project fleet, users, demand and supply balance over the horizon.
pub fn project_volumes(params: &SimulationParameters, scenario: ScenarioTag) -> Vec<MonthlyVolumes> {
    let mut volumes = Vec::with_capacity(HORIZON_MONTHS as usize);
    let mut users = seed_users(params);

    for month in 1..=HORIZON_MONTHS {
        let previous_users = users;
        users = next_users(previous_users, params);
        let drivers = drivers_at(params, scenario, month);
        let demand = users * params.rides_per_user_month;
        let supply = capacity::balance(drivers, users, demand);

        tracing::trace!(
            month,
            drivers,
            users,
            demand,
            capacity = supply.capacity,
            "projected volumes"
        );

        volumes.push(MonthlyVolumes {
            month,
            drivers,
            users,
            previous_users,
            net_new_users: (users - previous_users).max(0.0),
            supply,
        });
    }

    volumes
}
