//! Financial decomposition of one projected month: revenue split, cost
//! lines, profit and acquisition metrics.

use crate::growth::MonthlyVolumes;
use crate::market::{MAX_LIFETIME_MONTHS, START_YEAR};
use crate::params::SimulationParameters;
use chrono::Month;
use serde::{Deserialize, Serialize};

/// Driver bonus is paid every six months.
pub const SEMESTER_MONTHS: u32 = 6;
/// Passenger loyalty bonus is paid every twelve months.
pub const ANNUAL_MONTHS: u32 = 12;

/// Operational and financial result of one month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyResult {
    pub month: u32,
    pub year: i32,
    pub month_name: String,

    // Operations
    pub drivers: u32,
    pub users: u64,
    pub net_new_users: u64,
    /// Realized rides.
    pub rides: f64,
    /// Requested rides before capacity clipping.
    pub demand: f64,
    pub supply_capacity: f64,
    pub unserved_demand: f64,
    pub utilization_pct: f64,
    pub coverage_index: f64,
    pub bottleneck: bool,
    pub oversupply: bool,

    // Revenue
    pub gross_revenue: f64,
    pub take_rate_revenue: f64,

    // Costs
    pub tax: f64,
    pub fixed_costs: f64,
    pub marketing: f64,
    pub tech_cost: f64,
    pub variable_costs: f64,
    pub semester_bonus: f64,
    pub annual_bonus: f64,
    pub reserve_cost: f64,
    pub total_costs: f64,

    // Result
    pub net_profit: f64,
    pub accumulated_profit: f64,
    pub margin_pct: f64,

    // Acquisition efficiency
    pub cac: f64,
    pub arpu: f64,
    pub ltv: f64,
    pub ltv_cac_ratio: f64,
}

/// Calendar year of a 1-based month index.
pub fn calendar_year(month: u32) -> i32 {
    START_YEAR + (month.saturating_sub(1) / 12) as i32
}

/// English month name of a 1-based month index.
pub fn month_name(month: u32) -> &'static str {
    let in_year = (month.saturating_sub(1) % 12 + 1) as u8;
    Month::try_from(in_year).map(|m| m.name()).unwrap_or("")
}

pub fn semester_bonus_due(month: u32) -> bool {
    month > 0 && month % SEMESTER_MONTHS == 0
}

pub fn annual_bonus_due(month: u32) -> bool {
    month > 0 && month % ANNUAL_MONTHS == 0
}

/// Customer acquisition cost: marketing per net new user. 0 when the user
/// base did not grow.
pub fn acquisition_cost(marketing: f64, net_new_users: f64) -> f64 {
    if net_new_users > 0.0 {
        marketing / net_new_users.max(1.0)
    } else {
        0.0
    }
}

/// Net contribution per user: take-rate revenue less ride-driven costs,
/// floored at zero. 0 when there are no users.
pub fn arpu(take_rate_revenue: f64, direct_costs: f64, users: f64) -> f64 {
    if users > 0.0 {
        (take_rate_revenue - direct_costs).max(0.0) / users
    } else {
        0.0
    }
}

/// Expected lifetime in months, `100 / churn_pct`, capped at
/// [`MAX_LIFETIME_MONTHS`]. Zero churn yields the cap.
pub fn expected_lifetime_months(churn_rate_pct: f64) -> f64 {
    if churn_rate_pct > 0.0 {
        (100.0 / churn_rate_pct).min(MAX_LIFETIME_MONTHS)
    } else {
        MAX_LIFETIME_MONTHS
    }
}

pub fn lifetime_value(arpu: f64, churn_rate_pct: f64) -> f64 {
    arpu * expected_lifetime_months(churn_rate_pct)
}

/// Turn one month of volumes into a financial result.
///
/// `previous_accumulated_profit` is the cash position at the end of the
/// previous month (`-initial_investment` before month 1).
pub fn decompose_financials(
    volumes: &MonthlyVolumes,
    params: &SimulationParameters,
    previous_accumulated_profit: f64,
) -> MonthlyResult {
    let month = volumes.month;
    let rides = volumes.supply.rides;

    let gross_revenue = rides * params.avg_fare;
    let take_rate_revenue = gross_revenue * params.take_rate_pct / 100.0;
    let tax = take_rate_revenue * params.tax_pct / 100.0;

    let variable_costs = rides * params.variable_cost_per_ride;
    let tech_cost = params.tech_fee.cost(rides, gross_revenue);
    let fixed_costs = params.fixed_costs;
    let marketing = params.marketing_total();
    let semester_bonus = if semester_bonus_due(month) {
        params.semester_driver_bonus
    } else {
        0.0
    };
    let annual_bonus = if annual_bonus_due(month) {
        params.annual_passenger_bonus
    } else {
        0.0
    };
    let reserve_cost = take_rate_revenue * params.operational_reserve_pct / 100.0;

    let total_costs = tax
        + variable_costs
        + fixed_costs
        + marketing
        + tech_cost
        + semester_bonus
        + annual_bonus
        + reserve_cost;
    let net_profit = take_rate_revenue - total_costs;
    let accumulated_profit = previous_accumulated_profit + net_profit;

    let margin_pct = if gross_revenue > 0.0 {
        net_profit / gross_revenue * 100.0
    } else {
        0.0
    };

    let cac = acquisition_cost(marketing, volumes.net_new_users);
    let arpu = arpu(take_rate_revenue, variable_costs + tech_cost, volumes.users);
    let ltv = lifetime_value(arpu, params.churn_rate_pct);
    let ltv_cac_ratio = if cac > 0.0 { ltv / cac } else { 0.0 };

    MonthlyResult {
        month,
        year: calendar_year(month),
        month_name: month_name(month).to_string(),
        drivers: volumes.drivers,
        users: volumes.users.round() as u64,
        net_new_users: volumes.net_new_users.round() as u64,
        rides,
        demand: volumes.supply.demand,
        supply_capacity: volumes.supply.capacity,
        unserved_demand: volumes.supply.gap,
        utilization_pct: volumes.supply.utilization * 100.0,
        coverage_index: volumes.supply.coverage_index,
        bottleneck: volumes.supply.bottleneck,
        oversupply: volumes.supply.oversupply,
        gross_revenue,
        take_rate_revenue,
        tax,
        fixed_costs,
        marketing,
        tech_cost,
        variable_costs,
        semester_bonus,
        annual_bonus,
        reserve_cost,
        total_costs,
        net_profit,
        accumulated_profit,
        margin_pct,
        cac,
        arpu,
        ltv,
        ltv_cac_ratio,
    }
}
