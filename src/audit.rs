use crate::financials::MonthlyResult;
use serde::{Deserialize, Serialize};

/// Calendar-year rollup of the monthly series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearAudit {
    pub year: i32,
    pub months: u32,
    pub gross_revenue: f64,
    pub take_rate_revenue: f64,
    pub net_profit: f64,
    pub rides: f64,
    pub total_costs: f64,
    /// Drivers in the last month of the year.
    pub ending_drivers: u32,
    /// Users in the last month of the year.
    pub ending_users: u64,
    /// Cash position at the end of the year.
    pub ending_accumulated_profit: f64,
}

impl YearAudit {
    fn new(year: i32) -> Self {
        YearAudit {
            year,
            months: 0,
            gross_revenue: 0.0,
            take_rate_revenue: 0.0,
            net_profit: 0.0,
            rides: 0.0,
            total_costs: 0.0,
            ending_drivers: 0,
            ending_users: 0,
            ending_accumulated_profit: 0.0,
        }
    }
}

/// Partition results by calendar year and reduce each partition. Output is
/// ordered by year; every month lands in exactly one audit. Year-end values
/// come from the latest month of each year, whatever the input order.
pub fn audit_years(results: &[MonthlyResult]) -> Vec<YearAudit> {
    let mut audits: Vec<YearAudit> = Vec::new();
    // Month index behind each audit's year-end snapshot.
    let mut snapshot_month: Vec<u32> = Vec::new();

    for r in results {
        let idx = match audits.iter().position(|a| a.year == r.year) {
            Some(i) => i,
            None => {
                audits.push(YearAudit::new(r.year));
                snapshot_month.push(0);
                audits.len() - 1
            }
        };
        let current = &mut audits[idx];
        current.months += 1;
        current.gross_revenue += r.gross_revenue;
        current.take_rate_revenue += r.take_rate_revenue;
        current.net_profit += r.net_profit;
        current.rides += r.rides;
        current.total_costs += r.total_costs;
        if r.month >= snapshot_month[idx] {
            snapshot_month[idx] = r.month;
            current.ending_drivers = r.drivers;
            current.ending_users = r.users;
            current.ending_accumulated_profit = r.accumulated_profit;
        }
    }

    audits.sort_by_key(|a| a.year);
    audits
}

/// Months belonging to one calendar year.
pub fn results_for_year(results: &[MonthlyResult], year: i32) -> Vec<&MonthlyResult> {
    results.iter().filter(|r| r.year == year).collect()
}
