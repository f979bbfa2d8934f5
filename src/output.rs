use crate::audit::{audit_years, YearAudit};
use crate::financials::MonthlyResult;
use crate::market::SAM_CEILING;
use crate::params::{self, SimulationParameters};
use crate::projection::Projection;
use crate::scenarios::ScenarioTag;
use crate::sweep::SweepResult;
use serde::Serialize;
use std::path::Path;

/// A discrete milestone or warning extracted from a projection.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub month: u32,
    pub event_type: String,
    pub details: String,
}

/// Headline figures for a whole projection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryMetrics {
    pub scenario: String,
    pub total_months: u32,
    pub total_gross_revenue: f64,
    pub total_take_rate_revenue: f64,
    pub total_net_profit: f64,
    pub total_rides: f64,
    /// First month with positive net profit.
    pub break_even_month: Option<u32>,
    /// First month with positive accumulated profit.
    pub payback_month: Option<u32>,
    /// Lowest cash position over the horizon (maximum burn).
    pub min_accumulated_profit: f64,
    pub worst_monthly_result: f64,
    pub final_accumulated_profit: f64,
    /// Final cash position over initial investment; 0 without investment.
    pub roi_pct: f64,
    pub initial_drivers: u32,
    pub final_drivers: u32,
    pub final_users: u64,
    pub final_market_share_pct: f64,
    pub estimated_churned_users: f64,
    /// Ride volume of the last calendar year against the first.
    pub ride_growth_pct: f64,
    pub bottleneck_months: u32,
    pub oversupply_months: u32,
    pub final_cac: f64,
    pub final_ltv: f64,
    pub final_ltv_cac_ratio: f64,
}

pub fn break_even_month(results: &[MonthlyResult]) -> Option<u32> {
    results.iter().find(|r| r.net_profit > 0.0).map(|r| r.month)
}

pub fn payback_month(results: &[MonthlyResult]) -> Option<u32> {
    results
        .iter()
        .find(|r| r.accumulated_profit > 0.0)
        .map(|r| r.month)
}

/// Extract milestones and supply warnings from a monthly series.
pub fn extract_events(results: &[MonthlyResult], scenario: ScenarioTag) -> Vec<Event> {
    let mut events = Vec::new();
    let break_even = break_even_month(results);
    let payback = payback_month(results);
    let mut in_bottleneck = false;
    let mut fleet_capped = false;
    let mut market_capped = false;

    for r in results {
        if r.semester_bonus > 0.0 {
            events.push(Event {
                month: r.month,
                event_type: "semester_bonus".to_string(),
                details: format!("driver_bonus={:.2}", r.semester_bonus),
            });
        }
        if r.annual_bonus > 0.0 {
            events.push(Event {
                month: r.month,
                event_type: "annual_bonus".to_string(),
                details: format!("passenger_bonus={:.2}", r.annual_bonus),
            });
        }
        if Some(r.month) == break_even {
            events.push(Event {
                month: r.month,
                event_type: "break_even".to_string(),
                details: format!("net_profit={:.2}", r.net_profit),
            });
        }
        if Some(r.month) == payback {
            events.push(Event {
                month: r.month,
                event_type: "payback".to_string(),
                details: format!("accumulated_profit={:.2}", r.accumulated_profit),
            });
        }
        if r.bottleneck != in_bottleneck {
            in_bottleneck = r.bottleneck;
            events.push(Event {
                month: r.month,
                event_type: if in_bottleneck {
                    "bottleneck_start"
                } else {
                    "bottleneck_end"
                }
                .to_string(),
                details: format!(
                    "utilization={:.1}%,unserved={:.0}",
                    r.utilization_pct, r.unserved_demand
                ),
            });
        }
        if r.oversupply {
            events.push(Event {
                month: r.month,
                event_type: "oversupply".to_string(),
                details: format!(
                    "utilization={:.1}%,coverage={:.2}",
                    r.utilization_pct, r.coverage_index
                ),
            });
        }
        if !fleet_capped && r.drivers >= scenario.fleet_cap() {
            fleet_capped = true;
            events.push(Event {
                month: r.month,
                event_type: "fleet_cap_reached".to_string(),
                details: format!("drivers={}", r.drivers),
            });
        }
        if !market_capped && r.users as f64 >= SAM_CEILING.round() {
            market_capped = true;
            events.push(Event {
                month: r.month,
                event_type: "market_cap_reached".to_string(),
                details: format!("users={}", r.users),
            });
        }
    }

    events
}

/// Compute headline figures for a projection.
pub fn compute_summary(
    results: &[MonthlyResult],
    params: &SimulationParameters,
    scenario: ScenarioTag,
) -> SummaryMetrics {
    let (first, last) = match (results.first(), results.last()) {
        (Some(f), Some(l)) => (f, l),
        _ => {
            return SummaryMetrics {
                scenario: scenario.name().to_string(),
                total_months: 0,
                total_gross_revenue: 0.0,
                total_take_rate_revenue: 0.0,
                total_net_profit: 0.0,
                total_rides: 0.0,
                break_even_month: None,
                payback_month: None,
                min_accumulated_profit: -params.initial_investment,
                worst_monthly_result: 0.0,
                final_accumulated_profit: -params.initial_investment,
                roi_pct: 0.0,
                initial_drivers: params.initial_drivers,
                final_drivers: params.initial_drivers,
                final_users: 0,
                final_market_share_pct: 0.0,
                estimated_churned_users: 0.0,
                ride_growth_pct: 0.0,
                bottleneck_months: 0,
                oversupply_months: 0,
                final_cac: 0.0,
                final_ltv: 0.0,
                final_ltv_cac_ratio: 0.0,
            };
        }
    };

    let years = audit_years(results);
    let ride_growth_pct = match (years.first(), years.last()) {
        (Some(y1), Some(yn)) if years.len() > 1 && y1.rides > 0.0 => {
            (yn.rides - y1.rides) / y1.rides * 100.0
        }
        _ => 0.0,
    };

    let roi_pct = if params.initial_investment > 0.0 {
        last.accumulated_profit / params.initial_investment * 100.0
    } else {
        0.0
    };

    SummaryMetrics {
        scenario: scenario.name().to_string(),
        total_months: results.len() as u32,
        total_gross_revenue: results.iter().map(|r| r.gross_revenue).sum(),
        total_take_rate_revenue: results.iter().map(|r| r.take_rate_revenue).sum(),
        total_net_profit: results.iter().map(|r| r.net_profit).sum(),
        total_rides: results.iter().map(|r| r.rides).sum(),
        break_even_month: break_even_month(results),
        payback_month: payback_month(results),
        min_accumulated_profit: results
            .iter()
            .map(|r| r.accumulated_profit)
            .fold(f64::INFINITY, f64::min),
        worst_monthly_result: results
            .iter()
            .map(|r| r.net_profit)
            .fold(f64::INFINITY, f64::min),
        final_accumulated_profit: last.accumulated_profit,
        roi_pct,
        initial_drivers: first.drivers,
        final_drivers: last.drivers,
        final_users: last.users,
        final_market_share_pct: last.users as f64 / SAM_CEILING * 100.0,
        estimated_churned_users: results
            .iter()
            .map(|r| r.users as f64 * params.churn_rate_pct / 100.0)
            .sum(),
        ride_growth_pct,
        bottleneck_months: results.iter().filter(|r| r.bottleneck).count() as u32,
        oversupply_months: results.iter().filter(|r| r.oversupply).count() as u32,
        final_cac: last.cac,
        final_ltv: last.ltv,
        final_ltv_cac_ratio: last.ltv_cac_ratio,
    }
}

/// Save events to CSV.
pub fn save_events_csv(
    events: &[Event],
    path: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut wtr = csv::Writer::from_path(path)?;
    wtr.write_record(["month", "event_type", "details"])?;

    for e in events {
        wtr.write_record(&[e.month.to_string(), e.event_type.clone(), e.details.clone()])?;
    }
    wtr.flush()?;
    Ok(())
}

/// Save year audits to CSV.
pub fn save_years_csv(
    audits: &[YearAudit],
    path: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut wtr = csv::Writer::from_path(path)?;
    wtr.write_record([
        "year",
        "months",
        "gross_revenue",
        "take_rate_revenue",
        "net_profit",
        "rides",
        "total_costs",
        "ending_drivers",
        "ending_users",
        "ending_accumulated_profit",
    ])?;

    for a in audits {
        wtr.write_record(&[
            a.year.to_string(),
            a.months.to_string(),
            format!("{:.2}", a.gross_revenue),
            format!("{:.2}", a.take_rate_revenue),
            format!("{:.2}", a.net_profit),
            format!("{:.1}", a.rides),
            format!("{:.2}", a.total_costs),
            a.ending_drivers.to_string(),
            a.ending_users.to_string(),
            format!("{:.2}", a.ending_accumulated_profit),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

/// Save summary metrics to JSON.
pub fn save_summary_json(
    summary: &SummaryMetrics,
    path: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, serde_json::to_string_pretty(summary)?)?;
    Ok(())
}

/// Save sweep results to CSV.
pub fn save_sweep_results(
    results: &[SweepResult],
    path: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut wtr = csv::Writer::from_path(path)?;

    if let Some(first) = results.first() {
        let mut header: Vec<String> = first.params.iter().map(|(n, _)| n.clone()).collect();
        header.push("overall_score".to_string());
        for (tag, _) in &first.scores {
            header.push(format!("score_{}", tag.name()));
        }
        wtr.write_record(&header)?;
    }

    for r in results {
        let mut row: Vec<String> = r.params.iter().map(|(_, v)| format!("{:.6}", v)).collect();
        row.push(format!("{:.2}", r.overall_score));
        for (_, s) in &r.scores {
            row.push(format!("{:.2}", s));
        }
        wtr.write_record(&row)?;
    }

    wtr.flush()?;
    Ok(())
}

/// Save all outputs for a projection to a directory.
pub fn save_all(projection: &Projection, output_dir: &Path) -> Result<(), Box<dyn std::error::Error>> {
    std::fs::create_dir_all(output_dir)?;

    projection.save_metrics_csv(&output_dir.join("timeseries.csv"))?;

    let audits = audit_years(&projection.results);
    save_years_csv(&audits, &output_dir.join("years.csv"))?;

    let events = extract_events(&projection.results, projection.scenario);
    save_events_csv(&events, &output_dir.join("events.csv"))?;

    let summary = compute_summary(&projection.results, &projection.params, projection.scenario);
    save_summary_json(&summary, &output_dir.join("summary.json"))?;

    params::save_toml(&projection.params, &output_dir.join("params.toml"))?;

    tracing::info!(
        scenario = projection.scenario.name(),
        dir = %output_dir.display(),
        events = events.len(),
        "saved projection outputs"
    );
    Ok(())
}
