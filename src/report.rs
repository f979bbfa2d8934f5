use crate::audit::{audit_years, results_for_year};
use crate::capacity::{fleet_target, CoverageStatus};
use crate::financials::MonthlyResult;
use crate::output::{compute_summary, SummaryMetrics};
use crate::projection::Projection;
use std::fmt::Write as _;
use std::path::Path;

/// Healthy acquisition economics: lifetime value at least this many CACs.
pub const MIN_LTV_CAC_RATIO: f64 = 3.0;

/// June of each year.
pub const FIRST_SEMESTER_MONTHS: [u32; 3] = [6, 18, 30];
/// December of each year.
pub const SECOND_SEMESTER_MONTHS: [u32; 3] = [12, 24, 36];

// ═══════════════════════════════════════════════════════════════════════
// Viability verdict
// ═══════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq)]
pub enum Verdict {
    Pass,
    SoftFail,
    HardFail,
}

impl Verdict {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Pass => "PASS",
            Self::SoftFail => "SOFT FAIL",
            Self::HardFail => "HARD FAIL",
        }
    }
}

#[derive(Debug, Clone)]
pub struct CriterionResult {
    pub name: String,
    pub passed: bool,
    pub severity: Verdict,
    pub details: String,
}

#[derive(Debug, Clone)]
pub struct ViabilityResult {
    pub overall: Verdict,
    pub criteria: Vec<CriterionResult>,
}

pub fn evaluate_viability(results: &[MonthlyResult]) -> ViabilityResult {
    let mut criteria = Vec::new();
    let last = results.last();

    // --- Hard fail: operation still burning cash at horizon end ---
    let final_profit = last.map(|r| r.net_profit).unwrap_or(0.0);
    criteria.push(CriterionResult {
        name: "Positive final month".into(),
        passed: final_profit > 0.0,
        severity: Verdict::HardFail,
        details: format!("Net profit in final month: {:.2}", final_profit),
    });

    // --- Hard fail: never breaks even ---
    let break_even = crate::output::break_even_month(results);
    criteria.push(CriterionResult {
        name: "Break-even within horizon".into(),
        passed: break_even.is_some(),
        severity: Verdict::HardFail,
        details: match break_even {
            Some(m) => format!("First profitable month: {}", m),
            None => "Net profit never turns positive".into(),
        },
    });

    // --- Soft fail: investment not recovered ---
    let payback = crate::output::payback_month(results);
    criteria.push(CriterionResult {
        name: "Payback within horizon".into(),
        passed: payback.is_some(),
        severity: Verdict::SoftFail,
        details: match payback {
            Some(m) => format!("Accumulated profit positive from month {}", m),
            None => "Accumulated profit still negative after the horizon".into(),
        },
    });

    // --- Soft fail: supply bottleneck ---
    let bottleneck = last.map(|r| r.bottleneck).unwrap_or(false);
    criteria.push(CriterionResult {
        name: "No supply bottleneck at horizon end".into(),
        passed: !bottleneck,
        severity: Verdict::SoftFail,
        details: format!(
            "Final utilization: {:.1}%, unserved rides: {:.0}",
            last.map(|r| r.utilization_pct).unwrap_or(0.0),
            last.map(|r| r.unserved_demand).unwrap_or(0.0)
        ),
    });

    // --- Soft fail: idle fleet ---
    let oversupply = last.map(|r| r.oversupply).unwrap_or(false);
    criteria.push(CriterionResult {
        name: "No oversupply at horizon end".into(),
        passed: !oversupply,
        severity: Verdict::SoftFail,
        details: format!(
            "Final coverage index: {:.2}",
            last.map(|r| r.coverage_index).unwrap_or(0.0)
        ),
    });

    // --- Soft fail: acquisition economics ---
    let (cac, ratio) = last.map(|r| (r.cac, r.ltv_cac_ratio)).unwrap_or((0.0, 0.0));
    criteria.push(CriterionResult {
        name: "LTV/CAC >= 3".into(),
        passed: cac == 0.0 || ratio >= MIN_LTV_CAC_RATIO,
        severity: Verdict::SoftFail,
        details: if cac == 0.0 {
            "No net user growth in final month".into()
        } else {
            format!("LTV/CAC: {:.2} (CAC {:.2})", ratio, cac)
        },
    });

    let overall = if criteria
        .iter()
        .any(|c| !c.passed && c.severity == Verdict::HardFail)
    {
        Verdict::HardFail
    } else if criteria.iter().any(|c| !c.passed) {
        Verdict::SoftFail
    } else {
        Verdict::Pass
    };

    ViabilityResult { overall, criteria }
}

// ═══════════════════════════════════════════════════════════════════════
// Year-over-year semester comparison
// ═══════════════════════════════════════════════════════════════════════

/// One month compared with the same month a year earlier.
#[derive(Debug, Clone, PartialEq)]
pub struct PeriodComparison {
    pub month: u32,
    pub previous_month: Option<u32>,
    pub gross_revenue: f64,
    pub net_profit: f64,
    pub rides: f64,
    pub drivers: u32,
    pub users: u64,
    /// Marketing, tech, variable and fixed costs.
    pub operating_costs: f64,
    pub gross_revenue_change_pct: f64,
    pub net_profit_change_pct: f64,
    pub rides_change_pct: f64,
    pub users_change_pct: f64,
}

/// Percent change from `base` to `value`; 0 when there is no base.
pub fn pct_change(base: f64, value: f64) -> f64 {
    if base != 0.0 {
        (value - base) / base.abs() * 100.0
    } else {
        0.0
    }
}

fn operating_costs(r: &MonthlyResult) -> f64 {
    r.marketing + r.tech_cost + r.variable_costs + r.fixed_costs
}

/// Compare each listed month with the same month one year earlier. Months
/// outside the series are skipped.
pub fn semester_comparison(results: &[MonthlyResult], months: &[u32]) -> Vec<PeriodComparison> {
    let find = |m: u32| results.iter().find(|r| r.month == m);

    months
        .iter()
        .filter_map(|&m| find(m))
        .map(|r| {
            let prev = r.month.checked_sub(12).and_then(|pm| find(pm));
            let change = |f: fn(&MonthlyResult) -> f64| {
                prev.map(|p| pct_change(f(p), f(r))).unwrap_or(0.0)
            };
            PeriodComparison {
                month: r.month,
                previous_month: prev.map(|p| p.month),
                gross_revenue: r.gross_revenue,
                net_profit: r.net_profit,
                rides: r.rides,
                drivers: r.drivers,
                users: r.users,
                operating_costs: operating_costs(r),
                gross_revenue_change_pct: change(|x| x.gross_revenue),
                net_profit_change_pct: change(|x| x.net_profit),
                rides_change_pct: change(|x| x.rides),
                users_change_pct: change(|x| x.users as f64),
            }
        })
        .collect()
}

// ═══════════════════════════════════════════════════════════════════════
// Fleet plan
// ═══════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq)]
pub struct FleetPlanRow {
    pub month: u32,
    pub drivers: u32,
    pub target: u32,
    /// Positive when the fleet exceeds the target.
    pub gap: i64,
    pub coverage_index: f64,
    pub status: CoverageStatus,
}

pub fn fleet_plan(results: &[MonthlyResult]) -> Vec<FleetPlanRow> {
    results
        .iter()
        .map(|r| {
            let target = fleet_target(r.users as f64);
            FleetPlanRow {
                month: r.month,
                drivers: r.drivers,
                target,
                gap: r.drivers as i64 - target as i64,
                coverage_index: r.coverage_index,
                status: CoverageStatus::from_index(r.coverage_index),
            }
        })
        .collect()
}

// ═══════════════════════════════════════════════════════════════════════
// Text report
// ═══════════════════════════════════════════════════════════════════════

/// Income statement over the horizon, or over one calendar year.
pub fn income_statement(results: &[MonthlyResult], year: Option<i32>) -> String {
    let rows: Vec<&MonthlyResult> = match year {
        Some(y) => results_for_year(results, y),
        None => results.iter().collect(),
    };
    let total = |f: fn(&MonthlyResult) -> f64| rows.iter().map(|r| f(r)).sum::<f64>();

    let lines: [(&str, f64); 12] = [
        ("1. Gross revenue (GMV)", total(|r| r.gross_revenue)),
        ("2. Platform revenue", total(|r| r.take_rate_revenue)),
        ("   (-) Taxes", total(|r| r.tax)),
        ("   (-) Variable costs", total(|r| r.variable_costs)),
        ("   (-) Fixed costs", total(|r| r.fixed_costs)),
        ("   (-) Marketing", total(|r| r.marketing)),
        ("   (-) Technology", total(|r| r.tech_cost)),
        ("   (-) Driver semester bonus", total(|r| r.semester_bonus)),
        ("   (-) Passenger annual bonus", total(|r| r.annual_bonus)),
        ("   (-) Operational reserve", total(|r| r.reserve_cost)),
        ("   Total costs", total(|r| r.total_costs)),
        ("3. Net profit", total(|r| r.net_profit)),
    ];

    let title = match year {
        Some(y) => format!("Income statement {}", y),
        None => format!("Income statement ({} months)", rows.len()),
    };
    let mut out = String::new();
    let _ = writeln!(out, "{}", title);
    let _ = writeln!(out, "{}", "-".repeat(48));
    for (label, value) in lines {
        let _ = writeln!(out, "{:<32}{:>16.2}", label, value);
    }
    out
}

fn summary_block(summary: &SummaryMetrics) -> String {
    let month_or = |m: Option<u32>, none: &str| match m {
        Some(m) => format!("month {}", m),
        None => none.to_string(),
    };
    let mut out = String::new();
    let _ = writeln!(out, "  Break-even      : {}", month_or(summary.break_even_month, "not reached"));
    let _ = writeln!(out, "  Payback         : {}", month_or(summary.payback_month, "> horizon"));
    let _ = writeln!(out, "  Total GMV       : {:.2}", summary.total_gross_revenue);
    let _ = writeln!(out, "  Total rides     : {:.0}", summary.total_rides);
    let _ = writeln!(out, "  Total profit    : {:.2}", summary.total_net_profit);
    let _ = writeln!(out, "  Min cash        : {:.2}", summary.min_accumulated_profit);
    let _ = writeln!(out, "  Final cash      : {:.2}", summary.final_accumulated_profit);
    let _ = writeln!(
        out,
        "  Fleet           : {} -> {} drivers",
        summary.initial_drivers, summary.final_drivers
    );
    let _ = writeln!(
        out,
        "  Users           : {} ({:.2}% of SAM)",
        summary.final_users, summary.final_market_share_pct
    );
    let _ = writeln!(out, "  Churned (est.)  : {:.0}", summary.estimated_churned_users);
    let _ = writeln!(out, "  Ride growth     : {:.0}% (first vs last year)", summary.ride_growth_pct);
    let _ = writeln!(out, "  Bottleneck      : {} months", summary.bottleneck_months);
    out
}

/// Plain-text viability report for one projection.
pub fn generate_report(projection: &Projection) -> String {
    let results = &projection.results;
    let verdict = evaluate_viability(results);
    let summary = compute_summary(results, &projection.params, projection.scenario);

    let mut out = String::new();
    let _ = writeln!(out, "Viability report: {}", projection.scenario.name());
    let _ = writeln!(out, "{}", projection.scenario.description());
    let _ = writeln!(out, "\nOverall verdict: {}\n", verdict.overall.label());
    out.push_str(&summary_block(&summary));

    let _ = writeln!(out, "\nCriteria:");
    for c in &verdict.criteria {
        let _ = writeln!(
            out,
            "  [{}] {} - {}",
            if c.passed { "PASS" } else { c.severity.label() },
            c.name,
            c.details
        );
    }

    let _ = writeln!(out, "\nYears:");
    for a in audit_years(results) {
        let _ = writeln!(
            out,
            "  {}: GMV {:.2} | revenue {:.2} | profit {:.2} | drivers {} | users {}",
            a.year, a.gross_revenue, a.take_rate_revenue, a.net_profit, a.ending_drivers, a.ending_users
        );
    }

    let _ = writeln!(out, "\nSemester comparison:");
    for set in [FIRST_SEMESTER_MONTHS, SECOND_SEMESTER_MONTHS] {
        for c in semester_comparison(results, &set) {
            let _ = writeln!(
                out,
                "  Month {:>2}: GMV {:.2} ({:+.1}%) | profit {:.2} | rides {:.0} ({:+.1}%)",
                c.month,
                c.gross_revenue,
                c.gross_revenue_change_pct,
                c.net_profit,
                c.rides,
                c.rides_change_pct
            );
        }
    }

    let _ = writeln!(out, "\nFleet plan (year end):");
    for row in fleet_plan(results).iter().filter(|row| row.month % 12 == 0) {
        let _ = writeln!(
            out,
            "  Month {:>2}: {} drivers, target {} ({:+}) {}",
            row.month,
            row.drivers,
            row.target,
            row.gap,
            row.status.label()
        );
    }

    out.push('\n');
    out.push_str(&income_statement(results, None));
    out
}

pub fn save_report(text: &str, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, text)?;
    Ok(())
}
