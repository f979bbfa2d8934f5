use crate::financials::{decompose_financials, MonthlyResult};
use crate::growth::project_volumes;
use crate::params::{ParamError, SimulationParameters};
use crate::scenarios::ScenarioTag;

/// Project the full horizon for a parameter set.
///
/// Pure and total: the same inputs always produce the same 36 months, and
/// the only state carried from month to month is the accumulated profit,
/// seeded at `-initial_investment`. Inputs are assumed validated; see
/// [`project_checked`].
pub fn project(params: &SimulationParameters, scenario: ScenarioTag) -> Vec<MonthlyResult> {
    let volumes = project_volumes(params, scenario);
    let seed = -params.initial_investment;

    let results: Vec<MonthlyResult> = volumes
        .iter()
        .scan(seed, |accumulated, v| {
            let result = decompose_financials(v, params, *accumulated);
            *accumulated = result.accumulated_profit;
            Some(result)
        })
        .collect();

    tracing::debug!(
        scenario = scenario.name(),
        months = results.len(),
        final_cash = results.last().map(|r| r.accumulated_profit).unwrap_or(seed),
        "projection complete"
    );
    results
}

/// Validate at the boundary, then project.
pub fn project_checked(
    params: &SimulationParameters,
    scenario: ScenarioTag,
) -> Result<Vec<MonthlyResult>, ParamError> {
    params.validate()?;
    Ok(project(params, scenario))
}

/// A completed projection together with the inputs that produced it.
#[derive(Debug, Clone)]
pub struct Projection {
    pub scenario: ScenarioTag,
    pub params: SimulationParameters,
    pub results: Vec<MonthlyResult>,
}

impl Projection {
    pub fn run(params: SimulationParameters, scenario: ScenarioTag) -> Self {
        let results = project(&params, scenario);
        Projection {
            scenario,
            params,
            results,
        }
    }

    /// Project a scenario with its preset parameters.
    pub fn preset(scenario: ScenarioTag) -> Self {
        Self::run(scenario.defaults(), scenario)
    }

    pub fn last(&self) -> Option<&MonthlyResult> {
        self.results.last()
    }

    /// Export the monthly series to CSV.
    pub fn save_metrics_csv(
        &self,
        path: &std::path::Path,
    ) -> Result<(), Box<dyn std::error::Error>> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut wtr = csv::Writer::from_path(path)?;
        wtr.write_record([
            "month",
            "year",
            "month_name",
            "drivers",
            "users",
            "net_new_users",
            "rides",
            "demand",
            "supply_capacity",
            "unserved_demand",
            "utilization_pct",
            "coverage_index",
            "bottleneck",
            "oversupply",
            "gross_revenue",
            "take_rate_revenue",
            "tax",
            "fixed_costs",
            "marketing",
            "tech_cost",
            "variable_costs",
            "semester_bonus",
            "annual_bonus",
            "reserve_cost",
            "net_profit",
            "accumulated_profit",
            "margin_pct",
            "cac",
            "ltv",
        ])?;

        for m in &self.results {
            wtr.write_record(&[
                m.month.to_string(),
                m.year.to_string(),
                m.month_name.clone(),
                m.drivers.to_string(),
                m.users.to_string(),
                m.net_new_users.to_string(),
                format!("{:.1}", m.rides),
                format!("{:.1}", m.demand),
                format!("{:.1}", m.supply_capacity),
                format!("{:.1}", m.unserved_demand),
                format!("{:.2}", m.utilization_pct),
                format!("{:.4}", m.coverage_index),
                m.bottleneck.to_string(),
                m.oversupply.to_string(),
                format!("{:.2}", m.gross_revenue),
                format!("{:.2}", m.take_rate_revenue),
                format!("{:.2}", m.tax),
                format!("{:.2}", m.fixed_costs),
                format!("{:.2}", m.marketing),
                format!("{:.2}", m.tech_cost),
                format!("{:.2}", m.variable_costs),
                format!("{:.2}", m.semester_bonus),
                format!("{:.2}", m.annual_bonus),
                format!("{:.2}", m.reserve_cost),
                format!("{:.2}", m.net_profit),
                format!("{:.2}", m.accumulated_profit),
                format!("{:.2}", m.margin_pct),
                format!("{:.2}", m.cac),
                format!("{:.2}", m.ltv),
            ])?;
        }
        wtr.flush()?;
        Ok(())
    }
}
