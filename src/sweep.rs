use crate::audit::audit_years;
use crate::financials::MonthlyResult;
use crate::output::{compute_summary, SummaryMetrics};
use crate::params::{ParamError, SimulationParameters};
use crate::projection::{project, project_checked};
use crate::report::{evaluate_viability, Verdict};
use crate::scenarios::ScenarioTag;
use indicatif::ProgressBar;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use rayon::prelude::*;

/// A parameter to sweep over.
#[derive(Debug, Clone)]
pub struct SweepParam {
    pub name: String,
    pub values: Vec<f64>,
}

/// Result of evaluating one parameter combination.
#[derive(Debug, Clone)]
pub struct SweepResult {
    pub params: Vec<(String, f64)>,
    pub scores: Vec<(ScenarioTag, f64)>,
    pub overall_score: f64,
}

/// One scenario's projection reduced to what a side-by-side view needs.
#[derive(Debug, Clone)]
pub struct ScenarioOutcome {
    pub scenario: ScenarioTag,
    pub summary: SummaryMetrics,
    pub verdict: Verdict,
    /// Net profit per calendar year.
    pub yearly_net_profit: Vec<(i32, f64)>,
    pub results: Vec<MonthlyResult>,
}

#[derive(Debug, Clone)]
pub struct ScenarioComparison {
    pub outcomes: Vec<ScenarioOutcome>,
    /// Scenario with the highest net profit in the last calendar year.
    pub best_final_year: Option<ScenarioTag>,
}

/// Distribution of outcomes under perturbed growth, churn, fare and usage.
#[derive(Debug, Clone)]
pub struct MonteCarloSummary {
    pub scenario: ScenarioTag,
    pub iterations: usize,
    pub mean_final_cash: f64,
    pub p10_final_cash: f64,
    pub p50_final_cash: f64,
    pub p90_final_cash: f64,
    /// Share of runs (0-1) that recover the investment within the horizon.
    pub payback_probability: f64,
    /// Share of runs (0-1) with at least one profitable month.
    pub break_even_probability: f64,
}

/// Runs independent projections in parallel: scenario comparisons,
/// parameter grids and seeded Monte Carlo sensitivity.
pub struct SweepEngine {
    pub seed: u64,
    /// Standard deviation of the multiplicative noise in Monte Carlo runs.
    pub noise_sigma: f64,
}

impl Default for SweepEngine {
    fn default() -> Self {
        SweepEngine {
            seed: 42,
            noise_sigma: 0.10,
        }
    }
}

impl SweepEngine {
    pub fn new(seed: u64, noise_sigma: f64) -> Self {
        SweepEngine { seed, noise_sigma }
    }

    /// Score a completed projection: final cash position. Higher = better.
    pub fn score(results: &[MonthlyResult]) -> f64 {
        results
            .last()
            .map(|r| r.accumulated_profit)
            .unwrap_or(f64::NEG_INFINITY)
    }

    /// Apply parameter overrides to a parameter set.
    fn apply_params(
        params: &mut SimulationParameters,
        overrides: &[(String, f64)],
    ) -> Result<(), ParamError> {
        for (name, val) in overrides {
            params.set_named(name, *val)?;
        }
        Ok(())
    }

    /// Generate all parameter combinations (cartesian product).
    fn cartesian_product(params: &[SweepParam]) -> Vec<Vec<(String, f64)>> {
        if params.is_empty() {
            return vec![vec![]];
        }

        let rest = Self::cartesian_product(&params[1..]);
        let mut result = Vec::new();

        for val in &params[0].values {
            for combo in &rest {
                let mut new_combo = vec![(params[0].name.clone(), *val)];
                new_combo.extend(combo.iter().cloned());
                result.push(new_combo);
            }
        }
        result
    }

    /// Project each `(scenario, parameters)` pair independently and compare.
    pub fn compare(&self, bundles: &[(ScenarioTag, SimulationParameters)]) -> ScenarioComparison {
        let outcomes: Vec<ScenarioOutcome> = bundles
            .par_iter()
            .map(|(scenario, params)| {
                let results = project(params, *scenario);
                let yearly_net_profit = audit_years(&results)
                    .iter()
                    .map(|a| (a.year, a.net_profit))
                    .collect();
                ScenarioOutcome {
                    scenario: *scenario,
                    summary: compute_summary(&results, params, *scenario),
                    verdict: evaluate_viability(&results).overall,
                    yearly_net_profit,
                    results,
                }
            })
            .collect();

        let best_final_year = outcomes
            .iter()
            .filter_map(|o| o.yearly_net_profit.last().map(|(_, net)| (o.scenario, *net)))
            .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
            .map(|(tag, _)| tag);

        tracing::debug!(scenarios = outcomes.len(), ?best_final_year, "compared scenarios");
        ScenarioComparison {
            outcomes,
            best_final_year,
        }
    }

    /// Compare the three preset bundles.
    pub fn compare_presets(&self) -> ScenarioComparison {
        let bundles: Vec<(ScenarioTag, SimulationParameters)> = ScenarioTag::all()
            .into_iter()
            .map(|tag| (tag, tag.defaults()))
            .collect();
        self.compare(&bundles)
    }

    /// Run a grid sweep: evaluate all param combos × scenarios, starting
    /// each scenario from its preset bundle.
    pub fn run_grid(
        &self,
        params: &[SweepParam],
        scenarios: &[ScenarioTag],
    ) -> Result<Vec<SweepResult>, ParamError> {
        let combos = Self::cartesian_product(params);
        tracing::info!(combinations = combos.len(), scenarios = scenarios.len(), "running grid sweep");

        let mut results: Vec<SweepResult> = combos
            .par_iter()
            .map(|combo| -> Result<SweepResult, ParamError> {
                let mut scores = Vec::new();
                let mut total = 0.0;

                for &tag in scenarios {
                    let mut config = tag.defaults();
                    Self::apply_params(&mut config, combo)?;
                    let s = Self::score(&project_checked(&config, tag)?);
                    scores.push((tag, s));
                    total += s;
                }

                Ok(SweepResult {
                    params: combo.clone(),
                    scores,
                    overall_score: if scenarios.is_empty() {
                        0.0
                    } else {
                        total / scenarios.len() as f64
                    },
                })
            })
            .collect::<Result<Vec<_>, ParamError>>()?;

        Self::sort_results(&mut results);
        Ok(results)
    }

    fn sort_results(results: &mut [SweepResult]) {
        results.sort_by(|a, b| {
            b.overall_score
                .partial_cmp(&a.overall_score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
    }

    /// Perturb growth, churn, fare and usage with multiplicative normal
    /// noise. Percentages stay within 0-100 and amounts stay non-negative.
    fn perturb(
        params: &SimulationParameters,
        noise: &Normal<f64>,
        rng: &mut StdRng,
    ) -> SimulationParameters {
        let mut p = params.clone();
        let mut jitter = |v: f64| v * (1.0 + noise.sample(rng));
        p.user_growth_pct = jitter(p.user_growth_pct).clamp(0.0, 100.0);
        p.churn_rate_pct = jitter(p.churn_rate_pct).clamp(0.0, 100.0);
        p.avg_fare = jitter(p.avg_fare).max(0.0);
        p.rides_per_user_month = jitter(p.rides_per_user_month).max(0.0);
        p
    }

    /// Seeded Monte Carlo around a parameter set. Iteration `i` uses seed
    /// `self.seed + i`, so the summary is reproducible regardless of thread
    /// scheduling.
    pub fn run_monte_carlo(
        &self,
        params: &SimulationParameters,
        scenario: ScenarioTag,
        iterations: usize,
        progress: Option<&ProgressBar>,
    ) -> Result<MonteCarloSummary, ParamError> {
        params.validate()?;
        let noise = Normal::new(0.0, self.noise_sigma)
            .map_err(|_| ParamError::NonFinite { field: "noise_sigma" })?;

        let runs: Vec<(f64, bool, bool)> = (0..iterations)
            .into_par_iter()
            .map(|i| {
                let mut rng = StdRng::seed_from_u64(self.seed.wrapping_add(i as u64));
                let perturbed = Self::perturb(params, &noise, &mut rng);
                let results = project(&perturbed, scenario);
                if let Some(pb) = progress {
                    pb.inc(1);
                }
                (
                    Self::score(&results),
                    results.iter().any(|r| r.accumulated_profit > 0.0),
                    results.iter().any(|r| r.net_profit > 0.0),
                )
            })
            .collect();

        let mut finals: Vec<f64> = runs.iter().map(|r| r.0).collect();
        finals.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        let n = runs.len().max(1) as f64;

        Ok(MonteCarloSummary {
            scenario,
            iterations,
            mean_final_cash: finals.iter().sum::<f64>() / n,
            p10_final_cash: percentile(&finals, 10.0),
            p50_final_cash: percentile(&finals, 50.0),
            p90_final_cash: percentile(&finals, 90.0),
            payback_probability: runs.iter().filter(|r| r.1).count() as f64 / n,
            break_even_probability: runs.iter().filter(|r| r.2).count() as f64 / n,
        })
    }
}

/// Nearest-rank percentile of an ascending slice. 0 for an empty slice.
pub fn percentile(sorted: &[f64], pct: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let rank = (pct.clamp(0.0, 100.0) / 100.0 * (sorted.len() - 1) as f64).round() as usize;
    sorted[rank.min(sorted.len() - 1)]
}
