use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

use ride_viability::market;
use ride_viability::output;
use ride_viability::params::{self, SimulationParameters};
use ride_viability::report;
use ride_viability::scenarios::ScenarioTag;
use ride_viability::sweep::{SweepEngine, SweepParam};
use ride_viability::Projection;

#[derive(Parser)]
#[command(
    name = "ride-viability",
    about = "36-month viability simulator for a ride-hailing launch"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Project one scenario and save its outputs
    Run {
        /// Scenario preset (realistic, pessimistic, optimistic)
        #[arg(long, default_value = "realistic")]
        scenario: ScenarioTag,

        /// TOML file overriding preset parameters
        #[arg(long)]
        params: Option<PathBuf>,

        /// Output directory
        #[arg(long, default_value = "output/run")]
        output_dir: String,
    },

    /// Project all three presets side by side
    Compare {
        /// Output directory
        #[arg(long, default_value = "output/compare")]
        output_dir: String,
    },

    /// Sweep one parameter over a list of values
    Sweep {
        /// Scenario preset, or "all"
        #[arg(long, default_value = "all")]
        scenario: String,

        /// Parameter to sweep (e.g. "avg_fare")
        #[arg(long)]
        param: String,

        /// Comma-separated values to sweep
        #[arg(long)]
        values: String,

        /// Output directory for sweep results
        #[arg(long, default_value = "output/sweep")]
        output_dir: String,
    },

    /// Monte Carlo sensitivity on growth, churn, fare and usage
    MonteCarlo {
        #[arg(long, default_value = "realistic")]
        scenario: ScenarioTag,

        /// TOML file overriding preset parameters
        #[arg(long)]
        params: Option<PathBuf>,

        #[arg(long, default_value = "1000")]
        iterations: usize,

        /// Standard deviation of the multiplicative noise
        #[arg(long, default_value = "0.1")]
        sigma: f64,

        /// Random seed
        #[arg(long, default_value = "42")]
        seed: u64,
    },

    /// Write the preset parameter bundles as TOML
    Presets {
        #[arg(long, default_value = "presets")]
        output_dir: String,
    },

    /// Market sizing and per-ride unit economics
    Market {
        /// City population
        #[arg(long, default_value_t = market::CITY_POPULATION)]
        population: u64,

        /// Digitally reachable share of the population (%)
        #[arg(long, default_value_t = market::DEFAULT_SAM_PCT)]
        sam_pct: f64,

        /// Target market share (%)
        #[arg(long, default_value = "15")]
        share_pct: f64,

        /// Average fare
        #[arg(long, default_value = "18.5")]
        fare: f64,

        /// Platform take rate (%)
        #[arg(long, default_value = "15")]
        take_rate_pct: f64,
    },
}

fn boxed(e: Box<dyn std::error::Error>) -> anyhow::Error {
    anyhow!("{}", e)
}

fn load_params(scenario: ScenarioTag, path: Option<&Path>) -> Result<SimulationParameters> {
    let preset = scenario.defaults();
    match path {
        Some(p) => params::load_toml(p, &preset)
            .map_err(boxed)
            .with_context(|| format!("loading parameters from {}", p.display())),
        None => Ok(preset),
    }
}

fn run_projection(projection: &Projection, output_dir: &Path) -> Result<report::Verdict> {
    let text = report::generate_report(projection);
    output::save_all(projection, output_dir).map_err(boxed)?;
    report::save_report(&text, &output_dir.join("report.txt")).map_err(boxed)?;

    let summary = output::compute_summary(
        &projection.results,
        &projection.params,
        projection.scenario,
    );
    let verdict = report::evaluate_viability(&projection.results);

    println!(
        "  [{}] {}: GMV={:.2}, profit={:.2}, break-even={}, payback={} -> {}",
        verdict.overall.label(),
        projection.scenario.name(),
        summary.total_gross_revenue,
        summary.total_net_profit,
        summary
            .break_even_month
            .map(|m| m.to_string())
            .unwrap_or_else(|| "-".into()),
        summary
            .payback_month
            .map(|m| m.to_string())
            .unwrap_or_else(|| "-".into()),
        output_dir.display()
    );
    Ok(verdict.overall)
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            scenario,
            params,
            output_dir,
        } => {
            let p = load_params(scenario, params.as_deref())?;
            p.validate()?;
            info!(scenario = scenario.name(), "running projection");

            let projection = Projection::run(p, scenario);
            run_projection(&projection, &PathBuf::from(&output_dir))?;
            println!();
            print!("{}", report::generate_report(&projection));
        }

        Commands::Compare { output_dir } => {
            println!("Comparing {} scenarios:", ScenarioTag::all().len());
            let engine = SweepEngine::default();
            let comparison = engine.compare_presets();

            for outcome in &comparison.outcomes {
                let projection = Projection {
                    scenario: outcome.scenario,
                    params: outcome.scenario.defaults(),
                    results: outcome.results.clone(),
                };
                let dir = PathBuf::from(&output_dir).join(outcome.scenario.name());
                run_projection(&projection, &dir)?;
            }

            println!("\nNet profit by year:");
            for outcome in &comparison.outcomes {
                let years: Vec<String> = outcome
                    .yearly_net_profit
                    .iter()
                    .map(|(y, v)| format!("{}={:.2}", y, v))
                    .collect();
                println!("  {:<12} {}", outcome.scenario.name(), years.join(", "));
            }
            if let Some(best) = comparison.best_final_year {
                println!("\nBest final year: {}", best.name());
            }
        }

        Commands::Sweep {
            scenario,
            param,
            values,
            output_dir,
        } => {
            let values: Vec<f64> = values
                .split(',')
                .map(|v| {
                    v.trim()
                        .parse::<f64>()
                        .with_context(|| format!("invalid sweep value '{}'", v))
                })
                .collect::<Result<_>>()?;
            let scenarios = if scenario == "all" {
                ScenarioTag::all()
            } else {
                vec![scenario.parse::<ScenarioTag>().map_err(|e| anyhow!(e))?]
            };

            println!("Sweeping {} over {:?}", param, values);
            let engine = SweepEngine::default();
            let results = engine.run_grid(
                &[SweepParam {
                    name: param.clone(),
                    values,
                }],
                &scenarios,
            )?;

            let out_path = PathBuf::from(&output_dir).join(format!("{}.csv", param));
            output::save_sweep_results(&results, &out_path).map_err(boxed)?;

            for r in &results {
                println!(
                    "  {}={:.4}: mean final cash {:.2}",
                    param, r.params[0].1, r.overall_score
                );
            }
            println!("Saved sweep results to {}", out_path.display());
        }

        Commands::MonteCarlo {
            scenario,
            params,
            iterations,
            sigma,
            seed,
        } => {
            let p = load_params(scenario, params.as_deref())?;
            let engine = SweepEngine::new(seed, sigma);

            let pb = ProgressBar::new(iterations as u64);
            pb.set_style(
                ProgressStyle::with_template("{bar:40} {pos}/{len} runs ({eta})")
                    .unwrap_or_else(|_| ProgressStyle::default_bar()),
            );
            let summary = engine.run_monte_carlo(&p, scenario, iterations, Some(&pb))?;
            pb.finish_and_clear();

            println!(
                "Monte Carlo: {} ({} runs, sigma={:.2}, seed={})",
                scenario.name(),
                summary.iterations,
                sigma,
                seed
            );
            println!("  Final cash mean : {:.2}", summary.mean_final_cash);
            println!("  Final cash P10  : {:.2}", summary.p10_final_cash);
            println!("  Final cash P50  : {:.2}", summary.p50_final_cash);
            println!("  Final cash P90  : {:.2}", summary.p90_final_cash);
            println!("  P(payback)      : {:.1}%", summary.payback_probability * 100.0);
            println!("  P(break-even)   : {:.1}%", summary.break_even_probability * 100.0);
        }

        Commands::Presets { output_dir } => {
            for tag in ScenarioTag::all() {
                let path = PathBuf::from(&output_dir).join(format!("{}.toml", tag.name()));
                params::save_toml(&tag.defaults(), &path).map_err(boxed)?;
                println!("  {} -> {}", tag.name(), path.display());
            }
        }

        Commands::Market {
            population,
            sam_pct,
            share_pct,
            fare,
            take_rate_pct,
        } => {
            let size = market::tam_sam_som(population, sam_pct, share_pct);
            println!("Market: TAM={} SAM={} SOM={}", size.tam, size.sam, size.som);

            let ride = market::ride_economics(fare, take_rate_pct);
            println!("Ride at {:.2}:", ride.fare);
            println!("  Gateway          : {:.2}", ride.gateway);
            println!("  Insurance        : {:.2}", ride.insurance);
            println!("  Maintenance      : {:.2}", ride.maintenance);
            println!("  Legal provision  : {:.2}", ride.legal_provision);
            println!("  Operating margin : {:.2}", ride.operating_margin);
            println!("  Platform         : {:.2}", ride.platform_commission);
            println!("  Driver payout    : {:.2}", ride.driver_payout);
        }
    }

    Ok(())
}
