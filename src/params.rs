use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Errors raised when a parameter set is rejected at the boundary.
#[derive(Debug, Error, PartialEq)]
pub enum ParamError {
    #[error("{field} must be non-negative (got {value})")]
    Negative { field: &'static str, value: f64 },
    #[error("{field} must be a percentage between 0 and 100 (got {value})")]
    PercentOutOfRange { field: &'static str, value: f64 },
    #[error("{field} is not a finite number")]
    NonFinite { field: &'static str },
    #[error("unknown parameter: {0}")]
    Unknown(String),
}

/// How technology cost is charged. The two modes are mutually exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum TechFee {
    /// Flat fee per realized ride.
    PerRide { rate: f64 },
    /// Percentage (0-100) of GMV.
    PercentOfGmv { pct: f64 },
}

impl TechFee {
    /// Technology cost for a month.
    pub fn cost(&self, rides: f64, gmv: f64) -> f64 {
        match *self {
            TechFee::PerRide { rate } => rides * rate,
            TechFee::PercentOfGmv { pct } => gmv * pct / 100.0,
        }
    }
}

impl Default for TechFee {
    fn default() -> Self {
        TechFee::PerRide { rate: 0.80 }
    }
}

/// Monthly marketing budget by channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketingBudget {
    // Always-on channels
    pub base_marketing: f64,
    pub paid_traffic: f64,
    // Discretionary campaigns
    pub driver_signup_boost: f64,
    pub offline_media: f64,
    pub bar_partnerships: f64,
    pub referral_program: f64,
    pub commercial_team: f64,
}

impl Default for MarketingBudget {
    fn default() -> Self {
        MarketingBudget {
            base_marketing: 5000.0,
            paid_traffic: 4000.0,
            driver_signup_boost: 3000.0,
            offline_media: 2000.0,
            bar_partnerships: 6000.0,
            referral_program: 1500.0,
            commercial_team: 8000.0,
        }
    }
}

impl MarketingBudget {
    pub fn always_on(&self) -> f64 {
        self.base_marketing + self.paid_traffic
    }

    pub fn discretionary(&self) -> f64 {
        self.driver_signup_boost
            + self.offline_media
            + self.bar_partnerships
            + self.referral_program
            + self.commercial_team
    }

    /// Spend for a month. Suspending campaigns zeroes the discretionary
    /// channels only.
    pub fn monthly_total(&self, campaigns_suspended: bool) -> f64 {
        if campaigns_suspended {
            self.always_on()
        } else {
            self.always_on() + self.discretionary()
        }
    }
}

/// Caller-owned inputs of a projection. Percentages are stored as 0-100 and
/// divided by 100 where they are used.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationParameters {
    // Fleet
    pub initial_drivers: u32,
    pub monthly_driver_additions: u32,
    /// Coverage index used to seed the user base when `initial_users` is 0.
    pub min_coverage_ratio: f64,

    // Demand
    /// Users at month 0. When 0 the seed is derived from the fleet.
    pub initial_users: f64,
    pub rides_per_user_month: f64,
    pub user_growth_pct: f64,
    pub churn_rate_pct: f64,
    pub avg_fare: f64,

    // Revenue split
    pub take_rate_pct: f64,
    pub tax_pct: f64,

    // Costs
    pub fixed_costs: f64,
    pub variable_cost_per_ride: f64,
    pub tech_fee: TechFee,
    pub marketing: MarketingBudget,
    pub campaigns_suspended: bool,

    // Fidelity programs
    pub semester_driver_bonus: f64,
    pub annual_passenger_bonus: f64,
    /// Cashback-style accrual on take-rate revenue.
    pub operational_reserve_pct: f64,

    // Capital
    pub initial_investment: f64,
}

impl Default for SimulationParameters {
    fn default() -> Self {
        SimulationParameters {
            initial_drivers: 44,
            monthly_driver_additions: 10,
            min_coverage_ratio: 1.0,
            initial_users: 1500.0,
            rides_per_user_month: 4.2,
            user_growth_pct: 15.0,
            churn_rate_pct: 3.0,
            avg_fare: 18.5,
            take_rate_pct: 15.0,
            tax_pct: 6.0,
            fixed_costs: 8000.0,
            variable_cost_per_ride: 1.35,
            tech_fee: TechFee::default(),
            marketing: MarketingBudget::default(),
            campaigns_suspended: false,
            semester_driver_bonus: 10_000.0,
            annual_passenger_bonus: 5000.0,
            operational_reserve_pct: 2.0,
            initial_investment: 0.0,
        }
    }
}

/// Names accepted by [`SimulationParameters::set_named`].
pub const TUNABLE_PARAMS: &[&str] = &[
    "initial_drivers",
    "monthly_driver_additions",
    "min_coverage_ratio",
    "initial_users",
    "rides_per_user_month",
    "user_growth_pct",
    "churn_rate_pct",
    "avg_fare",
    "take_rate_pct",
    "tax_pct",
    "fixed_costs",
    "variable_cost_per_ride",
    "tech_fee",
    "base_marketing",
    "paid_traffic",
    "driver_signup_boost",
    "offline_media",
    "bar_partnerships",
    "referral_program",
    "commercial_team",
    "semester_driver_bonus",
    "annual_passenger_bonus",
    "operational_reserve_pct",
    "initial_investment",
];

impl SimulationParameters {
    fn amounts(&self) -> [(&'static str, f64); 15] {
        let tech = match self.tech_fee {
            TechFee::PerRide { rate } => rate,
            TechFee::PercentOfGmv { .. } => 0.0,
        };
        [
            ("min_coverage_ratio", self.min_coverage_ratio),
            ("initial_users", self.initial_users),
            ("rides_per_user_month", self.rides_per_user_month),
            ("avg_fare", self.avg_fare),
            ("fixed_costs", self.fixed_costs),
            ("variable_cost_per_ride", self.variable_cost_per_ride),
            ("tech_fee.rate", tech),
            ("marketing.base_marketing", self.marketing.base_marketing),
            ("marketing.paid_traffic", self.marketing.paid_traffic),
            ("marketing.driver_signup_boost", self.marketing.driver_signup_boost),
            ("marketing.offline_media", self.marketing.offline_media),
            ("marketing.bar_partnerships", self.marketing.bar_partnerships),
            ("marketing.referral_program", self.marketing.referral_program),
            ("marketing.commercial_team", self.marketing.commercial_team),
            ("semester_driver_bonus", self.semester_driver_bonus),
        ]
    }

    fn percentages(&self) -> [(&'static str, f64); 6] {
        let tech = match self.tech_fee {
            TechFee::PercentOfGmv { pct } => pct,
            TechFee::PerRide { .. } => 0.0,
        };
        [
            ("user_growth_pct", self.user_growth_pct),
            ("churn_rate_pct", self.churn_rate_pct),
            ("take_rate_pct", self.take_rate_pct),
            ("tax_pct", self.tax_pct),
            ("operational_reserve_pct", self.operational_reserve_pct),
            ("tech_fee.pct", tech),
        ]
    }

    /// Reject parameter sets the engine does not accept: non-finite values,
    /// negative amounts and percentages outside 0-100.
    pub fn validate(&self) -> Result<(), ParamError> {
        let extra = [
            ("annual_passenger_bonus", self.annual_passenger_bonus),
            ("initial_investment", self.initial_investment),
        ];
        for (field, value) in self.amounts().into_iter().chain(extra) {
            if !value.is_finite() {
                return Err(ParamError::NonFinite { field });
            }
            if value < 0.0 {
                return Err(ParamError::Negative { field, value });
            }
        }
        for (field, value) in self.percentages() {
            if !value.is_finite() {
                return Err(ParamError::NonFinite { field });
            }
            if !(0.0..=100.0).contains(&value) {
                return Err(ParamError::PercentOutOfRange { field, value });
            }
        }
        Ok(())
    }

    /// Total marketing spend for one month.
    pub fn marketing_total(&self) -> f64 {
        self.marketing.monthly_total(self.campaigns_suspended)
    }

    /// Override a single parameter by name. Counts are rounded to whole
    /// drivers; negative or non-finite counts are rejected. `tech_fee` replaces the value of whichever mode is active.
    pub fn set_named(&mut self, name: &str, value: f64) -> Result<(), ParamError> {
        let count = |field: &'static str, v: f64| -> Result<u32, ParamError> {
            if !v.is_finite() {
                return Err(ParamError::NonFinite { field });
            }
            if v < 0.0 {
                return Err(ParamError::Negative { field, value: v });
            }
            Ok(v.round().min(u32::MAX as f64) as u32)
        };
        match name {
            "initial_drivers" => self.initial_drivers = count("initial_drivers", value)?,
            "monthly_driver_additions" => {
                self.monthly_driver_additions = count("monthly_driver_additions", value)?
            }
            "min_coverage_ratio" => self.min_coverage_ratio = value,
            "initial_users" => self.initial_users = value,
            "rides_per_user_month" => self.rides_per_user_month = value,
            "user_growth_pct" => self.user_growth_pct = value,
            "churn_rate_pct" => self.churn_rate_pct = value,
            "avg_fare" => self.avg_fare = value,
            "take_rate_pct" => self.take_rate_pct = value,
            "tax_pct" => self.tax_pct = value,
            "fixed_costs" => self.fixed_costs = value,
            "variable_cost_per_ride" => self.variable_cost_per_ride = value,
            "tech_fee" => {
                self.tech_fee = match self.tech_fee {
                    TechFee::PerRide { .. } => TechFee::PerRide { rate: value },
                    TechFee::PercentOfGmv { .. } => TechFee::PercentOfGmv { pct: value },
                }
            }
            "base_marketing" => self.marketing.base_marketing = value,
            "paid_traffic" => self.marketing.paid_traffic = value,
            "driver_signup_boost" => self.marketing.driver_signup_boost = value,
            "offline_media" => self.marketing.offline_media = value,
            "bar_partnerships" => self.marketing.bar_partnerships = value,
            "referral_program" => self.marketing.referral_program = value,
            "commercial_team" => self.marketing.commercial_team = value,
            "semester_driver_bonus" => self.semester_driver_bonus = value,
            "annual_passenger_bonus" => self.annual_passenger_bonus = value,
            "operational_reserve_pct" => self.operational_reserve_pct = value,
            "initial_investment" => self.initial_investment = value,
            _ => return Err(ParamError::Unknown(name.to_string())),
        }
        Ok(())
    }

    /// Read the numeric value of a tunable parameter.
    pub fn get_named(&self, name: &str) -> Option<f64> {
        let v = match name {
            "initial_drivers" => self.initial_drivers as f64,
            "monthly_driver_additions" => self.monthly_driver_additions as f64,
            "min_coverage_ratio" => self.min_coverage_ratio,
            "initial_users" => self.initial_users,
            "rides_per_user_month" => self.rides_per_user_month,
            "user_growth_pct" => self.user_growth_pct,
            "churn_rate_pct" => self.churn_rate_pct,
            "avg_fare" => self.avg_fare,
            "take_rate_pct" => self.take_rate_pct,
            "tax_pct" => self.tax_pct,
            "fixed_costs" => self.fixed_costs,
            "variable_cost_per_ride" => self.variable_cost_per_ride,
            "tech_fee" => match self.tech_fee {
                TechFee::PerRide { rate } => rate,
                TechFee::PercentOfGmv { pct } => pct,
            },
            "base_marketing" => self.marketing.base_marketing,
            "paid_traffic" => self.marketing.paid_traffic,
            "driver_signup_boost" => self.marketing.driver_signup_boost,
            "offline_media" => self.marketing.offline_media,
            "bar_partnerships" => self.marketing.bar_partnerships,
            "referral_program" => self.marketing.referral_program,
            "commercial_team" => self.marketing.commercial_team,
            "semester_driver_bonus" => self.semester_driver_bonus,
            "annual_passenger_bonus" => self.annual_passenger_bonus,
            "operational_reserve_pct" => self.operational_reserve_pct,
            "initial_investment" => self.initial_investment,
            _ => return None,
        };
        Some(v)
    }
}

/// Load a parameter file. Fields missing from the file fall back to
/// `base`, so a file only needs the values it changes.
pub fn load_toml(
    path: &Path,
    base: &SimulationParameters,
) -> Result<SimulationParameters, Box<dyn std::error::Error>> {
    let text = std::fs::read_to_string(path)?;
    let mut merged = toml::Value::try_from(base)?;
    let overrides: toml::Value = toml::from_str(&text)?;
    merge_toml(&mut merged, overrides);
    let params: SimulationParameters = merged.try_into()?;
    params.validate()?;
    tracing::debug!(path = %path.display(), "loaded parameters");
    Ok(params)
}

fn merge_toml(base: &mut toml::Value, overrides: toml::Value) {
    match (base, overrides) {
        (toml::Value::Table(b), toml::Value::Table(o)) => {
            for (key, value) in o {
                match b.get_mut(&key) {
                    // tech_fee is a tagged enum: replace it whole
                    Some(existing) if key != "tech_fee" => merge_toml(existing, value),
                    _ => {
                        b.insert(key, value);
                    }
                }
            }
        }
        (b, o) => *b = o,
    }
}

/// Write a parameter set as TOML.
pub fn save_toml(
    params: &SimulationParameters,
    path: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, toml::to_string_pretty(params)?)?;
    Ok(())
}
