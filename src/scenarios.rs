use crate::params::{MarketingBudget, SimulationParameters};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Named growth/cost posture. Selects a preset bundle and the fleet cap;
/// the projection algorithm is the same for all three.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioTag {
    Realistic,
    Pessimistic,
    Optimistic,
}

impl ScenarioTag {
    pub fn all() -> Vec<ScenarioTag> {
        use ScenarioTag::*;
        vec![Realistic, Pessimistic, Optimistic]
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Realistic => "realistic",
            Self::Pessimistic => "pessimistic",
            Self::Optimistic => "optimistic",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Realistic => "Base case: steady fleet onboarding, 15% monthly user growth",
            Self::Pessimistic => "Smaller launch fleet, lower fare and slower adoption",
            Self::Optimistic => "Large launch fleet, faster onboarding and 18% user growth",
        }
    }

    /// Upper bound on active drivers. Keeps aggressive onboarding from
    /// producing an unrealistic fleet.
    pub fn fleet_cap(&self) -> u32 {
        match self {
            Self::Pessimistic => 300,
            Self::Realistic => 450,
            Self::Optimistic => 600,
        }
    }

    /// Preset parameter bundle for this scenario.
    pub fn defaults(&self) -> SimulationParameters {
        let base = SimulationParameters::default();
        match self {
            Self::Realistic => SimulationParameters {
                initial_drivers: 44,
                monthly_driver_additions: 10,
                avg_fare: 18.5,
                user_growth_pct: 15.0,
                operational_reserve_pct: 2.0,
                ..base
            },
            Self::Pessimistic => SimulationParameters {
                initial_drivers: 30,
                monthly_driver_additions: 10,
                initial_users: 1000.0,
                avg_fare: 17.5,
                user_growth_pct: 12.0,
                churn_rate_pct: 4.0,
                operational_reserve_pct: 1.0,
                marketing: MarketingBudget {
                    offline_media: 1000.0,
                    bar_partnerships: 3000.0,
                    ..MarketingBudget::default()
                },
                ..base
            },
            Self::Optimistic => SimulationParameters {
                initial_drivers: 80,
                monthly_driver_additions: 13,
                initial_users: 2500.0,
                avg_fare: 18.5,
                user_growth_pct: 18.0,
                churn_rate_pct: 2.5,
                operational_reserve_pct: 3.0,
                marketing: MarketingBudget {
                    offline_media: 4000.0,
                    bar_partnerships: 10_000.0,
                    ..MarketingBudget::default()
                },
                ..base
            },
        }
    }
}

impl fmt::Display for ScenarioTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ScenarioTag {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "realistic" | "realista" => Ok(Self::Realistic),
            "pessimistic" | "pessimista" => Ok(Self::Pessimistic),
            "optimistic" | "otimista" => Ok(Self::Optimistic),
            other => Err(format!(
                "unknown scenario '{}' (expected realistic, pessimistic or optimistic)",
                other
            )),
        }
    }
}
