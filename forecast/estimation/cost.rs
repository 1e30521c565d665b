use serde::{Deserialize, Serialize};

use crate::{config::CostConfig, monte_carlo::SimulationResult, monte_carlo::WORK_DAYS_PER_WEEK};

/// Monetary cost of the p50 and p90 timelines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostEstimate {
    /// Cost if the project lands at p50.
    pub p50_cost: f64,
    /// Cost if the project lands at p90.
    pub p90_cost: f64,
    /// Currency label.
    pub currency: String,
}

/// Timeline x team x rate.
#[derive(Debug, Clone, Default)]
pub struct CostEstimator {
    config: CostConfig,
}

impl CostEstimator {
    /// Creates an estimator with an explicit rate and currency.
    #[must_use]
    pub const fn new(config: CostConfig) -> Self {
        Self { config }
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &CostConfig {
        &self.config
    }

    /// Costs a simulated timeline for a team of `team_size`.
    #[must_use]
    pub fn estimate(&self, simulation: &SimulationResult, team_size: u32) -> CostEstimate {
        let daily_burn = f64::from(team_size) * self.config.rate_per_dev_day;
        CostEstimate {
            p50_cost: simulation.p50_weeks * WORK_DAYS_PER_WEEK * daily_burn,
            p90_cost: simulation.p90_weeks * WORK_DAYS_PER_WEEK * daily_burn,
            currency: self.config.currency.clone(),
        }
    }
}
