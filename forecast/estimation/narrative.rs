use std::cmp::Reverse;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::{
    report::{round_to, BaselineMetrics},
    risk::RiskDimension,
    runtime::Estimate,
};

/// Risk score at or above which a dimension is treated as a likely failure driver.
pub const FAILURE_DRIVER_THRESHOLD: i32 = 60;

/// A risk dimension singled out for the failure forecast.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskDriver {
    /// Dimension.
    pub dimension: RiskDimension,
    /// Score.
    pub score: i32,
    /// Uplift note, if the scorer attached one.
    pub uplift: Option<String>,
}

/// Team head-count by seniority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamComposition {
    /// Juniors.
    pub junior: u32,
    /// Mid-levels.
    pub mid: u32,
    /// Seniors.
    pub senior: u32,
}

/// Read-only facts the narrative service turns into prose
/// (failure forecasts, executive summaries, task breakdowns).
///
/// Nothing flows back from the narrative side into the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NarrativeContext {
    /// Project name.
    pub project_name: String,
    /// Project description.
    pub description: String,
    /// Stack label as given.
    pub stack: String,
    /// Team composition.
    pub team: TeamComposition,
    /// Integration count.
    pub integrations: u32,
    /// Deadline in weeks.
    pub deadline_weeks: f64,
    /// Samples behind the percentiles.
    pub num_simulations: u32,
    /// Median completion, one decimal.
    pub p50_weeks: f64,
    /// Pessimistic completion, one decimal.
    pub p90_weeks: f64,
    /// Three decimals.
    pub on_time_probability: f64,
    /// Two decimals.
    pub p50_cost: f64,
    /// Two decimals.
    pub p90_cost: f64,
    /// Currency label.
    pub currency: String,
    /// Score per risk dimension, keyed by label.
    pub risk_scores: IndexMap<String, i32>,
    /// Role shares, two decimals.
    pub role_allocation: IndexMap<String, f64>,
    /// Effort factors.
    pub baseline: BaselineMetrics,
    /// Stress index.
    pub team_stress_index: u8,
}

impl NarrativeContext {
    /// Builds the context for a finished estimate.
    #[must_use]
    pub fn from_estimate(estimate: &Estimate) -> Self {
        let request = &estimate.request;
        let risk_scores = estimate
            .risk
            .iter()
            .map(|(dimension, score)| (dimension.label().to_string(), score.score))
            .collect();
        let role_allocation = [
            ("fe", estimate.role_allocation.fe),
            ("be", estimate.role_allocation.be),
            ("devops", estimate.role_allocation.devops),
        ]
        .into_iter()
        .map(|(role, share)| (role.to_string(), round_to(share, 2)))
        .collect();

        Self {
            project_name: request.project_name.clone(),
            description: request.description.clone(),
            stack: request.stack.clone(),
            team: TeamComposition {
                junior: request.team_junior,
                mid: request.team_mid,
                senior: request.team_senior,
            },
            integrations: request.integrations,
            deadline_weeks: request.deadline_weeks,
            num_simulations: request.num_simulations,
            p50_weeks: round_to(estimate.simulation.p50_weeks, 1),
            p90_weeks: round_to(estimate.simulation.p90_weeks, 1),
            on_time_probability: round_to(estimate.simulation.on_time_probability, 3),
            p50_cost: round_to(estimate.cost.p50_cost, 2),
            p90_cost: round_to(estimate.cost.p90_cost, 2),
            currency: estimate.cost.currency.clone(),
            risk_scores,
            role_allocation,
            baseline: BaselineMetrics::from(&estimate.effort),
            team_stress_index: estimate.stress_index,
        }
    }

    /// Dimensions at or above [`FAILURE_DRIVER_THRESHOLD`], worst first.
    /// Ties keep scoring order.
    #[must_use]
    pub fn worst_case_drivers(estimate: &Estimate) -> Vec<RiskDriver> {
        let mut drivers: Vec<RiskDriver> = estimate
            .risk
            .iter()
            .filter(|(_, score)| score.score >= FAILURE_DRIVER_THRESHOLD)
            .map(|(dimension, score)| RiskDriver {
                dimension,
                score: score.score,
                uplift: score.uplift.clone(),
            })
            .collect();
        drivers.sort_by_key(|driver| Reverse(driver.score));
        drivers
    }
}
