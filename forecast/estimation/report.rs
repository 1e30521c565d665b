use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    effort::EffortProfile,
    monte_carlo::HistogramBucket,
    risk::RiskProfile,
    runtime::Estimate,
};

/// Rounds half away from zero to `places` decimals.
#[must_use]
pub fn round_to(value: f64, places: i32) -> f64 {
    let scale = 10f64.powi(places);
    (value * scale).round() / scale
}

/// Effort factors as reported to clients.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BaselineMetrics {
    /// Baseline dev-days, one decimal.
    pub base_effort_days: f64,
    /// Stack multiplier.
    pub wsci: f64,
    /// Integration multiplier, two decimals.
    pub integration_multiplier: f64,
    /// Experience factor, two decimals.
    pub experience_factor: f64,
    /// Dependency penalty, two decimals.
    pub dependency_penalty: f64,
}

impl From<&EffortProfile> for BaselineMetrics {
    fn from(profile: &EffortProfile) -> Self {
        Self {
            base_effort_days: round_to(profile.baseline_effort_days, 1),
            wsci: profile.stack_multiplier,
            integration_multiplier: round_to(profile.integration_multiplier, 2),
            experience_factor: round_to(profile.experience_factor, 2),
            dependency_penalty: round_to(profile.dependency_penalty, 2),
        }
    }
}

/// Response payload for a finished estimate. Raw samples are left out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EstimateReport {
    /// Unique report id.
    pub report_id: Uuid,
    /// Three decimals.
    pub on_time_probability: f64,
    /// One decimal.
    pub expected_overrun_days: f64,
    /// One decimal.
    pub p50_weeks: f64,
    /// One decimal.
    pub p90_weeks: f64,
    /// Bucket centers to one decimal.
    pub histogram: Vec<HistogramBucket>,
    /// Risk scores with uplift notes.
    pub risk_scores: RiskProfile,
    /// 0-100.
    pub team_stress_index: u8,
    /// Two decimals.
    pub p50_cost: f64,
    /// Two decimals.
    pub p90_cost: f64,
    /// Currency label.
    pub currency: String,
    /// `fe`/`be`/`devops` shares, two decimals.
    pub role_allocation: IndexMap<String, f64>,
    /// Effort factors.
    pub baseline_metrics: BaselineMetrics,
    /// Creation time.
    pub generated_at: DateTime<Utc>,
}

impl EstimateReport {
    /// Rounds an estimate into its response shape.
    #[must_use]
    pub fn from_estimate(estimate: &Estimate) -> Self {
        let sim = &estimate.simulation;
        let mut role_allocation = IndexMap::new();
        role_allocation.insert("fe".to_string(), round_to(estimate.role_allocation.fe, 2));
        role_allocation.insert("be".to_string(), round_to(estimate.role_allocation.be, 2));
        role_allocation.insert(
            "devops".to_string(),
            round_to(estimate.role_allocation.devops, 2),
        );
        Self {
            report_id: Uuid::new_v4(),
            on_time_probability: round_to(sim.on_time_probability, 3),
            expected_overrun_days: round_to(sim.expected_overrun_days, 1),
            p50_weeks: round_to(sim.p50_weeks, 1),
            p90_weeks: round_to(sim.p90_weeks, 1),
            histogram: sim
                .histogram
                .iter()
                .map(|bucket| HistogramBucket {
                    bucket_center_weeks: round_to(bucket.bucket_center_weeks, 1),
                    count: bucket.count,
                })
                .collect(),
            risk_scores: estimate.risk.clone(),
            team_stress_index: estimate.stress_index,
            p50_cost: round_to(estimate.cost.p50_cost, 2),
            p90_cost: round_to(estimate.cost.p90_cost, 2),
            currency: estimate.cost.currency.clone(),
            role_allocation,
            baseline_metrics: BaselineMetrics::from(&estimate.effort),
            generated_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounds_half_away_from_zero() {
        assert!((round_to(235.093, 1) - 235.1).abs() < 1e-9);
        assert!((round_to(1.266_666, 2) - 1.27).abs() < 1e-9);
        assert!((round_to(0.4567, 3) - 0.457).abs() < 1e-9);
    }

    #[test]
    fn baseline_metrics_round_factors() {
        let profile = EffortProfile {
            base_days: 160.0,
            baseline_effort_days: 705.28 / 3.0,
            stack_multiplier: 1.0,
            integration_multiplier: 1.16,
            experience_factor: 3.8 / 3.0,
            dependency_penalty: 1.0,
            scope_volatility_factor: 0.0,
            total_team_size: 3,
        };
        let metrics = BaselineMetrics::from(&profile);
        assert!((metrics.base_effort_days - 235.1).abs() < 1e-9);
        assert!((metrics.experience_factor - 1.27).abs() < 1e-9);
        assert!((metrics.integration_multiplier - 1.16).abs() < 1e-9);
    }
}
