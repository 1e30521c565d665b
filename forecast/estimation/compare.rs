use serde::{Deserialize, Serialize};

use crate::{monte_carlo::SimulationResult, report::EstimateReport, request::EstimationRequest};

/// Adjustments applied to a baseline request to explore a what-if scenario.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WhatIfAdjustment {
    /// Seniors added (or removed, if negative).
    #[serde(default)]
    pub senior_delta: i32,
    /// Integrations added or removed.
    #[serde(default)]
    pub integrations_delta: i32,
    /// Weeks added to or removed from the deadline.
    #[serde(default)]
    pub deadline_delta: i32,
}

impl WhatIfAdjustment {
    /// True when nothing changes.
    #[must_use]
    pub const fn is_noop(&self) -> bool {
        self.senior_delta == 0 && self.integrations_delta == 0 && self.deadline_delta == 0
    }

    /// Scenario request. Counts saturate at zero; the deadline never drops below one week.
    #[must_use]
    pub fn apply(&self, baseline: &EstimationRequest) -> EstimationRequest {
        let mut scenario = baseline.clone();
        scenario.team_senior = baseline.team_senior.saturating_add_signed(self.senior_delta);
        scenario.integrations = baseline
            .integrations
            .saturating_add_signed(self.integrations_delta);
        scenario.deadline_weeks = (baseline.deadline_weeks + f64::from(self.deadline_delta)).max(1.0);
        scenario
    }
}

/// Whether a metric improves when it goes up or down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Polarity {
    /// Larger is better.
    HigherIsBetter,
    /// Smaller is better.
    LowerIsBetter,
}

/// Change in one headline metric between baseline and scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricDelta {
    /// Metric name.
    pub metric: String,
    /// Baseline value.
    pub baseline: f64,
    /// Scenario value.
    pub scenario: f64,
    /// `scenario - baseline`.
    pub delta: f64,
    /// Direction of goodness.
    pub polarity: Polarity,
    /// Strictly better in the scenario.
    pub improved: bool,
}

impl MetricDelta {
    fn new(metric: &str, baseline: f64, scenario: f64, polarity: Polarity) -> Self {
        let delta = scenario - baseline;
        let improved = match polarity {
            Polarity::HigherIsBetter => delta > 0.0,
            Polarity::LowerIsBetter => delta < 0.0,
        };
        Self {
            metric: metric.to_string(),
            baseline,
            scenario,
            delta,
            polarity,
            improved,
        }
    }
}

/// Baseline and what-if estimates side by side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioComparison {
    /// Adjustment that produced the scenario.
    pub adjustment: WhatIfAdjustment,
    /// Baseline report.
    pub baseline: EstimateReport,
    /// Scenario report.
    pub scenario: EstimateReport,
    /// Headline metric deltas.
    pub deltas: Vec<MetricDelta>,
}

impl ScenarioComparison {
    /// Number of headline metrics that got better.
    #[must_use]
    pub fn improvements(&self) -> usize {
        self.deltas.iter().filter(|d| d.improved).count()
    }
}

/// Compares the headline simulation metrics.
#[must_use]
pub fn compare(baseline: &SimulationResult, scenario: &SimulationResult) -> Vec<MetricDelta> {
    vec![
        MetricDelta::new(
            "on_time_probability",
            baseline.on_time_probability,
            scenario.on_time_probability,
            Polarity::HigherIsBetter,
        ),
        MetricDelta::new(
            "p50_weeks",
            baseline.p50_weeks,
            scenario.p50_weeks,
            Polarity::LowerIsBetter,
        ),
        MetricDelta::new(
            "p90_weeks",
            baseline.p90_weeks,
            scenario.p90_weeks,
            Polarity::LowerIsBetter,
        ),
        MetricDelta::new(
            "expected_overrun_days",
            baseline.expected_overrun_days,
            scenario.expected_overrun_days,
            Polarity::LowerIsBetter,
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monte_carlo::aggregate;

    #[test]
    fn apply_saturates_counts_and_floors_deadline() {
        let baseline = EstimationRequest::builder()
            .team(1, 1, 1)
            .integrations(2)
            .deadline_weeks(3.0)
            .build()
            .unwrap();
        let adjustment = WhatIfAdjustment {
            senior_delta: -4,
            integrations_delta: 3,
            deadline_delta: -10,
        };
        let scenario = adjustment.apply(&baseline);
        assert_eq!(scenario.team_senior, 0);
        assert_eq!(scenario.integrations, 5);
        assert!((scenario.deadline_weeks - 1.0).abs() < f64::EPSILON);
        assert!(scenario.validate().is_ok());
        assert!(!adjustment.is_noop());
        assert!(WhatIfAdjustment::default().is_noop());
    }

    #[test]
    fn deltas_respect_polarity() {
        let baseline = aggregate(vec![9.0, 11.0, 13.0], 10.0);
        let scenario = aggregate(vec![8.0, 9.0, 10.5], 10.0);
        let deltas = compare(&baseline, &scenario);
        assert_eq!(deltas.len(), 4);
        assert!(deltas.iter().all(|d| d.improved));
        assert_eq!(deltas[0].polarity, Polarity::HigherIsBetter);
        assert!(deltas[1].delta < 0.0);

        let unchanged = compare(&baseline, &baseline);
        assert!(unchanged.iter().all(|d| !d.improved));
    }
}
