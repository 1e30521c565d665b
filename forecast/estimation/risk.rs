use serde::{Deserialize, Serialize};

use crate::{effort::EffortProfile, request::EstimationRequest};

/// The four independent risk dimensions.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum RiskDimension {
    /// Third-party and internal integration exposure.
    Integration,
    /// Seniority mix problems.
    TeamImbalance,
    /// Scope volatility.
    ScopeCreep,
    /// Unfamiliar or heavyweight stacks.
    LearningCurve,
}

impl RiskDimension {
    /// Scoring order.
    pub const ALL: [Self; 4] = [
        Self::Integration,
        Self::TeamImbalance,
        Self::ScopeCreep,
        Self::LearningCurve,
    ];

    /// Label for logging and reports.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Integration => "integration",
            Self::TeamImbalance => "team_imbalance",
            Self::ScopeCreep => "scope_creep",
            Self::LearningCurve => "learning_curve",
        }
    }
}

/// A single risk score with an optional schedule-impact note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskScore {
    /// Nominally 0-100. Learning-curve risk can dip below zero for light stacks.
    pub score: i32,
    /// Short uplift message, e.g. `+18% integration complexity`.
    pub uplift: Option<String>,
}

impl RiskScore {
    const fn plain(score: i32) -> Self {
        Self {
            score,
            uplift: None,
        }
    }

    const fn with_uplift(score: i32, uplift: String) -> Self {
        Self {
            score,
            uplift: Some(uplift),
        }
    }
}

/// Risk across all four dimensions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskProfile {
    /// Integration risk.
    pub integration: RiskScore,
    /// Team-imbalance risk.
    pub team_imbalance: RiskScore,
    /// Scope-creep risk.
    pub scope_creep: RiskScore,
    /// Learning-curve risk.
    pub learning_curve: RiskScore,
}

impl RiskProfile {
    /// Score for one dimension.
    #[must_use]
    pub const fn get(&self, dimension: RiskDimension) -> &RiskScore {
        match dimension {
            RiskDimension::Integration => &self.integration,
            RiskDimension::TeamImbalance => &self.team_imbalance,
            RiskDimension::ScopeCreep => &self.scope_creep,
            RiskDimension::LearningCurve => &self.learning_curve,
        }
    }

    /// Dimensions paired with their scores, in scoring order.
    pub fn iter(&self) -> impl Iterator<Item = (RiskDimension, &RiskScore)> + '_ {
        RiskDimension::ALL.into_iter().map(move |d| (d, self.get(d)))
    }
}

/// Scores requests. Stateless.
#[derive(Debug, Clone, Copy, Default)]
pub struct RiskScorer;

impl RiskScorer {
    /// Creates scorer.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Scores every dimension.
    #[must_use]
    pub fn score(&self, request: &EstimationRequest, profile: &EffortProfile) -> RiskProfile {
        RiskProfile {
            integration: integration_risk(request.integrations),
            team_imbalance: team_imbalance_risk(request),
            scope_creep: scope_creep_risk(request.scope_volatility),
            learning_curve: learning_curve_risk(request.complexity, profile.stack_multiplier),
        }
    }
}

/// Drops the fractional part, saturating at the `i32` bounds.
#[allow(clippy::cast_possible_truncation)]
fn truncate(value: f64) -> i32 {
    value.trunc() as i32
}

/// Truncating percentage of a score, matching how uplift figures are quoted.
fn share(score: i32, fraction: f64) -> i32 {
    truncate(f64::from(score) * fraction)
}

fn integration_risk(integrations: u32) -> RiskScore {
    let score = i32::try_from(integrations.saturating_mul(15).min(100)).unwrap_or(100);
    if score >= 60 {
        RiskScore::with_uplift(score, format!("+{}% integration complexity", share(score, 0.3)))
    } else if score >= 30 {
        RiskScore::with_uplift(score, format!("+{}% integration overhead", share(score, 0.2)))
    } else {
        RiskScore::plain(score)
    }
}

fn team_imbalance_risk(request: &EstimationRequest) -> RiskScore {
    if request.total_team() == 0 {
        return RiskScore::with_uplift(90, "+50% risk from no assigned team".into());
    }
    let junior_ratio = request.junior_ratio();
    if request.team_senior == 0 {
        RiskScore::with_uplift(80, "+40% risk from no senior oversight".into())
    } else if junior_ratio > 0.6 {
        RiskScore::with_uplift(
            truncate(70.0 * junior_ratio),
            format!("+{}% junior team velocity drag", truncate(junior_ratio * 30.0)),
        )
    } else {
        RiskScore::plain(truncate(30.0 * junior_ratio))
    }
}

fn scope_creep_risk(volatility: u8) -> RiskScore {
    let score = i32::from(volatility);
    if score >= 70 {
        RiskScore::with_uplift(score, format!("+{}% scope growth risk", share(score, 0.35)))
    } else if score >= 40 {
        RiskScore::with_uplift(
            score,
            format!("+{}% potential scope expansion", share(score, 0.25)),
        )
    } else {
        RiskScore::plain(score)
    }
}

// Light stacks (multiplier < 1.0) at complexity < 4 score below zero; that
// range is kept as-is rather than clamped.
fn learning_curve_risk(complexity: u8, stack_multiplier: f64) -> RiskScore {
    let base = truncate((stack_multiplier - 1.0) * 100.0);
    if complexity >= 4 {
        let score = (base + 30).min(100);
        RiskScore::with_uplift(score, format!("+{}% learning curve impact", share(score, 0.3)))
    } else if stack_multiplier > 1.2 {
        let score = (base + 15).min(100);
        RiskScore::with_uplift(score, format!("+{}% new stack learning", share(score, 0.2)))
    } else {
        RiskScore::plain(base)
    }
}
