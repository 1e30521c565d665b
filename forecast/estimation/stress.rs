use serde::{Deserialize, Serialize};

use crate::{
    effort::EffortProfile, monte_carlo::SimulationResult, monte_carlo::WORK_DAYS_PER_WEEK,
    request::EstimationRequest,
};

/// Stress reported when nobody is assigned.
pub const EMPTY_TEAM_STRESS: u8 = 100;

// p50/deadline ratio assumed when the deadline is not positive. Validated
// requests never reach it.
const FALLBACK_DEADLINE_RATIO: f64 = 2.0;

/// Sub-scores feeding the stress index, each capped at 100.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StressBreakdown {
    /// How far p50 eats into the deadline.
    pub timeline_compression: f64,
    /// Per-developer dev-days against available days.
    pub role_overload: f64,
    /// Coordination load per developer.
    pub parallel_density: f64,
}

impl StressBreakdown {
    /// Weighted blend, rounded and capped at 100.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn index(&self) -> u8 {
        let blended = self.timeline_compression.mul_add(
            0.4,
            self.role_overload.mul_add(0.3, self.parallel_density * 0.3),
        );
        // clamped into 0..=100 first, so the cast is exact
        blended.round().clamp(0.0, 100.0) as u8
    }
}

/// Computes the 0-100 team stress index.
#[derive(Debug, Clone, Copy, Default)]
pub struct StressIndexCalculator;

impl StressIndexCalculator {
    /// Creates calculator.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Sub-scores, or `None` for an empty team.
    #[must_use]
    pub fn breakdown(
        &self,
        request: &EstimationRequest,
        profile: &EffortProfile,
        simulation: &SimulationResult,
    ) -> Option<StressBreakdown> {
        if profile.total_team_size == 0 {
            return None;
        }
        let team = f64::from(profile.total_team_size);
        let deadline = request.deadline_weeks;

        let p50_ratio = if deadline > 0.0 {
            simulation.p50_weeks / deadline
        } else {
            FALLBACK_DEADLINE_RATIO
        };
        let available_days = (deadline * WORK_DAYS_PER_WEEK).max(1.0);
        let tasks_per_dev = profile.baseline_effort_days / team;
        let density =
            f64::from(request.complexity).mul_add(5.0, f64::from(request.integrations) * 3.0) / team;

        Some(StressBreakdown {
            timeline_compression: (p50_ratio * 80.0).min(100.0),
            role_overload: (tasks_per_dev / available_days * 100.0).min(100.0),
            parallel_density: (density * 4.0).min(100.0),
        })
    }

    /// Stress index; 100 when no developers are assigned.
    #[must_use]
    pub fn index(
        &self,
        request: &EstimationRequest,
        profile: &EffortProfile,
        simulation: &SimulationResult,
    ) -> u8 {
        self.breakdown(request, profile, simulation)
            .map_or(EMPTY_TEAM_STRESS, |breakdown| breakdown.index())
    }
}
