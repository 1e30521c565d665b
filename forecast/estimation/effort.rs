use serde::{Deserialize, Serialize};

use crate::request::{EstimationRequest, ScopeSize};

/// Multiplier applied to unrecognised stack labels.
pub const DEFAULT_STACK_MULTIPLIER: f64 = 1.0;

/// Experience factor used when no developers are assigned.
pub const EMPTY_TEAM_EXPERIENCE_FACTOR: f64 = 1.5;

/// Weighted stack complexity index, keyed by normalised stack label.
const STACK_MULTIPLIERS: &[(&str, f64)] = &[
    ("react", 1.0),
    ("react + node", 1.2),
    ("react + python", 1.15),
    ("next.js", 1.25),
    ("vue", 0.95),
    ("vue + node", 1.15),
    ("angular", 1.3),
    ("python monolith", 1.0),
    ("django", 1.1),
    ("flask", 0.95),
    ("fastapi", 0.9),
    ("ruby on rails", 1.2),
    ("laravel", 1.15),
    ("spring boot", 1.4),
    (".net", 1.35),
    ("go", 0.85),
    ("rust", 1.5),
];

const SENIOR_WEIGHT: f64 = 1.0;
const MID_WEIGHT: f64 = 1.2;
const JUNIOR_WEIGHT: f64 = 1.6;

/// Per-scope (base dev-days, dev-days per complexity point).
const fn scope_constants(scope: ScopeSize) -> (f64, f64) {
    match scope {
        ScopeSize::Small => (50.0, 10.0),
        ScopeSize::Medium => (100.0, 20.0),
        ScopeSize::Large => (200.0, 40.0),
    }
}

/// Deterministic effort baseline and the factors that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EffortProfile {
    /// Scope/complexity dev-days before any multiplier.
    pub base_days: f64,
    /// Final team effort in dev-days.
    pub baseline_effort_days: f64,
    /// Weighted stack complexity index.
    pub stack_multiplier: f64,
    /// Integration multiplier.
    pub integration_multiplier: f64,
    /// Seniority-mix multiplier.
    pub experience_factor: f64,
    /// Dependency-clustering penalty.
    pub dependency_penalty: f64,
    /// Scope volatility as a 0-1 fraction. Shapes variance only.
    pub scope_volatility_factor: f64,
    /// Total developers, possibly zero.
    pub total_team_size: u32,
}

/// Computes [`EffortProfile`]s. Stateless.
#[derive(Debug, Clone, Copy, Default)]
pub struct EffortModel;

impl EffortModel {
    /// Creates the model.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Derives the baseline and its factors from a request.
    #[must_use]
    pub fn profile(&self, request: &EstimationRequest) -> EffortProfile {
        let (base, per_point) = scope_constants(request.scope_size);
        let base_days = per_point.mul_add(f64::from(request.complexity), base);
        let stack_multiplier = stack_multiplier(&request.stack);
        let integration_multiplier = integration_multiplier(request.integrations);
        let experience_factor = experience_factor(request);
        let dependency_penalty = dependency_penalty(request.complexity, request.integrations);

        EffortProfile {
            base_days,
            baseline_effort_days: base_days
                * stack_multiplier
                * integration_multiplier
                * experience_factor
                * dependency_penalty,
            stack_multiplier,
            integration_multiplier,
            experience_factor,
            dependency_penalty,
            scope_volatility_factor: f64::from(request.scope_volatility) / 100.0,
            total_team_size: request.total_team(),
        }
    }
}

/// Looks up the stack multiplier for a label, ignoring case and surrounding whitespace.
#[must_use]
pub fn stack_multiplier(stack: &str) -> f64 {
    let key = stack.trim().to_lowercase();
    STACK_MULTIPLIERS
        .iter()
        .find(|(label, _)| *label == key)
        .map_or(DEFAULT_STACK_MULTIPLIER, |(_, multiplier)| *multiplier)
}

/// `1 + 0.08 per integration`, plus a flat 0.15 once there are more than four.
#[must_use]
pub fn integration_multiplier(integrations: u32) -> f64 {
    let mut multiplier = f64::from(integrations).mul_add(0.08, 1.0);
    if integrations > 4 {
        multiplier += 0.15;
    }
    multiplier
}

fn experience_factor(request: &EstimationRequest) -> f64 {
    if request.total_team() == 0 {
        return EMPTY_TEAM_EXPERIENCE_FACTOR;
    }
    request.senior_ratio().mul_add(
        SENIOR_WEIGHT,
        request
            .mid_ratio()
            .mul_add(MID_WEIGHT, request.junior_ratio() * JUNIOR_WEIGHT),
    )
}

/// First matching tier wins.
const fn dependency_penalty(complexity: u8, integrations: u32) -> f64 {
    if complexity >= 4 && integrations >= 3 {
        1.20
    } else if complexity >= 3 && integrations >= 5 {
        1.15
    } else {
        1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64, tol: f64) -> bool {
        (a - b).abs() < tol
    }

    #[test]
    fn medium_react_balanced_team() {
        let request = EstimationRequest::builder()
            .scope(ScopeSize::Medium)
            .complexity(3)
            .stack("react")
            .team(1, 1, 1)
            .integrations(2)
            .deadline_weeks(10.0)
            .build()
            .unwrap();
        let profile = EffortModel::new().profile(&request);
        assert!(close(profile.base_days, 160.0, 1e-9));
        assert!(close(profile.stack_multiplier, 1.0, 1e-12));
        assert!(close(profile.integration_multiplier, 1.16, 1e-9));
        assert!(close(profile.experience_factor, 3.8 / 3.0, 1e-9));
        assert!(close(profile.dependency_penalty, 1.0, 1e-12));
        assert!(close(profile.baseline_effort_days, 705.28 / 3.0, 1e-9));
        assert_eq!(profile.total_team_size, 3);
    }

    #[test]
    fn empty_team_gets_maximal_experience_factor() {
        let request = EstimationRequest::builder().team(0, 0, 0).build().unwrap();
        let profile = EffortModel::new().profile(&request);
        assert!(close(profile.experience_factor, 1.5, 1e-12));
        assert_eq!(profile.total_team_size, 0);
    }

    #[test]
    fn integration_surcharge_is_discontinuous() {
        assert!(close(integration_multiplier(4), 1.32, 1e-9));
        assert!(close(integration_multiplier(6), 1.63, 1e-9));
        assert!(close(integration_multiplier(0), 1.0, 1e-12));
    }

    #[test]
    fn stack_lookup_normalises_and_falls_back() {
        assert!(close(stack_multiplier("  Spring Boot "), 1.4, 1e-12));
        assert!(close(stack_multiplier("REACT + NODE"), 1.2, 1e-12));
        assert!(close(stack_multiplier("cobol"), DEFAULT_STACK_MULTIPLIER, 1e-12));
    }

    #[test]
    fn dependency_penalty_tiers_are_ordered() {
        assert!(close(dependency_penalty(4, 3), 1.20, 1e-12));
        assert!(close(dependency_penalty(5, 6), 1.20, 1e-12));
        assert!(close(dependency_penalty(3, 5), 1.15, 1e-12));
        assert!(close(dependency_penalty(3, 4), 1.0, 1e-12));
        assert!(close(dependency_penalty(2, 8), 1.0, 1e-12));
    }

    #[test]
    fn adding_seniors_never_raises_experience_factor() {
        let mut previous = f64::INFINITY;
        for seniors in 1..6 {
            let request = EstimationRequest::builder()
                .team(0, 0, seniors)
                .build()
                .unwrap();
            let factor = EffortModel::new().profile(&request).experience_factor;
            assert!(factor <= previous);
            previous = factor;
        }
    }

    #[test]
    fn volatility_factor_is_fractional() {
        let request = EstimationRequest::builder().scope_volatility(65).build().unwrap();
        let profile = EffortModel::new().profile(&request);
        assert!(close(profile.scope_volatility_factor, 0.65, 1e-12));
    }
}
