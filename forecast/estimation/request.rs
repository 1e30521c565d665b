use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::EstimationError;

/// Default Monte Carlo sample count when a request omits it.
pub const DEFAULT_SIMULATIONS: u32 = 1000;

/// Coarse project scope.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ScopeSize {
    /// Roughly a one-month effort for a small team.
    Small,
    /// Roughly a quarter.
    Medium,
    /// Half a year or more.
    Large,
}

impl ScopeSize {
    /// Label for logging.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Small => "small",
            Self::Medium => "medium",
            Self::Large => "large",
        }
    }
}

impl fmt::Display for ScopeSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ScopeSize {
    type Err = EstimationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "small" => Ok(Self::Small),
            "medium" => Ok(Self::Medium),
            "large" => Ok(Self::Large),
            _ => Err(EstimationError::UnknownScope(s.to_string())),
        }
    }
}

/// Project parameters driving every estimation component.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EstimationRequest {
    /// Project name, carried through to narrative context.
    #[serde(default)]
    pub project_name: String,
    /// Free-text project description.
    #[serde(default)]
    pub description: String,
    /// Scope bucket.
    pub scope_size: ScopeSize,
    /// Complexity rating, 1-5.
    pub complexity: u8,
    /// Technology stack label (e.g. `React + Node`).
    pub stack: String,
    /// Target deadline in weeks.
    pub deadline_weeks: f64,
    /// Junior developers.
    pub team_junior: u32,
    /// Mid-level developers.
    pub team_mid: u32,
    /// Senior developers.
    pub team_senior: u32,
    /// External integrations.
    pub integrations: u32,
    /// Scope volatility, 0-100.
    pub scope_volatility: u8,
    /// Monte Carlo sample count.
    #[serde(default = "default_simulations")]
    pub num_simulations: u32,
}

const fn default_simulations() -> u32 {
    DEFAULT_SIMULATIONS
}

impl EstimationRequest {
    /// Returns a builder seeded with a medium, mid-complexity project.
    #[must_use]
    pub fn builder() -> EstimationRequestBuilder {
        EstimationRequestBuilder::default()
    }

    /// Sum of the three seniority counts. May be zero; saturates at `u32::MAX`,
    /// which [`Self::validate`] rejects.
    #[must_use]
    pub const fn total_team(&self) -> u32 {
        self.team_junior
            .saturating_add(self.team_mid)
            .saturating_add(self.team_senior)
    }

    /// Junior share of the team, 0.0 for an empty team.
    #[must_use]
    pub fn junior_ratio(&self) -> f64 {
        ratio(self.team_junior, self.total_team())
    }

    /// Mid-level share of the team, 0.0 for an empty team.
    #[must_use]
    pub fn mid_ratio(&self) -> f64 {
        ratio(self.team_mid, self.total_team())
    }

    /// Senior share of the team, 0.0 for an empty team.
    #[must_use]
    pub fn senior_ratio(&self) -> f64 {
        ratio(self.team_senior, self.total_team())
    }

    /// Checks the ranges the scoring components rely on.
    ///
    /// # Errors
    ///
    /// Returns [`EstimationError::InvalidRequest`] naming the first field out of range.
    pub fn validate(&self) -> Result<(), EstimationError> {
        if !(1..=5).contains(&self.complexity) {
            return Err(EstimationError::invalid(
                "complexity",
                format!("{} not in 1..=5", self.complexity),
            ));
        }
        if self.scope_volatility > 100 {
            return Err(EstimationError::invalid(
                "scope_volatility",
                format!("{} not in 0..=100", self.scope_volatility),
            ));
        }
        if !self.deadline_weeks.is_finite() || self.deadline_weeks <= 0.0 {
            return Err(EstimationError::invalid(
                "deadline_weeks",
                format!("{} must be a positive number", self.deadline_weeks),
            ));
        }
        let team = self
            .team_junior
            .checked_add(self.team_mid)
            .and_then(|sum| sum.checked_add(self.team_senior));
        if team.is_none() {
            return Err(EstimationError::invalid(
                "team",
                format!(
                    "{} + {} + {} developers overflows the team size",
                    self.team_junior, self.team_mid, self.team_senior
                ),
            ));
        }
        if self.num_simulations == 0 {
            return Err(EstimationError::invalid(
                "num_simulations",
                "at least one sample is required",
            ));
        }
        Ok(())
    }
}

fn ratio(part: u32, total: u32) -> f64 {
    if total == 0 {
        0.0
    } else {
        f64::from(part) / f64::from(total)
    }
}

/// Builder for [`EstimationRequest`].
#[derive(Debug, Clone)]
pub struct EstimationRequestBuilder {
    request: EstimationRequest,
}

impl Default for EstimationRequestBuilder {
    fn default() -> Self {
        Self {
            request: EstimationRequest {
                project_name: String::new(),
                description: String::new(),
                scope_size: ScopeSize::Medium,
                complexity: 3,
                stack: "react".into(),
                deadline_weeks: 10.0,
                team_junior: 1,
                team_mid: 1,
                team_senior: 1,
                integrations: 0,
                scope_volatility: 0,
                num_simulations: DEFAULT_SIMULATIONS,
            },
        }
    }
}

impl EstimationRequestBuilder {
    /// Sets project name and description.
    #[must_use]
    pub fn project(mut self, name: impl Into<String>, description: impl Into<String>) -> Self {
        self.request.project_name = name.into();
        self.request.description = description.into();
        self
    }

    /// Sets scope size.
    #[must_use]
    pub const fn scope(mut self, scope: ScopeSize) -> Self {
        self.request.scope_size = scope;
        self
    }

    /// Sets complexity.
    #[must_use]
    pub const fn complexity(mut self, complexity: u8) -> Self {
        self.request.complexity = complexity;
        self
    }

    /// Sets stack label.
    #[must_use]
    pub fn stack(mut self, stack: impl Into<String>) -> Self {
        self.request.stack = stack.into();
        self
    }

    /// Sets deadline.
    #[must_use]
    pub const fn deadline_weeks(mut self, weeks: f64) -> Self {
        self.request.deadline_weeks = weeks;
        self
    }

    /// Sets team composition as (junior, mid, senior).
    #[must_use]
    pub const fn team(mut self, junior: u32, mid: u32, senior: u32) -> Self {
        self.request.team_junior = junior;
        self.request.team_mid = mid;
        self.request.team_senior = senior;
        self
    }

    /// Sets integration count.
    #[must_use]
    pub const fn integrations(mut self, integrations: u32) -> Self {
        self.request.integrations = integrations;
        self
    }

    /// Sets scope volatility.
    #[must_use]
    pub const fn scope_volatility(mut self, volatility: u8) -> Self {
        self.request.scope_volatility = volatility;
        self
    }

    /// Sets sample count.
    #[must_use]
    pub const fn num_simulations(mut self, samples: u32) -> Self {
        self.request.num_simulations = samples;
        self
    }

    /// Validates and returns the request.
    ///
    /// # Errors
    ///
    /// Fails when [`EstimationRequest::validate`] does.
    pub fn build(self) -> Result<EstimationRequest, EstimationError> {
        self.request.validate()?;
        Ok(self.request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_scope_case_insensitively() {
        assert_eq!(" Medium ".parse::<ScopeSize>().unwrap(), ScopeSize::Medium);
        assert!(matches!(
            "huge".parse::<ScopeSize>(),
            Err(EstimationError::UnknownScope(_))
        ));
    }

    #[test]
    fn deserializes_with_default_sample_count() {
        let request: EstimationRequest = serde_json::from_str(
            r#"{
                "scope_size": "large",
                "complexity": 4,
                "stack": "Go",
                "deadline_weeks": 20,
                "team_junior": 0,
                "team_mid": 2,
                "team_senior": 1,
                "integrations": 3,
                "scope_volatility": 40
            }"#,
        )
        .unwrap();
        assert_eq!(request.scope_size, ScopeSize::Large);
        assert_eq!(request.num_simulations, DEFAULT_SIMULATIONS);
        assert!(request.project_name.is_empty());
        assert!(request.validate().is_ok());
    }

    #[test]
    fn rejects_out_of_range_fields() {
        let err = EstimationRequest::builder().complexity(6).build().unwrap_err();
        assert!(matches!(
            err,
            EstimationError::InvalidRequest { field: "complexity", .. }
        ));
        assert!(EstimationRequest::builder().scope_volatility(101).build().is_err());
        assert!(EstimationRequest::builder().deadline_weeks(0.0).build().is_err());
        assert!(EstimationRequest::builder().num_simulations(0).build().is_err());
    }

    #[test]
    fn rejects_team_that_overflows() {
        let err = EstimationRequest::builder()
            .team(u32::MAX, 1, 0)
            .build()
            .unwrap_err();
        assert!(matches!(err, EstimationError::InvalidRequest { field: "team", .. }));

        let mut request = EstimationRequest::builder().build().unwrap();
        request.team_junior = u32::MAX;
        request.team_senior = u32::MAX;
        assert_eq!(request.total_team(), u32::MAX);
        assert!(request.validate().is_err());
        assert!(EstimationRequest::builder().team(u32::MAX, 0, 0).build().is_ok());
    }

    #[test]
    fn ratios_handle_empty_team() {
        let request = EstimationRequest::builder().team(0, 0, 0).build().unwrap();
        assert_eq!(request.total_team(), 0);
        assert!(request.junior_ratio().abs() < f64::EPSILON);
        let request = EstimationRequest::builder().team(3, 1, 0).build().unwrap();
        assert!((request.junior_ratio() - 0.75).abs() < 1e-12);
        assert!(request.senior_ratio().abs() < f64::EPSILON);
    }
}
