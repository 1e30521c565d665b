use anyhow::Result;
use rand::{rngs::SmallRng, SeedableRng};
use serde::{Deserialize, Serialize};
use serde_json::json;
use shared_logging::LogLevel;

use crate::{
    allocation::{RoleAllocation, RoleAllocator},
    compare::{compare, ScenarioComparison, WhatIfAdjustment},
    config::{CostConfig, EngineConfig},
    cost::{CostEstimate, CostEstimator},
    effort::{EffortModel, EffortProfile},
    error::EstimationError,
    helper::{random_seed, seeded_rng, EstimationTelemetry},
    monte_carlo::{MonteCarloSimulator, SimulationResult},
    narrative::NarrativeContext,
    report::{BaselineMetrics, EstimateReport},
    request::EstimationRequest,
    risk::{RiskProfile, RiskScorer},
    stress::StressIndexCalculator,
};

/// Everything produced for one request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Estimate {
    /// The request, as estimated.
    pub request: EstimationRequest,
    /// Deterministic baseline.
    pub effort: EffortProfile,
    /// Monte Carlo aggregates.
    pub simulation: SimulationResult,
    /// Risk scores.
    pub risk: RiskProfile,
    /// Team stress, 0-100.
    pub stress_index: u8,
    /// Staffing mix.
    pub role_allocation: RoleAllocation,
    /// p50/p90 cost.
    pub cost: CostEstimate,
}

impl Estimate {
    /// Effort factors rounded for reporting.
    #[must_use]
    pub fn baseline_metrics(&self) -> BaselineMetrics {
        BaselineMetrics::from(&self.effort)
    }

    /// Response payload.
    #[must_use]
    pub fn report(&self) -> EstimateReport {
        EstimateReport::from_estimate(self)
    }

    /// Context for the narrative service.
    #[must_use]
    pub fn narrative_context(&self) -> NarrativeContext {
        NarrativeContext::from_estimate(self)
    }
}

/// Runs the full estimation pipeline. Holds no per-request state; every
/// call owns its own random stream, so one engine may serve concurrent callers.
pub struct EstimationEngine {
    telemetry: Option<EstimationTelemetry>,
    seed: Option<u64>,
    effort: EffortModel,
    simulator: MonteCarloSimulator,
    risk: RiskScorer,
    stress: StressIndexCalculator,
    allocator: RoleAllocator,
    cost: CostEstimator,
}

impl EstimationEngine {
    /// Returns a builder.
    #[must_use]
    pub fn builder() -> EstimationEngineBuilder {
        EstimationEngineBuilder::default()
    }

    /// Fixed seed, if any.
    #[must_use]
    pub const fn seed(&self) -> Option<u64> {
        self.seed
    }

    /// Returns telemetry handle.
    #[must_use]
    pub const fn telemetry(&self) -> Option<&EstimationTelemetry> {
        self.telemetry.as_ref()
    }

    /// Validates the request and runs every component.
    ///
    /// # Errors
    ///
    /// Returns [`EstimationError::InvalidRequest`] when the request fails validation.
    pub fn estimate(&self, request: &EstimationRequest) -> Result<Estimate, EstimationError> {
        request.validate()?;
        let mut rng = self.rng();
        let estimate = self.run(request, &mut rng);
        self.log(
            LogLevel::Info,
            "estimate.completed",
            json!({
                "project": request.project_name,
                "samples": request.num_simulations,
                "p50_weeks": estimate.simulation.p50_weeks,
                "p90_weeks": estimate.simulation.p90_weeks,
                "on_time_probability": estimate.simulation.on_time_probability,
                "stress_index": estimate.stress_index,
            }),
        );
        if let Some(tel) = &self.telemetry {
            if let Ok(payload) = serde_json::to_value(estimate.narrative_context()) {
                let _ = tel.event("estimate.completed", payload);
            }
        }
        Ok(estimate)
    }

    /// Estimates the baseline and an adjusted scenario on identical random streams.
    ///
    /// # Errors
    ///
    /// Fails when either the request or the adjusted scenario is invalid.
    pub fn what_if(
        &self,
        request: &EstimationRequest,
        adjustment: WhatIfAdjustment,
    ) -> Result<ScenarioComparison, EstimationError> {
        request.validate()?;
        let scenario_request = adjustment.apply(request);
        scenario_request.validate()?;

        let seed = self.seed.unwrap_or_else(random_seed);
        let baseline = self.run(request, &mut seeded_rng(seed));
        let scenario = self.run(&scenario_request, &mut seeded_rng(seed));
        let deltas = compare(&baseline.simulation, &scenario.simulation);

        let comparison = ScenarioComparison {
            adjustment,
            baseline: baseline.report(),
            scenario: scenario.report(),
            deltas,
        };
        self.log(
            LogLevel::Info,
            "estimate.what_if.completed",
            json!({
                "senior_delta": adjustment.senior_delta,
                "integrations_delta": adjustment.integrations_delta,
                "deadline_delta": adjustment.deadline_delta,
                "improvements": comparison.improvements(),
            }),
        );
        Ok(comparison)
    }

    fn run(&self, request: &EstimationRequest, rng: &mut SmallRng) -> Estimate {
        let effort = self.effort.profile(request);
        self.log(
            LogLevel::Debug,
            "estimate.effort.computed",
            json!({
                "baseline_effort_days": effort.baseline_effort_days,
                "stack_multiplier": effort.stack_multiplier,
                "integration_multiplier": effort.integration_multiplier,
                "experience_factor": effort.experience_factor,
                "dependency_penalty": effort.dependency_penalty,
            }),
        );

        let simulation = self.simulator.simulate(request, &effort, rng);
        self.log(
            LogLevel::Debug,
            "estimate.simulation.completed",
            json!({
                "samples": simulation.completion_samples.len(),
                "buckets": simulation.histogram.len(),
            }),
        );

        let risk = self.risk.score(request, &effort);
        self.log(
            LogLevel::Debug,
            "estimate.risk.scored",
            json!({
                "integration": risk.integration.score,
                "team_imbalance": risk.team_imbalance.score,
                "scope_creep": risk.scope_creep.score,
                "learning_curve": risk.learning_curve.score,
            }),
        );
        if risk.learning_curve.score < 0 {
            self.log(
                LogLevel::Warn,
                "estimate.risk.negative_learning_curve",
                json!({ "stack": request.stack, "score": risk.learning_curve.score }),
            );
        }

        let stress_index = self.stress.index(request, &effort, &simulation);
        let role_allocation = self.allocator.allocate(request);
        let cost = self.cost.estimate(&simulation, effort.total_team_size);

        Estimate {
            request: request.clone(),
            effort,
            simulation,
            risk,
            stress_index,
            role_allocation,
            cost,
        }
    }

    fn rng(&self) -> SmallRng {
        self.seed.map_or_else(SmallRng::from_entropy, seeded_rng)
    }

    fn log(&self, level: LogLevel, message: &str, metadata: serde_json::Value) {
        if let Some(tel) = &self.telemetry {
            let _ = tel.log(level, message, metadata);
        }
    }
}

/// Builder for `EstimationEngine`.
#[derive(Default)]
pub struct EstimationEngineBuilder {
    telemetry: Option<EstimationTelemetry>,
    seed: Option<u64>,
    cost: CostConfig,
}

impl EstimationEngineBuilder {
    /// Sets telemetry.
    #[must_use]
    pub fn telemetry(mut self, telemetry: EstimationTelemetry) -> Self {
        self.telemetry = Some(telemetry);
        self
    }

    /// Pins every run to one seed.
    #[must_use]
    pub const fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Sets rate and currency.
    #[must_use]
    pub fn cost_config(mut self, cost: CostConfig) -> Self {
        self.cost = cost;
        self
    }

    /// Takes cost and seed from a loaded configuration.
    #[must_use]
    pub fn config(mut self, config: &EngineConfig) -> Self {
        self.cost = config.cost.clone();
        if let Some(seed) = config.simulation.seed {
            self.seed = Some(seed);
        }
        self
    }

    /// Builds the engine.
    ///
    /// # Errors
    ///
    /// Fails when the cost configuration is invalid.
    pub fn build(self) -> Result<EstimationEngine> {
        self.cost.validate()?;
        Ok(EstimationEngine {
            telemetry: self.telemetry,
            seed: self.seed,
            effort: EffortModel::new(),
            simulator: MonteCarloSimulator::new(),
            risk: RiskScorer::new(),
            stress: StressIndexCalculator::new(),
            allocator: RoleAllocator::new(),
            cost: CostEstimator::new(self.cost),
        })
    }
}
