#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rust_2018_idioms,
    missing_docs
)]

//! Forecast estimation engine: deterministic effort modelling, Monte Carlo
//! completion timelines, and the risk, stress, staffing and cost scores built on them.

/// Error types.
#[path = "../error.rs"]
pub mod error;

/// Estimation request model and validation.
#[path = "../request.rs"]
pub mod request;

/// Cost, simulation and telemetry configuration.
#[path = "../config.rs"]
pub mod config;

/// Deterministic baseline effort model.
#[path = "../effort.rs"]
pub mod effort;

/// Sampling primitives for the simulator.
#[path = "../distributions.rs"]
pub mod distributions;

/// Monte Carlo completion-time simulator.
#[path = "../monte_carlo.rs"]
pub mod monte_carlo;

/// Risk scoring.
#[path = "../risk.rs"]
pub mod risk;

/// Team stress index.
#[path = "../stress.rs"]
pub mod stress;

/// Role allocation heuristics.
#[path = "../allocation.rs"]
pub mod allocation;

/// Cost estimation.
#[path = "../cost.rs"]
pub mod cost;

/// Response payload rounding and reporting.
#[path = "../report.rs"]
pub mod report;

/// What-if scenario comparison.
#[path = "../compare.rs"]
pub mod compare;

/// Read-only context handed to the narrative service.
#[path = "../narrative.rs"]
pub mod narrative;

/// Telemetry for the estimation engine.
#[path = "../helper.rs"]
pub mod helper;

/// Engine facade.
#[path = "../main.rs"]
pub mod runtime;

pub use compare::{MetricDelta, ScenarioComparison, WhatIfAdjustment};
pub use config::{CostConfig, EngineConfig};
pub use effort::{EffortModel, EffortProfile};
pub use error::EstimationError;
pub use helper::{EstimationTelemetry, EstimationTelemetryBuilder};
pub use monte_carlo::{HistogramBucket, MonteCarloSimulator, SimulationResult};
pub use narrative::NarrativeContext;
pub use report::EstimateReport;
pub use request::{EstimationRequest, EstimationRequestBuilder, ScopeSize};
pub use risk::{RiskProfile, RiskScore, RiskScorer};
pub use runtime::{Estimate, EstimationEngine, EstimationEngineBuilder};
