use std::{fs, path::PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use forecast_estimation::{
    narrative::RiskDriver, EngineConfig, EstimateReport, EstimationEngine, EstimationRequest,
    EstimationTelemetry, NarrativeContext, WhatIfAdjustment,
};
use serde::Serialize;
use serde_json::Value;
use shared_logging::LogLevel;

#[derive(Parser, Debug)]
#[command(name = "forecast", version, about = "Software delivery forecasting")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Estimates timeline, risk, stress, staffing and cost for a request.
    Estimate {
        #[command(flatten)]
        common: CommonArgs,
        /// Adds the narrative context and failure drivers to the output.
        #[arg(long)]
        narrative: bool,
    },
    /// Compares a request against an adjusted scenario.
    WhatIf {
        #[command(flatten)]
        common: CommonArgs,
        #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
        senior_delta: i32,
        #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
        integrations_delta: i32,
        #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
        deadline_delta: i32,
    },
}

#[derive(Args, Debug)]
struct CommonArgs {
    /// JSON request file.
    #[arg(long)]
    request: PathBuf,
    /// TOML engine configuration.
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    seed: Option<u64>,
    /// Overrides the request's sample count.
    #[arg(long)]
    samples: Option<u32>,
    /// JSON-lines log file.
    #[arg(long)]
    log: Option<PathBuf>,
    /// JSON-lines event file.
    #[arg(long)]
    event_log: Option<PathBuf>,
    /// Logs per-stage detail.
    #[arg(long)]
    verbose: bool,
}

#[derive(Serialize)]
struct EstimateOutput {
    report: EstimateReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    narrative: Option<NarrativeContext>,
    #[serde(skip_serializing_if = "Option::is_none")]
    failure_drivers: Option<Vec<RiskDriver>>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Estimate { common, narrative } => {
            let (engine, request) = prepare(&common)?;
            let estimate = engine.estimate(&request).context("estimating request")?;
            let output = EstimateOutput {
                report: estimate.report(),
                narrative: narrative.then(|| estimate.narrative_context()),
                failure_drivers: narrative
                    .then(|| NarrativeContext::worst_case_drivers(&estimate)),
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
            Ok(())
        }
        Commands::WhatIf {
            common,
            senior_delta,
            integrations_delta,
            deadline_delta,
        } => {
            let (engine, request) = prepare(&common)?;
            let adjustment = WhatIfAdjustment {
                senior_delta,
                integrations_delta,
                deadline_delta,
            };
            let comparison = engine
                .what_if(&request, adjustment)
                .context("running what-if scenario")?;
            println!("{}", serde_json::to_string_pretty(&comparison)?);
            Ok(())
        }
    }
}

fn prepare(args: &CommonArgs) -> Result<(EstimationEngine, EstimationRequest)> {
    let mut config = match &args.config {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };
    config.apply_env_overrides(|key| std::env::var(key).ok())?;
    if let Some(path) = &args.log {
        config.telemetry.log_path = Some(path.clone());
    }
    if let Some(path) = &args.event_log {
        config.telemetry.event_log = Some(path.clone());
    }
    if args.verbose {
        config.telemetry.min_level = LogLevel::Debug;
    }

    let raw = fs::read_to_string(&args.request)
        .with_context(|| format!("reading request {}", args.request.display()))?;
    let request = parse_request(&raw, &config, args.samples)?;

    let telemetry = EstimationTelemetry::builder("forecast")
        .settings(&config.telemetry)?
        .build()?;
    let mut builder = EstimationEngine::builder()
        .config(&config)
        .telemetry(telemetry);
    if let Some(seed) = args.seed {
        builder = builder.seed(seed);
    }
    Ok((builder.build()?, request))
}

/// Requests that omit `num_simulations` pick up the configured default;
/// `--samples` beats both.
fn parse_request(raw: &str, config: &EngineConfig, samples: Option<u32>) -> Result<EstimationRequest> {
    let mut value: Value = serde_json::from_str(raw).context("parsing request JSON")?;
    if let Value::Object(map) = &mut value {
        if let Some(samples) = samples {
            map.insert("num_simulations".into(), samples.into());
        } else if !map.contains_key("num_simulations") {
            map.insert(
                "num_simulations".into(),
                config.simulation.default_samples.into(),
            );
        }
    }
    let request: EstimationRequest =
        serde_json::from_value(value).context("decoding request fields")?;
    request.validate()?;
    Ok(request)
}

#[cfg(test)]
mod tests {
    use super::*;
    use forecast_estimation::ScopeSize;
    use tempfile::tempdir;

    const REQUEST: &str = r#"{
        "project_name": "Checkout",
        "scope_size": "medium",
        "complexity": 3,
        "stack": "React",
        "deadline_weeks": 10,
        "team_junior": 1,
        "team_mid": 1,
        "team_senior": 1,
        "integrations": 2,
        "scope_volatility": 20
    }"#;

    #[test]
    fn configured_default_fills_missing_samples() {
        let config = EngineConfig::from_toml("[simulation]\ndefault_samples = 250\n").unwrap();
        let request = parse_request(REQUEST, &config, None).unwrap();
        assert_eq!(request.num_simulations, 250);
        assert_eq!(request.scope_size, ScopeSize::Medium);
    }

    #[test]
    fn samples_flag_wins() {
        let request = parse_request(REQUEST, &EngineConfig::default(), Some(400)).unwrap();
        assert_eq!(request.num_simulations, 400);
    }

    #[test]
    fn invalid_request_is_reported() {
        let raw = REQUEST.replace("\"complexity\": 3", "\"complexity\": 9");
        assert!(parse_request(&raw, &EngineConfig::default(), None).is_err());
    }

    #[test]
    fn negative_deltas_parse() {
        let cli = Cli::try_parse_from([
            "forecast",
            "what-if",
            "--request",
            "req.json",
            "--deadline-delta",
            "-2",
            "--senior-delta",
            "1",
        ])
        .unwrap();
        match cli.command {
            Commands::WhatIf {
                deadline_delta,
                senior_delta,
                integrations_delta,
                ..
            } => {
                assert_eq!(deadline_delta, -2);
                assert_eq!(senior_delta, 1);
                assert_eq!(integrations_delta, 0);
            }
            Commands::Estimate { .. } => panic!("expected what-if"),
        }
    }

    #[test]
    fn prepare_wires_seed_and_log_file() {
        let tmp = tempdir().unwrap();
        let request_path = tmp.path().join("request.json");
        fs::write(&request_path, REQUEST).unwrap();
        let log_path = tmp.path().join("forecast.log");
        let args = CommonArgs {
            request: request_path,
            config: None,
            seed: Some(3),
            samples: Some(200),
            log: Some(log_path.clone()),
            event_log: None,
            verbose: false,
        };
        let (engine, request) = prepare(&args).unwrap();
        assert_eq!(engine.seed(), Some(3));
        engine.estimate(&request).unwrap();
        let log = fs::read_to_string(log_path).unwrap();
        assert!(log.contains("estimate.completed"));
        assert!(!log.contains("estimate.effort.computed"));
    }
}
