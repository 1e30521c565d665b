//! Monte Carlo completion-time simulation.
//!
//! Each run perturbs the deterministic baseline with four independent
//! multiplicative factors, converts team effort to calendar weeks, and the
//! runs are aggregated into percentiles, on-time probability, expected
//! overrun and a unit-week histogram.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::{
    distributions::{log_normal, normal},
    effort::EffortProfile,
    request::EstimationRequest,
};

/// Working days per calendar week.
pub const WORK_DAYS_PER_WEEK: f64 = 5.0;

const SCOPE_GROWTH_BOUNDS: (f64, f64) = (0.8, 1.5);
const INTEGRATION_DELAY_CAP: f64 = 1.5;
const EXPERIENCE_VARIANCE_BOUNDS: (f64, f64) = (0.7, 1.4);
const UNEXPECTED_DELAY_CAP: f64 = 1.3;
const UNEXPECTED_DELAY_LOG_STD: f64 = 0.12;

/// One histogram bin, `[center - 0.5, center + 0.5)` weeks.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HistogramBucket {
    /// Bin center in weeks.
    pub bucket_center_weeks: f64,
    /// Samples falling in the bin.
    pub count: u32,
}

/// Aggregated simulation output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationResult {
    /// Median completion time in weeks.
    pub p50_weeks: f64,
    /// 90th percentile completion time in weeks.
    pub p90_weeks: f64,
    /// Fraction of runs finishing on or before the deadline.
    pub on_time_probability: f64,
    /// Mean overrun in working days across late runs only.
    pub expected_overrun_days: f64,
    /// Unit-week histogram, ordered by center.
    pub histogram: Vec<HistogramBucket>,
    /// Raw completion weeks, in draw order.
    pub completion_samples: Vec<f64>,
}

/// Multiplicative perturbations drawn for a single run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PerturbationFactors {
    /// Unplanned scope expansion or contraction.
    pub scope_growth: f64,
    /// Integration slippage; exactly 1.0 with no integrations.
    pub integration_delay: f64,
    /// Seniority-driven velocity noise; exactly 1.0 with no team.
    pub experience_variance: f64,
    /// Bugs, miscommunication and everything else.
    pub unexpected: f64,
}

impl PerturbationFactors {
    /// Product of the four factors.
    #[must_use]
    pub const fn combined(&self) -> f64 {
        self.scope_growth * self.integration_delay * self.experience_variance * self.unexpected
    }
}

/// Draws completion-time samples and aggregates them. Stateless; randomness
/// is always supplied by the caller.
#[derive(Debug, Clone, Copy, Default)]
pub struct MonteCarloSimulator;

impl MonteCarloSimulator {
    /// Creates simulator.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Runs `request.num_simulations` draws and aggregates them.
    pub fn simulate<R: Rng + ?Sized>(
        &self,
        request: &EstimationRequest,
        profile: &EffortProfile,
        rng: &mut R,
    ) -> SimulationResult {
        let team_size = f64::from(profile.total_team_size.max(1));
        let samples: Vec<f64> = (0..request.num_simulations)
            .map(|_| {
                let factors = self.draw_factors(request, profile, &mut *rng);
                let effort_days = profile.baseline_effort_days * factors.combined();
                effort_days / team_size / WORK_DAYS_PER_WEEK
            })
            .collect();
        aggregate(samples, request.deadline_weeks)
    }

    /// Draws one set of perturbation factors.
    pub fn draw_factors<R: Rng + ?Sized>(
        &self,
        request: &EstimationRequest,
        profile: &EffortProfile,
        rng: &mut R,
    ) -> PerturbationFactors {
        let scope_std = 0.15f64.mul_add(profile.scope_volatility_factor, 0.05);
        let scope_growth = normal(rng, 1.0, scope_std)
            .clamp(SCOPE_GROWTH_BOUNDS.0, SCOPE_GROWTH_BOUNDS.1);

        let integration_delay = if request.integrations == 0 {
            1.0
        } else {
            let log_std = 0.08 * f64::from(request.integrations);
            log_normal(rng, 0.0, log_std).min(INTEGRATION_DELAY_CAP)
        };

        let experience_variance = if profile.total_team_size == 0 {
            1.0
        } else {
            let std_dev = request.junior_ratio().mul_add(0.15, 0.1);
            normal(rng, 1.0, std_dev)
                .clamp(EXPERIENCE_VARIANCE_BOUNDS.0, EXPERIENCE_VARIANCE_BOUNDS.1)
        };

        let unexpected =
            log_normal(rng, 0.0, UNEXPECTED_DELAY_LOG_STD).min(UNEXPECTED_DELAY_CAP);

        PerturbationFactors {
            scope_growth,
            integration_delay,
            experience_variance,
            unexpected,
        }
    }
}

/// Builds a [`SimulationResult`] from raw completion weeks.
#[must_use]
pub fn aggregate(samples: Vec<f64>, deadline_weeks: f64) -> SimulationResult {
    if samples.is_empty() {
        return SimulationResult {
            p50_weeks: 0.0,
            p90_weeks: 0.0,
            on_time_probability: 0.0,
            expected_overrun_days: 0.0,
            histogram: Vec::new(),
            completion_samples: samples,
        };
    }

    let mut sorted = samples.clone();
    sorted.sort_by(f64::total_cmp);

    let on_time = samples.iter().filter(|w| **w <= deadline_weeks).count();
    let late: Vec<f64> = samples
        .iter()
        .filter(|w| **w > deadline_weeks)
        .map(|w| (w - deadline_weeks) * WORK_DAYS_PER_WEEK)
        .collect();
    let expected_overrun_days = if late.is_empty() {
        0.0
    } else {
        late.iter().sum::<f64>() / count_as_f64(late.len())
    };

    SimulationResult {
        p50_weeks: percentile(&sorted, 50.0),
        p90_weeks: percentile(&sorted, 90.0),
        on_time_probability: count_as_f64(on_time) / count_as_f64(samples.len()),
        expected_overrun_days,
        histogram: histogram(&sorted),
        completion_samples: samples,
    }
}

/// Linearly interpolated percentile of an ascending slice, `q` in 0..=100.
#[must_use]
pub fn percentile(sorted: &[f64], q: f64) -> f64 {
    let Some(last) = sorted.len().checked_sub(1) else {
        return 0.0;
    };
    let rank = (q / 100.0).clamp(0.0, 1.0) * count_as_f64(last);
    let lower = usize::try_from(floor_u32(rank)).map_or(last, |idx| idx.min(last));
    let upper = (lower + 1).min(last);
    let weight = rank - rank.floor();
    (sorted[upper] - sorted[lower]).mul_add(weight, sorted[lower])
}

/// Unit-week histogram spanning `floor(min) - 1` (never below zero) to
/// `ceil(max) + 2`. Every sample lands in exactly one bucket.
#[must_use]
pub fn histogram(samples: &[f64]) -> Vec<HistogramBucket> {
    let (min, max) = samples
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), s| {
            (lo.min(*s), hi.max(*s))
        });
    if !min.is_finite() || !max.is_finite() {
        return Vec::new();
    }
    let start = floor_u32(min).saturating_sub(1);
    let end = floor_u32(max.ceil()).saturating_add(2);
    let width = usize::try_from(end.saturating_sub(start)).unwrap_or(1).max(1);

    let mut counts = vec![0u32; width];
    for sample in samples {
        let offset = floor_u32(*sample).saturating_sub(start);
        let idx = usize::try_from(offset).map_or(width - 1, |idx| idx.min(width - 1));
        counts[idx] += 1;
    }

    counts
        .into_iter()
        .enumerate()
        .map(|(idx, count)| {
            let week = start.saturating_add(u32::try_from(idx).unwrap_or(u32::MAX));
            HistogramBucket {
                bucket_center_weeks: f64::from(week) + 0.5,
                count,
            }
        })
        .collect()
}

/// Sample counts never exceed `u32::MAX`; the request caps them there.
fn count_as_f64(count: usize) -> f64 {
    u32::try_from(count).map_or(f64::from(u32::MAX), f64::from)
}

/// Floors into `0..=u32::MAX`. NaN maps to zero.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn floor_u32(value: f64) -> u32 {
    value.floor().clamp(0.0, f64::from(u32::MAX)) as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effort::EffortModel;
    use rand::{rngs::SmallRng, SeedableRng};

    fn scenario(integrations: u32, samples: u32) -> (EstimationRequest, EffortProfile) {
        let request = EstimationRequest::builder()
            .complexity(3)
            .stack("react")
            .team(1, 1, 1)
            .integrations(integrations)
            .scope_volatility(50)
            .deadline_weeks(16.0)
            .num_simulations(samples)
            .build()
            .unwrap();
        let profile = EffortModel::new().profile(&request);
        (request, profile)
    }

    #[test]
    fn histogram_counts_sum_to_sample_count() {
        let (request, profile) = scenario(3, 2_500);
        let mut rng = SmallRng::seed_from_u64(42);
        let result = MonteCarloSimulator::new().simulate(&request, &profile, &mut rng);
        let total: u32 = result.histogram.iter().map(|b| b.count).sum();
        assert_eq!(total, 2_500);
        assert_eq!(result.completion_samples.len(), 2_500);
    }

    #[test]
    fn on_time_probability_is_exact_fraction() {
        let (request, profile) = scenario(2, 1_000);
        let mut rng = SmallRng::seed_from_u64(9);
        let result = MonteCarloSimulator::new().simulate(&request, &profile, &mut rng);
        let on_time = result
            .completion_samples
            .iter()
            .filter(|w| **w <= request.deadline_weeks)
            .count();
        assert!((0.0..=1.0).contains(&result.on_time_probability));
        assert!((result.on_time_probability - on_time as f64 / 1_000.0).abs() < f64::EPSILON);
        assert!(result.expected_overrun_days >= 0.0);
        assert!(result.p50_weeks <= result.p90_weeks);
    }

    #[test]
    fn same_seed_is_bit_for_bit_reproducible() {
        let (request, profile) = scenario(5, 500);
        let simulator = MonteCarloSimulator::new();
        let a = simulator.simulate(&request, &profile, &mut SmallRng::seed_from_u64(3));
        let b = simulator.simulate(&request, &profile, &mut SmallRng::seed_from_u64(3));
        assert_eq!(a, b);
    }

    #[test]
    fn zero_integrations_never_delay() {
        let (request, profile) = scenario(0, 1);
        let mut rng = SmallRng::seed_from_u64(17);
        let simulator = MonteCarloSimulator::new();
        for _ in 0..1_000 {
            let factors = simulator.draw_factors(&request, &profile, &mut rng);
            assert!((factors.integration_delay - 1.0).abs() < f64::EPSILON);
        }
    }

    #[test]
    fn factors_respect_clamp_bounds() {
        let request = EstimationRequest::builder()
            .team(5, 0, 0)
            .integrations(12)
            .scope_volatility(100)
            .build()
            .unwrap();
        let profile = EffortModel::new().profile(&request);
        let mut rng = SmallRng::seed_from_u64(99);
        let simulator = MonteCarloSimulator::new();
        for _ in 0..5_000 {
            let f = simulator.draw_factors(&request, &profile, &mut rng);
            assert!((0.8..=1.5).contains(&f.scope_growth));
            assert!(f.integration_delay > 0.0 && f.integration_delay <= 1.5);
            assert!((0.7..=1.4).contains(&f.experience_variance));
            assert!(f.unexpected > 0.0 && f.unexpected <= 1.3);
        }
    }

    #[test]
    fn empty_team_fixes_experience_variance() {
        let request = EstimationRequest::builder().team(0, 0, 0).build().unwrap();
        let profile = EffortModel::new().profile(&request);
        let mut rng = SmallRng::seed_from_u64(4);
        let factors = MonteCarloSimulator::new().draw_factors(&request, &profile, &mut rng);
        assert!((factors.experience_variance - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn aggregate_computes_overrun_over_late_runs_only() {
        let result = aggregate(vec![8.0, 9.0, 11.0, 13.0], 10.0);
        assert!((result.on_time_probability - 0.5).abs() < f64::EPSILON);
        // late runs overshoot by 1 and 3 weeks -> 5 and 15 days
        assert!((result.expected_overrun_days - 10.0).abs() < 1e-9);
        assert!((result.p50_weeks - 10.0).abs() < 1e-9);
        assert!((result.p90_weeks - 12.4).abs() < 1e-9);
    }

    #[test]
    fn no_late_runs_means_zero_overrun() {
        let result = aggregate(vec![2.0, 3.0], 10.0);
        assert!(result.expected_overrun_days.abs() < f64::EPSILON);
        assert!((result.on_time_probability - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn degenerate_distribution_gets_padded_histogram() {
        let buckets = histogram(&[4.2, 4.2, 4.2]);
        let centers: Vec<f64> = buckets.iter().map(|b| b.bucket_center_weeks).collect();
        assert_eq!(centers, vec![3.5, 4.5, 5.5, 6.5]);
        assert_eq!(buckets[1].count, 3);
    }

    #[test]
    fn percentile_interpolates() {
        let sorted = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert!((percentile(&sorted, 50.0) - 3.0).abs() < 1e-12);
        assert!((percentile(&sorted, 90.0) - 4.6).abs() < 1e-12);
        assert!((percentile(&[7.0], 90.0) - 7.0).abs() < 1e-12);
        assert!(percentile(&[], 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn histogram_never_starts_below_week_zero() {
        let buckets = histogram(&[0.3, 1.6]);
        let centers: Vec<f64> = buckets.iter().map(|b| b.bucket_center_weeks).collect();
        assert_eq!(centers, vec![0.5, 1.5, 2.5, 3.5]);
        assert_eq!(buckets.iter().map(|b| b.count).sum::<u32>(), 2);
        assert_eq!(buckets[0].count, 1);
        assert_eq!(buckets[1].count, 1);
    }
}
