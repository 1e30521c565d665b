use rand::{distributions::Distribution, Rng};
use statrs::distribution::{LogNormal, Normal};

/// Normal draw with the given mean and standard deviation.
///
/// A non-positive spread has no distribution behind it and yields `mean`.
pub fn normal<R: Rng + ?Sized>(rng: &mut R, mean: f64, std_dev: f64) -> f64 {
    Normal::new(mean, std_dev).map_or(mean, |dist| dist.sample(rng))
}

/// Log-normal draw: `exp(N(log_mean, log_std))`.
pub fn log_normal<R: Rng + ?Sized>(rng: &mut R, log_mean: f64, log_std: f64) -> f64 {
    LogNormal::new(log_mean, log_std).map_or_else(|_| log_mean.exp(), |dist| dist.sample(rng))
}
