//! Trial-vector aggregation: means, sample standard deviations, overhead ratios

use thiserror::Error;

/// Baselines smaller than this are treated as zero when computing ratios.
const ZERO_BASELINE_EPS: f64 = 1e-12;

#[derive(Debug, Error, PartialEq)]
pub enum StatsError {
    #[error("need at least 2 samples to aggregate, got {0}")]
    TooFewSamples(usize),
    #[error("baseline measurement is zero; overhead ratio is undefined")]
    ZeroBaseline,
}

/// Mean and sample standard deviation of one trial vector.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Summary {
    pub mean: f64,
    pub stdev: f64,
}

/// Reduce a trial vector to its mean and sample standard deviation.
///
/// A standard deviation is undefined for fewer than two samples, so this
/// refuses such vectors instead of guessing.
pub fn summarize(samples: &[f64]) -> Result<Summary, StatsError> {
    if samples.len() < 2 {
        return Err(StatsError::TooFewSamples(samples.len()));
    }
    let n = samples.len() as f64;
    let mean = samples.iter().sum::<f64>() / n;
    // Sample (n-1) variance: the trials are a sample of the workload's
    // behavior, not the whole population.
    let variance = samples.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1.0);
    Ok(Summary {
        mean,
        stdev: variance.sqrt(),
    })
}

/// Overhead ratio `new / orig`.
///
/// A zero or near-zero baseline makes the ratio meaningless, so it is an
/// explicit error rather than a silent infinity.
pub fn overhead(new: f64, orig: f64) -> Result<f64, StatsError> {
    if orig.abs() < ZERO_BASELINE_EPS {
        return Err(StatsError::ZeroBaseline);
    }
    Ok(new / orig)
}
