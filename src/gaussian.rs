use crate::error::{BayesError, Result};
use std::f64::consts::PI;

/// Normal probability density of `x` for the given mean and variance.
///
/// Fails with `InvalidVariance` unless the variance is strictly positive.
pub fn density(x: f64, mean: f64, variance: f64) -> Result<f64> {
    if variance <= 0.0 || variance.is_nan() {
        return Err(BayesError::InvalidVariance { variance });
    }

    let exponent = -(x - mean).powi(2) / (2.0 * variance);
    Ok(exponent.exp() / (2.0 * PI * variance).sqrt())
}
