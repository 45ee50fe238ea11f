//! Estimation of the null proportion (pi0).
//!
//! Three tiers: a Storey-style smoother over a lambda grid (primary), a
//! histogram heuristic (fallback), and a caller-supplied constant (terminal
//! fallback). Estimation never fails; the tier that produced the value is
//! recorded so downstream reporting can flag degraded estimates.

use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

/// Which tier produced the pi0 estimate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Pi0Tier {
    /// Smoothed lambda-grid estimate (primary).
    Spline,
    /// Histogram heuristic on p > 0.5 (fallback).
    Histogram,
    /// Caller-supplied constant (terminal fallback).
    Fixed,
}

impl Pi0Tier {
    /// Descriptive name for reporting.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Spline => "spline",
            Self::Histogram => "histogram",
            Self::Fixed => "fixed",
        }
    }
}

/// Pi0 estimate together with its provenance.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Pi0Estimate {
    /// Estimated proportion of truly null features, in [0, 1].
    pub value: f64,
    /// Tier that produced the value.
    pub tier: Pi0Tier,
}

/// Which estimator the caller wants.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Pi0Method {
    /// Spline method with automatic fallback chain.
    Smoother,
    /// Histogram heuristic directly.
    Histogram,
    /// Fixed constant.
    Fixed(f64),
}

impl Default for Pi0Method {
    fn default() -> Self {
        Self::Smoother
    }
}

/// Minimum feature count for the spline tier to be attempted.
const MIN_FEATURES_SPLINE: usize = 100;

/// Fully conservative default used when every tier is infeasible.
const DEFAULT_FIXED_PI0: f64 = 1.0;

/// Estimate pi0 from a vector of raw p-values.
///
/// Never errors: each tier falls through to the next on numerical failure,
/// terminating at the fixed constant. The returned value is always in
/// [0, 1].
pub fn estimate_pi0(p_values: &[f64], method: Pi0Method) -> Pi0Estimate {
    match method {
        Pi0Method::Fixed(value) => Pi0Estimate {
            value: value.clamp(0.0, 1.0),
            tier: Pi0Tier::Fixed,
        },
        Pi0Method::Histogram => histogram_pi0(p_values).unwrap_or(Pi0Estimate {
            value: DEFAULT_FIXED_PI0,
            tier: Pi0Tier::Fixed,
        }),
        Pi0Method::Smoother => spline_pi0(p_values)
            .or_else(|| histogram_pi0(p_values))
            .unwrap_or(Pi0Estimate {
                value: DEFAULT_FIXED_PI0,
                tier: Pi0Tier::Fixed,
            }),
    }
}

/// Storey-style smoother: pi0_hat(lambda) over a grid, cubic least-squares
/// fit evaluated at lambda = 1.
fn spline_pi0(p_values: &[f64]) -> Option<Pi0Estimate> {
    let m = p_values.len();
    if m < MIN_FEATURES_SPLINE {
        return None;
    }

    // lambda in {0.00, 0.01, ..., 0.95}
    let lambdas: Vec<f64> = (0..96).map(|i| i as f64 * 0.01).collect();
    let mut xs = Vec::with_capacity(lambdas.len());
    let mut ys = Vec::with_capacity(lambdas.len());
    for &lambda in &lambdas {
        let count = p_values.iter().filter(|&&p| p > lambda).count();
        let estimate = count as f64 / (m as f64 * (1.0 - lambda));
        if estimate.is_finite() {
            xs.push(lambda);
            ys.push(estimate);
        }
    }
    if xs.len() < 8 {
        return None;
    }

    // Cubic least squares, weighted by (1 - lambda) since the grid
    // estimates have variance growing as 1 / (1 - lambda); evaluate the
    // fitted curve at lambda = 1.
    let n = xs.len();
    let design = DMatrix::from_fn(n, 4, |r, c| {
        (1.0 - xs[r]).sqrt() * xs[r].powi(c as i32)
    });
    let response = DVector::from_fn(n, |r, _| (1.0 - xs[r]).sqrt() * ys[r]);
    let normal = design.transpose() * &design;
    let rhs = design.transpose() * response;
    let coeffs = normal.lu().solve(&rhs)?;

    let at_one: f64 = coeffs.iter().sum();
    if !at_one.is_finite() {
        return None;
    }
    Some(Pi0Estimate {
        value: at_one.clamp(0.0, 1.0),
        tier: Pi0Tier::Spline,
    })
}

/// Histogram heuristic: pi0 = min(1, 2 * mean(p | p > 0.5)).
fn histogram_pi0(p_values: &[f64]) -> Option<Pi0Estimate> {
    let upper: Vec<f64> = p_values.iter().copied().filter(|&p| p > 0.5).collect();
    if upper.is_empty() {
        return None;
    }
    let mean = upper.iter().sum::<f64>() / upper.len() as f64;
    let value = (2.0 * mean).min(1.0);
    if !value.is_finite() {
        return None;
    }
    Some(Pi0Estimate {
        value: value.clamp(0.0, 1.0),
        tier: Pi0Tier::Histogram,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Deterministic uniform variates for test data.
    fn lcg_uniform(seed: &mut u64) -> f64 {
        *seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        ((*seed >> 33) & 0x7FFF_FFFF) as f64 / 0x8000_0000u64 as f64
    }

    #[test]
    fn test_fixed_method() {
        let est = estimate_pi0(&[0.1, 0.2], Pi0Method::Fixed(0.8));
        assert_eq!(est.tier, Pi0Tier::Fixed);
        assert_eq!(est.value, 0.8);

        // Out-of-range constants are clamped.
        let est = estimate_pi0(&[], Pi0Method::Fixed(1.7));
        assert_eq!(est.value, 1.0);
    }

    #[test]
    fn test_histogram_all_null() {
        // Uniform p-values: pi0 should be near 1.
        let mut seed = 7u64;
        let p: Vec<f64> = (0..500).map(|_| lcg_uniform(&mut seed)).collect();
        let est = estimate_pi0(&p, Pi0Method::Histogram);
        assert_eq!(est.tier, Pi0Tier::Histogram);
        assert!(est.value > 0.85, "pi0 = {}", est.value);
    }

    #[test]
    fn test_spline_mostly_null() {
        // 900 uniform nulls + 100 small p-values: pi0 should land near 0.9.
        let mut seed = 42u64;
        let mut p: Vec<f64> = (0..900).map(|_| lcg_uniform(&mut seed)).collect();
        p.extend((0..100).map(|_| lcg_uniform(&mut seed) * 0.001));
        let est = estimate_pi0(&p, Pi0Method::Smoother);
        assert_eq!(est.tier, Pi0Tier::Spline);
        assert!(
            (0.75..=1.0).contains(&est.value),
            "pi0 = {} out of expected band",
            est.value
        );
    }

    #[test]
    fn test_small_input_falls_back() {
        // Below the spline minimum: the histogram tier answers.
        let p = vec![0.6, 0.7, 0.8, 0.9, 0.2, 0.1];
        let est = estimate_pi0(&p, Pi0Method::Smoother);
        assert_eq!(est.tier, Pi0Tier::Histogram);
        assert!((0.0..=1.0).contains(&est.value));
    }

    #[test]
    fn test_no_large_pvalues_terminal_fallback() {
        // Nothing above 0.5 and too few for the spline: fixed tier.
        let p = vec![0.001, 0.002, 0.003];
        let est = estimate_pi0(&p, Pi0Method::Smoother);
        assert_eq!(est.tier, Pi0Tier::Fixed);
        assert_eq!(est.value, 1.0);
    }

    #[test]
    fn test_never_out_of_range() {
        // Strong signal everywhere can push raw grid estimates past bounds.
        let p = vec![0.99; 200];
        let est = estimate_pi0(&p, Pi0Method::Smoother);
        assert!((0.0..=1.0).contains(&est.value));
    }
}
