//! Data-driven effect-size cutoff estimation.
//!
//! Five strategies over the effect-size distribution: MAD on the empirical
//! null, a two-component Gaussian mixture, a power calculation from the
//! standard errors, a percentile of the null-like features, and a consensus
//! (`auto`) that medians whichever concrete strategies are feasible.

pub mod mad;
pub mod mixture;
pub mod percentile;
pub mod power;

use crate::error::{AtoError, Result};
use crate::goal::AnalysisGoal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// An effect-size cutoff strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EffectSizeMethod {
    /// Median + k * MAD of |effect| over the empirical null.
    Mad,
    /// Two-component Gaussian mixture, cutoff at the posterior crossover.
    Mixture,
    /// Detectable-effect calculation from the standard errors.
    Power,
    /// Goal-dependent percentile of |effect| over the empirical null.
    Percentile,
    /// Consensus of all feasible concrete strategies.
    Auto,
}

impl EffectSizeMethod {
    /// The concrete strategies, in consensus order.
    pub const CONCRETE: [EffectSizeMethod; 4] = [
        EffectSizeMethod::Mad,
        EffectSizeMethod::Mixture,
        EffectSizeMethod::Power,
        EffectSizeMethod::Percentile,
    ];

    /// Descriptive name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Mad => "mad",
            Self::Mixture => "mixture",
            Self::Power => "power",
            Self::Percentile => "percentile",
            Self::Auto => "auto",
        }
    }
}

impl FromStr for EffectSizeMethod {
    type Err = AtoError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "mad" => Ok(Self::Mad),
            "mixture" => Ok(Self::Mixture),
            "power" => Ok(Self::Power),
            "percentile" => Ok(Self::Percentile),
            "auto" | "consensus" => Ok(Self::Auto),
            other => Err(AtoError::Configuration(format!(
                "unknown effect-size method '{}'",
                other
            ))),
        }
    }
}

impl std::fmt::Display for EffectSizeMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Tunable constants for the estimators. Defaults follow common practice
/// and are deliberately overridable rather than contractual.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EffectSizeConfig {
    /// Multiplier on the MAD in the MAD strategy.
    pub mad_k: f64,
    /// P-value above which a feature is treated as null-like.
    pub null_p_cutoff: f64,
    /// Minimum null-like features for MAD and percentile strategies.
    pub min_null_features: usize,
    /// Minimum total features for the mixture strategy.
    pub min_mixture_features: usize,
    /// Target power for the power strategy.
    pub power: f64,
    /// Percentile of |effect| used by the percentile strategy, per goal;
    /// `None` selects the goal default.
    pub percentile: Option<f64>,
    /// Seed pinned for mixture initialization.
    pub seed: u64,
    /// Maximum EM iterations for the mixture fit.
    pub mixture_max_iter: usize,
    /// EM convergence tolerance on log-likelihood.
    pub mixture_tol: f64,
}

impl Default for EffectSizeConfig {
    fn default() -> Self {
        Self {
            mad_k: 3.0,
            null_p_cutoff: 0.5,
            min_null_features: 20,
            min_mixture_features: 50,
            power: 0.80,
            percentile: None,
            seed: 42,
            mixture_max_iter: 500,
            mixture_tol: 1e-8,
        }
    }
}

impl EffectSizeConfig {
    /// Percentile used by the percentile strategy for a goal.
    pub fn percentile_for(&self, goal: AnalysisGoal) -> f64 {
        self.percentile.unwrap_or(match goal {
            AnalysisGoal::Discovery => 0.90,
            AnalysisGoal::Balanced => 0.95,
            AnalysisGoal::Validation => 0.99,
        })
    }
}

/// Inputs shared by every strategy. Slices cover non-excluded features
/// only, in original row order.
#[derive(Debug, Clone, Copy)]
pub struct EffectInputs<'a> {
    /// Signed effect sizes.
    pub effect_sizes: &'a [f64],
    /// Raw p-values, parallel to `effect_sizes`.
    pub p_values: &'a [f64],
    /// Standard errors of the effect sizes, when available.
    pub std_errors: Option<&'a [f64]>,
    /// Target level of the active policy (used by the power strategy).
    pub target_level: f64,
    /// Active analysis goal (selects the percentile default).
    pub goal: AnalysisGoal,
}

/// Resolved effect-size cutoff with provenance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EffectSizeEstimate {
    /// Non-negative cutoff applied symmetrically to |effect|.
    pub cutoff: f64,
    /// Method the caller asked for.
    pub method: EffectSizeMethod,
    /// Concrete strategies that produced the value (singleton unless
    /// `auto`).
    pub contributors: Vec<EffectSizeMethod>,
    /// Strategies that passed their precondition but failed numerically
    /// and were dropped (consensus mode only; a concrete request errors
    /// instead).
    pub failed: Vec<EffectSizeMethod>,
    /// Set when every strategy was infeasible and the percentile fallback
    /// answered alone.
    pub degraded: bool,
}

/// Check a concrete strategy's preconditions, naming the one that fails.
pub fn feasibility(
    method: EffectSizeMethod,
    inputs: &EffectInputs<'_>,
    config: &EffectSizeConfig,
) -> std::result::Result<(), String> {
    let n_null = inputs
        .p_values
        .iter()
        .filter(|&&p| p > config.null_p_cutoff)
        .count();
    match method {
        EffectSizeMethod::Mad | EffectSizeMethod::Percentile => {
            if n_null < config.min_null_features {
                Err(format!(
                    "{} strategy needs at least {} features with p > {}, found {}",
                    method.name(),
                    config.min_null_features,
                    config.null_p_cutoff,
                    n_null
                ))
            } else {
                Ok(())
            }
        }
        EffectSizeMethod::Mixture => {
            if inputs.effect_sizes.len() < config.min_mixture_features {
                Err(format!(
                    "mixture strategy needs at least {} features, found {}",
                    config.min_mixture_features,
                    inputs.effect_sizes.len()
                ))
            } else {
                Ok(())
            }
        }
        EffectSizeMethod::Power => {
            if inputs.std_errors.is_none() {
                Err("power strategy needs an effect-size standard-error column".to_string())
            } else {
                Ok(())
            }
        }
        EffectSizeMethod::Auto => Ok(()),
    }
}

/// Run one concrete strategy, assuming feasibility already held.
///
/// Returns `None` on numerical failure (currently only the mixture fit can
/// fail after its precondition passes).
fn run_concrete(
    method: EffectSizeMethod,
    inputs: &EffectInputs<'_>,
    config: &EffectSizeConfig,
) -> Option<f64> {
    match method {
        EffectSizeMethod::Mad => mad::mad_cutoff(inputs, config),
        EffectSizeMethod::Mixture => mixture::mixture_cutoff(inputs, config),
        EffectSizeMethod::Power => power::power_cutoff(inputs, config),
        EffectSizeMethod::Percentile => percentile::percentile_cutoff(inputs, config),
        EffectSizeMethod::Auto => unreachable!("auto is resolved in estimate_cutoff"),
    }
}

/// Resolve the effect-size cutoff for the requested method.
///
/// Concrete methods error with the failed precondition when infeasible.
/// `auto` medians every feasible strategy, recording the contributors; if
/// none is feasible it falls back to the always-feasible percentile
/// strategy computed over all features and flags degraded confidence.
pub fn estimate_cutoff(
    method: EffectSizeMethod,
    inputs: &EffectInputs<'_>,
    config: &EffectSizeConfig,
) -> Result<EffectSizeEstimate> {
    if inputs.effect_sizes.is_empty() {
        return Err(AtoError::Data(
            "no features available for effect-size estimation".to_string(),
        ));
    }

    if method != EffectSizeMethod::Auto {
        feasibility(method, inputs, config).map_err(AtoError::Data)?;
        let cutoff = run_concrete(method, inputs, config).ok_or_else(|| {
            AtoError::Numerical(format!("{} strategy failed to converge", method.name()))
        })?;
        return Ok(EffectSizeEstimate {
            cutoff,
            method,
            contributors: vec![method],
            failed: Vec::new(),
            degraded: false,
        });
    }

    let mut contributors = Vec::new();
    let mut cutoffs = Vec::new();
    let mut failed = Vec::new();
    for concrete in EffectSizeMethod::CONCRETE {
        if feasibility(concrete, inputs, config).is_err() {
            continue;
        }
        match run_concrete(concrete, inputs, config) {
            Some(cutoff) => {
                contributors.push(concrete);
                cutoffs.push(cutoff);
            }
            None => failed.push(concrete),
        }
    }

    if cutoffs.is_empty() {
        // Percentile over all features, ignoring the null-set minimum.
        let abs: Vec<f64> = inputs.effect_sizes.iter().map(|e| e.abs()).collect();
        let cutoff = percentile_of(&abs, config.percentile_for(inputs.goal));
        return Ok(EffectSizeEstimate {
            cutoff,
            method: EffectSizeMethod::Auto,
            contributors: vec![EffectSizeMethod::Percentile],
            failed,
            degraded: true,
        });
    }

    Ok(EffectSizeEstimate {
        cutoff: median_of(&cutoffs),
        method: EffectSizeMethod::Auto,
        contributors,
        failed,
        degraded: false,
    })
}

/// Median of a non-empty slice.
pub(crate) fn median_of(values: &[f64]) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let n = sorted.len();
    if n % 2 == 1 {
        sorted[n / 2]
    } else {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    }
}

/// Percentile (0..=1) of a non-empty slice, with linear interpolation.
pub(crate) fn percentile_of(values: &[f64], fraction: f64) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let n = sorted.len();
    if n == 1 {
        return sorted[0];
    }
    let position = fraction.clamp(0.0, 1.0) * (n - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    let weight = position - lower as f64;
    sorted[lower] * (1.0 - weight) + sorted[upper] * weight
}
