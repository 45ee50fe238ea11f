//! Percentile-based cutoff from the empirical null.

use super::{percentile_of, EffectInputs, EffectSizeConfig};

/// Goal-dependent percentile of |effect| among null-like features.
///
/// Feasibility (enough null-like features) is checked by the caller.
pub fn percentile_cutoff(inputs: &EffectInputs<'_>, config: &EffectSizeConfig) -> Option<f64> {
    let null_abs: Vec<f64> = inputs
        .effect_sizes
        .iter()
        .zip(inputs.p_values)
        .filter(|(_, &p)| p > config.null_p_cutoff)
        .map(|(e, _)| e.abs())
        .collect();
    if null_abs.is_empty() {
        return None;
    }

    let cutoff = percentile_of(&null_abs, config.percentile_for(inputs.goal));
    cutoff.is_finite().then_some(cutoff.max(0.0))
}
