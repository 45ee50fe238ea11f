//! MAD-based cutoff from the empirical null.
//!
//! Features with large p-values approximate the null effect-size
//! distribution; the cutoff is median(|effect|) + k * MAD(|effect|) over
//! that subset, with the MAD scaled to be consistent with a normal sigma.

use super::{median_of, EffectInputs, EffectSizeConfig};

/// Consistency constant relating the MAD to a Gaussian standard deviation.
const MAD_NORMAL_SCALE: f64 = 1.4826;

/// Cutoff = median + k * MAD of |effect| over null-like features.
///
/// Feasibility (enough null-like features) is checked by the caller.
pub fn mad_cutoff(inputs: &EffectInputs<'_>, config: &EffectSizeConfig) -> Option<f64> {
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

    let center = median_of(&null_abs);
    let deviations: Vec<f64> = null_abs.iter().map(|v| (v - center).abs()).collect();
    let mad = median_of(&deviations) * MAD_NORMAL_SCALE;

    let cutoff = center + config.mad_k * mad;
    cutoff.is_finite().then_some(cutoff.max(0.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::goal::AnalysisGoal;
    use approx::assert_relative_eq;

    fn inputs<'a>(es: &'a [f64], p: &'a [f64]) -> EffectInputs<'a> {
        EffectInputs {
            effect_sizes: es,
            p_values: p,
            std_errors: None,
            target_level: 0.05,
            goal: AnalysisGoal::Balanced,
        }
    }

    #[test]
    fn test_constant_null_gives_center() {
        // All null |effects| identical: MAD is zero, cutoff = the value.
        let es = vec![0.2; 50];
        let p = vec![0.9; 50];
        let cutoff = mad_cutoff(&inputs(&es, &p), &EffectSizeConfig::default()).unwrap();
        assert_relative_eq!(cutoff, 0.2, epsilon = 1e-12);
    }

    #[test]
    fn test_only_null_features_used() {
        // Huge significant effects must not move the cutoff.
        let mut es = vec![0.1; 40];
        es.extend([8.0, -9.0, 10.0]);
        let mut p = vec![0.8; 40];
        p.extend([0.0001, 0.0001, 0.0001]);

        let cutoff = mad_cutoff(&inputs(&es, &p), &EffectSizeConfig::default()).unwrap();
        assert_relative_eq!(cutoff, 0.1, epsilon = 1e-12);
    }

    #[test]
    fn test_k_scales_cutoff() {
        let es: Vec<f64> = (0..60).map(|i| (i % 7) as f64 * 0.1).collect();
        let p = vec![0.7; 60];
        let base = EffectSizeConfig::default();
        let wide = EffectSizeConfig {
            mad_k: 6.0,
            ..EffectSizeConfig::default()
        };
        let c3 = mad_cutoff(&inputs(&es, &p), &base).unwrap();
        let c6 = mad_cutoff(&inputs(&es, &p), &wide).unwrap();
        assert!(c6 > c3);
    }
}
