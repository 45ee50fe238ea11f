//! Power-based cutoff from the effect-size standard errors.
//!
//! The minimum detectable effect at the active target level and a chosen
//! power is (z_{1-alpha/2} + z_{power}) * se; the median standard error
//! across features stands in for se.

use super::{median_of, EffectInputs, EffectSizeConfig};
use statrs::distribution::{ContinuousCDF, Normal};

/// Cutoff = (z_{1-alpha/2} + z_{power}) * median(se).
///
/// Feasibility (presence of the standard-error column) is checked by the
/// caller; rows with a missing or non-positive standard error are skipped.
pub fn power_cutoff(inputs: &EffectInputs<'_>, config: &EffectSizeConfig) -> Option<f64> {
    let std_errors = inputs.std_errors?;
    let usable: Vec<f64> = std_errors
        .iter()
        .copied()
        .filter(|se| se.is_finite() && *se > 0.0)
        .collect();
    if usable.is_empty() {
        return None;
    }

    let alpha = inputs.target_level.clamp(1e-12, 1.0 - 1e-12);
    let power = config.power.clamp(1e-12, 1.0 - 1e-12);

    let normal = Normal::new(0.0, 1.0).unwrap();
    let z_alpha = normal.inverse_cdf(1.0 - alpha / 2.0);
    let z_power = normal.inverse_cdf(power);

    let cutoff = (z_alpha + z_power) * median_of(&usable);
    (cutoff.is_finite() && cutoff >= 0.0).then_some(cutoff)
}
