//! Two-component Gaussian mixture cutoff.
//!
//! Models the effect-size distribution as a zero-centered scale mixture: a
//! narrow null component and a wider differential component, fit by EM with
//! the means pinned at zero. The cutoff is the |effect| at which posterior
//! membership crosses 0.5 between the components, which has a closed form
//! in the fitted weights and sigmas.

use super::{median_of, EffectInputs, EffectSizeConfig};

/// Floor on component sigmas to keep the densities finite.
const SIGMA_FLOOR: f64 = 1e-6;

/// Deterministic LCG used only to perturb a degenerate initialization.
fn lcg_uniform(state: &mut u64) -> f64 {
    *state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
    ((*state >> 33) & 0x7FFF_FFFF) as f64 / 0x8000_0000u64 as f64
}

fn log_density(x: f64, sigma: f64) -> f64 {
    let z = x / sigma;
    -0.5 * z * z - sigma.ln() - 0.5 * (2.0 * std::f64::consts::PI).ln()
}

/// Fit the mixture and return the posterior-crossover cutoff.
///
/// Returns `None` when the fit fails to converge or collapses (equal
/// sigmas, vanished component, or no real crossover). Initialization is
/// deterministic from the data scale; the pinned seed only perturbs the
/// wide component when the scale estimates coincide.
pub fn mixture_cutoff(inputs: &EffectInputs<'_>, config: &EffectSizeConfig) -> Option<f64> {
    let xs = inputs.effect_sizes;
    let n = xs.len();
    if n < config.min_mixture_features {
        return None;
    }

    // Scale-based initialization: null sigma from the MAD, differential
    // sigma from the overall spread.
    let abs: Vec<f64> = xs.iter().map(|x| x.abs()).collect();
    let center = median_of(&abs);
    let deviations: Vec<f64> = abs.iter().map(|v| (v - center).abs()).collect();
    let mut sigma0 = (median_of(&deviations) * 1.4826).max(SIGMA_FLOOR);

    let variance = xs.iter().map(|x| x * x).sum::<f64>() / n as f64;
    let mut sigma1 = (2.0 * variance.sqrt()).max(SIGMA_FLOOR);

    if sigma1 <= sigma0 {
        let mut state = config.seed;
        sigma1 = sigma0 * (1.5 + 0.5 * lcg_uniform(&mut state));
    }

    let mut weight1 = 0.1_f64;
    let mut responsibilities = vec![0.0; n];
    let mut previous_ll = f64::NEG_INFINITY;
    let mut converged = false;

    for _ in 0..config.mixture_max_iter {
        // E-step
        let mut log_likelihood = 0.0;
        for (i, &x) in xs.iter().enumerate() {
            let l0 = (1.0 - weight1).ln() + log_density(x, sigma0);
            let l1 = weight1.ln() + log_density(x, sigma1);
            let max = l0.max(l1);
            let total = max + ((l0 - max).exp() + (l1 - max).exp()).ln();
            responsibilities[i] = (l1 - total).exp();
            log_likelihood += total;
        }

        // M-step: weights and variances, means stay pinned at zero.
        let sum1: f64 = responsibilities.iter().sum();
        let sum0 = n as f64 - sum1;
        if sum1 < 1e-10 || sum0 < 1e-10 {
            return None;
        }
        weight1 = sum1 / n as f64;

        let var1 = xs
            .iter()
            .zip(&responsibilities)
            .map(|(x, r)| r * x * x)
            .sum::<f64>()
            / sum1;
        let var0 = xs
            .iter()
            .zip(&responsibilities)
            .map(|(x, r)| (1.0 - r) * x * x)
            .sum::<f64>()
            / sum0;
        sigma0 = var0.sqrt().max(SIGMA_FLOOR);
        sigma1 = var1.sqrt().max(SIGMA_FLOOR);

        if (log_likelihood - previous_ll).abs() < config.mixture_tol {
            converged = true;
            break;
        }
        previous_ll = log_likelihood;
    }

    if !converged {
        return None;
    }

    // Keep component 1 the wide one.
    if sigma1 < sigma0 {
        std::mem::swap(&mut sigma0, &mut sigma1);
        weight1 = 1.0 - weight1;
    }
    if sigma1 - sigma0 < SIGMA_FLOOR {
        return None;
    }

    // Posterior crossover: solve w0 phi(x; s0) = w1 phi(x; s1) for x^2.
    let weight0 = 1.0 - weight1;
    let numerator = 2.0 * ((weight0 * sigma1) / (weight1 * sigma0)).ln();
    let denominator = 1.0 / (sigma0 * sigma0) - 1.0 / (sigma1 * sigma1);
    if numerator <= 0.0 || denominator <= 0.0 {
        return None;
    }
    let cutoff = (numerator / denominator).sqrt();
    cutoff.is_finite().then_some(cutoff)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::goal::AnalysisGoal;

    fn inputs<'a>(es: &'a [f64], p: &'a [f64]) -> EffectInputs<'a> {
        EffectInputs {
            effect_sizes: es,
            p_values: p,
            std_errors: None,
            target_level: 0.05,
            goal: AnalysisGoal::Balanced,
        }
    }

    fn lcg_normal(state: &mut u64) -> f64 {
        // Sum of uniforms, good enough for test data.
        let mut total = 0.0;
        for _ in 0..12 {
            total += lcg_uniform(state);
        }
        total - 6.0
    }

    #[test]
    fn test_separates_null_from_signal() {
        let mut state = 11u64;
        let mut es: Vec<f64> = (0..900).map(|_| 0.2 * lcg_normal(&mut state)).collect();
        for i in 0..100 {
            let sign = if i % 2 == 0 { 1.0 } else { -1.0 };
            es.push(sign * (1.5 + 0.5 * lcg_normal(&mut state)));
        }
        let p = vec![0.5; 1000];

        let cutoff = mixture_cutoff(&inputs(&es, &p), &EffectSizeConfig::default()).unwrap();
        // Crossover should land between the null bulk and the signal.
        assert!(cutoff > 0.3 && cutoff < 1.6, "cutoff = {}", cutoff);
    }

    #[test]
    fn test_deterministic() {
        let mut state = 3u64;
        let es: Vec<f64> = (0..500)
            .map(|i| {
                if i < 450 {
                    0.2 * lcg_normal(&mut state)
                } else {
                    2.0 + 0.3 * lcg_normal(&mut state)
                }
            })
            .collect();
        let p = vec![0.5; 500];
        let config = EffectSizeConfig::default();

        let a = mixture_cutoff(&inputs(&es, &p), &config).unwrap();
        let b = mixture_cutoff(&inputs(&es, &p), &config).unwrap();
        assert_eq!(a.to_bits(), b.to_bits());
    }

    #[test]
    fn test_too_few_features() {
        let es = vec![0.1; 10];
        let p = vec![0.5; 10];
        assert!(mixture_cutoff(&inputs(&es, &p), &EffectSizeConfig::default()).is_none());
    }

    #[test]
    fn test_degenerate_single_scale() {
        // One pure scale: components collapse, no crossover.
        let es = vec![0.0; 200];
        let p = vec![0.5; 200];
        assert!(mixture_cutoff(&inputs(&es, &p), &EffectSizeConfig::default()).is_none());
    }
}
