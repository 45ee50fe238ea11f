//! Family-wise error rate procedures: Holm, Hochberg, and Bonferroni.

use super::{sort_order, unsort};

/// Holm step-down adjustment.
///
/// With p-values sorted ascending, adjusted[i] = max over k <= i of
/// (m - k) * p[k] (0-based), enforced non-decreasing.
pub fn adjust_holm(p_values: &[f64]) -> Vec<f64> {
    let m = p_values.len();
    if m == 0 {
        return vec![];
    }
    let order = sort_order(p_values);

    let mut q_sorted = vec![0.0; m];
    let mut running_max = 0.0_f64;
    for i in 0..m {
        let factor = (m - i) as f64;
        running_max = running_max.max(factor * p_values[order[i]]);
        q_sorted[i] = running_max.min(1.0);
    }

    unsort(&q_sorted, &order)
}

/// Hochberg step-up adjustment.
///
/// With p-values sorted ascending, adjusted[i] = min over k >= i of
/// (m - k) * p[k] (0-based), enforced from the top down.
pub fn adjust_hochberg(p_values: &[f64]) -> Vec<f64> {
    let m = p_values.len();
    if m == 0 {
        return vec![];
    }
    let order = sort_order(p_values);

    let mut q_sorted = vec![0.0; m];
    let mut running_min = 1.0_f64;
    for i in (0..m).rev() {
        let factor = (m - i) as f64;
        running_min = running_min.min(factor * p_values[order[i]]);
        q_sorted[i] = running_min.min(1.0);
    }

    unsort(&q_sorted, &order)
}

/// Bonferroni adjustment: min(1, p * m), independent of rank.
pub fn adjust_bonferroni(p_values: &[f64]) -> Vec<f64> {
    let m = p_values.len() as f64;
    p_values.iter().map(|&p| (p * m).min(1.0)).collect()
}
