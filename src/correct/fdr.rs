//! False discovery rate procedures: BH, BY, and Storey q-values.

use super::{sort_order, unsort};

/// Benjamini-Hochberg FDR adjustment.
///
/// With p-values sorted ascending, adjusted[i] = min over j >= i of
/// p[j] * m / (j + 1), enforced non-decreasing from the top.
pub fn adjust_bh(p_values: &[f64]) -> Vec<f64> {
    adjust_bh_scaled(p_values, 1.0)
}

/// Benjamini-Yekutieli FDR adjustment, valid under arbitrary dependence.
///
/// BH scaled by the harmonic sum c(m) = sum_{k=1..m} 1/k.
pub fn adjust_by(p_values: &[f64]) -> Vec<f64> {
    let m = p_values.len();
    let c_m: f64 = (1..=m).map(|k| 1.0 / k as f64).sum();
    adjust_bh_scaled(p_values, c_m)
}

fn adjust_bh_scaled(p_values: &[f64], scale: f64) -> Vec<f64> {
    let m = p_values.len();
    if m == 0 {
        return vec![];
    }
    let order = sort_order(p_values);
    let m_f64 = m as f64;

    let mut q_sorted = vec![0.0; m];
    q_sorted[m - 1] = (p_values[order[m - 1]] * scale).min(1.0);
    for i in (0..m - 1).rev() {
        let rank = (i + 1) as f64;
        let adjusted = p_values[order[i]] * scale * m_f64 / rank;
        q_sorted[i] = adjusted.min(q_sorted[i + 1]).min(1.0);
    }

    unsort(&q_sorted, &order)
}

/// Storey q-values.
///
/// q[m-1] = min(1, pi0 * p[m-1]); stepping down,
/// q[i] = min(q[i+1], pi0 * p[i] * m / (i + 1)).
pub fn adjust_storey(p_values: &[f64], pi0: f64) -> Vec<f64> {
    let m = p_values.len();
    if m == 0 {
        return vec![];
    }
    let order = sort_order(p_values);
    let m_f64 = m as f64;
    let pi0 = pi0.clamp(0.0, 1.0);

    let mut q_sorted = vec![0.0; m];
    q_sorted[m - 1] = (pi0 * p_values[order[m - 1]]).min(1.0);
    for i in (0..m - 1).rev() {
        let rank = (i + 1) as f64;
        let q = pi0 * p_values[order[i]] * m_f64 / rank;
        q_sorted[i] = q.min(q_sorted[i + 1]).min(1.0).max(0.0);
    }

    unsort(&q_sorted, &order)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_bh_known_values() {
        // Rank 1: 0.005 * 5/1 = 0.025
        // Rank 2: 0.01 * 5/2 = 0.025
        // Rank 3: 0.02 * 5/3 = 0.0333
        // Rank 4: 0.04 * 5/4 = 0.05
        // Rank 5: 0.1 * 5/5 = 0.1
        let p = vec![0.005, 0.01, 0.02, 0.04, 0.1];
        let q = adjust_bh(&p);
        assert_relative_eq!(q[0], 0.025, epsilon = 1e-12);
        assert_relative_eq!(q[1], 0.025, epsilon = 1e-12);
        assert_relative_eq!(q[2], 1.0 / 30.0, epsilon = 1e-12);
        assert_relative_eq!(q[3], 0.05, epsilon = 1e-12);
        assert_relative_eq!(q[4], 0.1, epsilon = 1e-12);
    }

    #[test]
    fn test_bh_unsorted_input() {
        let p = vec![0.04, 0.005, 0.1, 0.01, 0.02];
        let q = adjust_bh(&p);
        assert_relative_eq!(q[1], 0.025, epsilon = 1e-12);
        assert_relative_eq!(q[0], 0.05, epsilon = 1e-12);
        assert_relative_eq!(q[2], 0.1, epsilon = 1e-12);
    }

    #[test]
    fn test_bh_monotone_over_ranks() {
        let p = vec![0.001, 0.01, 0.02, 0.05, 0.1, 0.5];
        let q = adjust_bh(&p);
        for i in 1..q.len() {
            assert!(q[i] >= q[i - 1] - 1e-12);
        }
    }

    #[test]
    fn test_by_harmonic_scaling() {
        // m=1: c(1)=1, BY == BH == p.
        let q = adjust_by(&[0.03]);
        assert_relative_eq!(q[0], 0.03, epsilon = 1e-12);

        // m=3: c(3) = 1 + 1/2 + 1/3 = 11/6.
        let p = vec![0.01, 0.02, 0.03];
        let bh = adjust_bh(&p);
        let by = adjust_by(&p);
        for i in 0..3 {
            assert_relative_eq!(by[i], (bh[i] * 11.0 / 6.0).min(1.0), epsilon = 1e-12);
        }
    }

    #[test]
    fn test_storey_pi0_one_matches_bh() {
        let p = vec![0.005, 0.01, 0.02, 0.04, 0.1];
        let q = adjust_storey(&p, 1.0);
        let bh = adjust_bh(&p);
        for i in 0..p.len() {
            assert_relative_eq!(q[i], bh[i], epsilon = 1e-12);
        }
    }

    #[test]
    fn test_storey_pi0_scales_down() {
        let p = vec![0.005, 0.01, 0.02, 0.04, 0.1];
        let q_half = adjust_storey(&p, 0.5);
        let bh = adjust_bh(&p);
        for i in 0..p.len() {
            assert_relative_eq!(q_half[i], bh[i] * 0.5, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_empty() {
        assert!(adjust_bh(&[]).is_empty());
        assert!(adjust_by(&[]).is_empty());
        assert!(adjust_storey(&[], 1.0).is_empty());
    }
}
