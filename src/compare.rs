//! Side-by-side reruns under different goals, adjustment methods, or fixed
//! threshold grids.
//!
//! Every entry is computed independently from the normalized table; runs
//! share no mutable state, so they parallelize trivially.

use crate::correct::AdjustmentMethod;
use crate::data::{RawTable, ThresholdResult};
use crate::error::Result;
use crate::goal::AnalysisGoal;
use crate::optimize::{optimize_table, OptimizeConfig};
use crate::schema::normalize;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Rerun the optimizer once per goal.
///
/// Fields of `base` other than the goal (estimator tunables, explicit
/// column mapping, pi0 selection) apply to every run; per-goal defaults
/// fill in the adjustment method, target level, and scaling.
pub fn compare_goals(
    table: &RawTable,
    goals: &[AnalysisGoal],
    base: &OptimizeConfig,
) -> Result<BTreeMap<AnalysisGoal, ThresholdResult>> {
    let de = normalize(table, base.columns.as_ref())?;
    let runs: Vec<(AnalysisGoal, Result<ThresholdResult>)> = goals
        .par_iter()
        .map(|&goal| {
            let config = OptimizeConfig {
                goal,
                adjustment: None,
                target_level: None,
                scale_factor: None,
                ..base.clone()
            };
            (goal, optimize_table(&de, &config))
        })
        .collect();

    let mut out = BTreeMap::new();
    for (goal, result) in runs {
        out.insert(goal, result?);
    }
    Ok(out)
}

/// Rerun the optimizer once per adjustment method, holding the goal fixed.
pub fn compare_methods(
    table: &RawTable,
    methods: &[AdjustmentMethod],
    base: &OptimizeConfig,
) -> Result<BTreeMap<AdjustmentMethod, ThresholdResult>> {
    let de = normalize(table, base.columns.as_ref())?;
    let runs: Vec<(AdjustmentMethod, Result<ThresholdResult>)> = methods
        .par_iter()
        .map(|&method| {
            let config = OptimizeConfig {
                adjustment: Some(method),
                ..base.clone()
            };
            (method, optimize_table(&de, &config))
        })
        .collect();

    let mut out = BTreeMap::new();
    for (method, result) in runs {
        out.insert(method, result?);
    }
    Ok(out)
}

/// Significant-feature count for one fixed threshold combination.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridCell {
    /// Cutoff on |effect size|.
    pub effect_cutoff: f64,
    /// Cutoff on adjusted p-values.
    pub adjusted_p_cutoff: f64,
    /// Features passing both.
    pub n_significant: usize,
}

/// Count significant features over a grid of fixed cutoffs.
///
/// The adjusted p-values come from a single optimization under `base`;
/// only the decision thresholds vary across the grid.
pub fn threshold_grid(
    table: &RawTable,
    effect_cutoffs: &[f64],
    adjusted_p_cutoffs: &[f64],
    base: &OptimizeConfig,
) -> Result<Vec<GridCell>> {
    let result = crate::optimize::optimize(table, base)?;
    let features: Vec<(f64, f64)> = result
        .annotated
        .iter()
        .filter_map(|f| Some((f.effect_size?.abs(), f.adjusted_p_value?)))
        .collect();

    let combos: Vec<(f64, f64)> = effect_cutoffs
        .iter()
        .flat_map(|&e| adjusted_p_cutoffs.iter().map(move |&p| (e, p)))
        .collect();

    Ok(combos
        .par_iter()
        .map(|&(effect_cutoff, adjusted_p_cutoff)| {
            let n_significant = features
                .iter()
                .filter(|&&(es, ap)| es >= effect_cutoff && ap <= adjusted_p_cutoff)
                .count();
            GridCell {
                effect_cutoff,
                adjusted_p_cutoff,
                n_significant,
            }
        })
        .collect())
}
