//! The optimization entry point: from a raw DE table to a
//! [`ThresholdResult`].
//!
//! One call runs the full chain: input normalization, pi0 estimation,
//! p-value adjustment, effect-size cutoff resolution, annotation, and
//! methods-text rendering. A call either returns a fully populated result
//! or errors before constructing one; estimator fallbacks are recorded as
//! warnings inside the result, never raised.

use crate::correct::{adjust, AdjustmentMethod};
use crate::data::{AnnotatedFeature, DeTable, RawTable, ThresholdResult};
use crate::effect::{estimate_cutoff, EffectInputs, EffectSizeConfig, EffectSizeMethod};
use crate::error::{AtoError, Result};
use crate::goal::{AnalysisGoal, GoalPolicy};
use crate::pi0::{estimate_pi0, Pi0Method, Pi0Tier};
use crate::schema::{normalize, ColumnMap};
use serde::{Deserialize, Serialize};

/// Parameters of one optimization run.
///
/// The goal supplies defaults for the adjustment method, target level, and
/// effect-size scaling; each can be overridden individually.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizeConfig {
    /// Analysis objective.
    pub goal: AnalysisGoal,
    /// Override of the goal's adjustment method.
    pub adjustment: Option<AdjustmentMethod>,
    /// Override of the goal's target level; must lie in (0, 1).
    pub target_level: Option<f64>,
    /// Override of the goal's effect-size scale factor.
    pub scale_factor: Option<f64>,
    /// Effect-size cutoff strategy.
    pub effect_method: EffectSizeMethod,
    /// Tunables for the effect-size strategies.
    pub effect: EffectSizeConfig,
    /// Pi0 estimator selection.
    pub pi0: Pi0Method,
    /// Explicit column-name mapping; `None` uses alias resolution.
    pub columns: Option<ColumnMap>,
}

impl Default for OptimizeConfig {
    fn default() -> Self {
        Self {
            goal: AnalysisGoal::Balanced,
            adjustment: None,
            target_level: None,
            scale_factor: None,
            effect_method: EffectSizeMethod::Auto,
            effect: EffectSizeConfig::default(),
            pi0: Pi0Method::default(),
            columns: None,
        }
    }
}

impl OptimizeConfig {
    /// Config with a goal and defaults everywhere else.
    pub fn for_goal(goal: AnalysisGoal) -> Self {
        Self {
            goal,
            ..Self::default()
        }
    }
}

/// Normalize a raw table and optimize thresholds over it.
pub fn optimize(table: &RawTable, config: &OptimizeConfig) -> Result<ThresholdResult> {
    let de = normalize(table, config.columns.as_ref())?;
    optimize_table(&de, config)
}

/// Optimize thresholds over an already-normalized table.
pub fn optimize_table(de: &DeTable, config: &OptimizeConfig) -> Result<ThresholdResult> {
    let m = de.m();
    if m == 0 {
        return Err(AtoError::Data(
            "no features left after excluding rows with missing values".to_string(),
        ));
    }

    let policy = GoalPolicy::resolve(
        config.goal,
        config.adjustment,
        config.target_level,
        config.scale_factor,
    )?;

    let mut warnings = Vec::new();

    let included = de.included_indices();
    let p_values = de.included_p_values();
    let effect_sizes = de.included_effect_sizes();
    let std_errors = de.included_std_errors();

    let pi0 = estimate_pi0(&p_values, config.pi0);
    if config.pi0 == Pi0Method::Smoother && pi0.tier != Pi0Tier::Spline {
        warnings.push(format!(
            "pi0 spline estimation was infeasible; fell back to the {} tier",
            pi0.tier.name()
        ));
    }

    let adjusted = adjust(policy.adjustment, &p_values, pi0.value);

    let effect_inputs = EffectInputs {
        effect_sizes: &effect_sizes,
        p_values: &p_values,
        std_errors: std_errors.as_deref(),
        target_level: policy.target_level,
        goal: config.goal,
    };
    let effect = estimate_cutoff(config.effect_method, &effect_inputs, &config.effect)?;
    for method in &effect.failed {
        warnings.push(format!(
            "{} strategy passed its precondition but failed to converge and was \
             dropped from the consensus",
            method.name()
        ));
    }
    if effect.degraded {
        warnings.push(
            "no effect-size strategy was feasible; percentile fallback over all features \
             (degraded confidence)"
                .to_string(),
        );
    }

    let effective_cutoff = effect.cutoff * policy.scale_factor;

    // Scatter adjusted p-values back to original rows and annotate.
    let mut adjusted_by_row: Vec<Option<f64>> = vec![None; de.n_features()];
    for (k, &row) in included.iter().enumerate() {
        adjusted_by_row[row] = Some(adjusted[k]);
    }

    let mut annotated = Vec::with_capacity(de.n_features());
    let mut n_significant = 0;
    let mut n_up = 0;
    let mut n_down = 0;
    let mut p_value_cutoff = 0.0_f64;

    for i in 0..de.n_features() {
        let excluded = de.excluded[i];
        let effect_size = (!de.effect_size[i].is_nan()).then_some(de.effect_size[i]);
        let p_value = (!de.p_value[i].is_nan()).then_some(de.p_value[i]);
        let adjusted_p = adjusted_by_row[i];

        let significant = match (excluded, effect_size, adjusted_p) {
            (false, Some(es), Some(ap)) => {
                ap <= policy.target_level && es.abs() >= effective_cutoff
            }
            _ => false,
        };
        if significant {
            n_significant += 1;
            if de.effect_size[i] > 0.0 {
                n_up += 1;
            } else if de.effect_size[i] < 0.0 {
                n_down += 1;
            }
            // Largest raw p among the calls, kept for traceability.
            p_value_cutoff = p_value_cutoff.max(de.p_value[i]);
        }

        annotated.push(AnnotatedFeature {
            feature_id: de.feature_ids[i].clone(),
            effect_size,
            p_value,
            mean_expression: de
                .mean_expression
                .as_ref()
                .map(|v| v[i])
                .filter(|x| !x.is_nan()),
            std_error: de
                .std_error
                .as_ref()
                .map(|v| v[i])
                .filter(|x| !x.is_nan()),
            adjusted_p_value: adjusted_p,
            significant,
            excluded,
        });
    }

    let n_excluded = de.n_features() - m;
    let methods_text = render_methods_text(
        config.goal,
        policy,
        pi0.value,
        pi0.tier,
        &effect,
        effective_cutoff,
        de.n_features(),
        n_excluded,
        n_significant,
        n_up,
        n_down,
    );

    Ok(ThresholdResult {
        effect_size_cutoff: effect.cutoff,
        p_value_cutoff,
        adjusted_p_cutoff: policy.target_level,
        pi0_estimate: pi0.value,
        pi0_tier: pi0.tier,
        adjustment_method_used: policy.adjustment,
        effect_size_method_used: effect.method,
        effect_size_contributors: effect.contributors,
        goal: config.goal,
        scale_factor: policy.scale_factor,
        target_level: policy.target_level,
        n_significant,
        n_up,
        n_down,
        n_excluded,
        annotated,
        methods_text,
        warnings,
    })
}

#[allow(clippy::too_many_arguments)]
fn render_methods_text(
    goal: AnalysisGoal,
    policy: GoalPolicy,
    pi0: f64,
    pi0_tier: Pi0Tier,
    effect: &crate::effect::EffectSizeEstimate,
    effective_cutoff: f64,
    n_features: usize,
    n_excluded: usize,
    n_significant: usize,
    n_up: usize,
    n_down: usize,
) -> String {
    let contributors: Vec<&str> = effect.contributors.iter().map(|m| m.name()).collect();
    format!(
        "Significance thresholds were derived adaptively from the data ({} goal). \
         P-values were adjusted with the {} procedure and features with adjusted \
         p <= {} were considered significant. The proportion of null features (pi0) \
         was estimated at {:.3} using the {} method. An absolute effect-size cutoff \
         of {:.3} was derived by the {} strategy ({}), scaled by {} to {:.3}. \
         Of {} features ({} excluded for missing values), {} were called significant \
         ({} up-regulated, {} down-regulated).",
        goal,
        policy.adjustment.long_name(),
        policy.target_level,
        pi0,
        pi0_tier.name(),
        effect.cutoff,
        effect.method,
        contributors.join(", "),
        policy.scale_factor,
        effective_cutoff,
        n_features,
        n_excluded,
        n_significant,
        n_up,
        n_down,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Column;

    fn raw_table(effect: &[f64], p: &[f64]) -> RawTable {
        let ids = (0..effect.len()).map(|i| format!("g{}", i)).collect();
        RawTable::new(
            ids,
            vec![
                (
                    "log2FoldChange".to_string(),
                    Column::Numeric(effect.iter().map(|&v| Some(v)).collect()),
                ),
                (
                    "pvalue".to_string(),
                    Column::Numeric(p.iter().map(|&v| Some(v)).collect()),
                ),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_all_null_input_runs_clean() {
        // All p = 1, all effects = 0: zero calls, no error, any goal.
        let effect = vec![0.0; 120];
        let p = vec![1.0; 120];
        let table = raw_table(&effect, &p);
        for goal in AnalysisGoal::ALL {
            let result = optimize(&table, &OptimizeConfig::for_goal(goal)).unwrap();
            assert_eq!(result.n_significant, 0, "goal {}", goal);
            assert_eq!(result.n_up, 0);
            assert_eq!(result.n_down, 0);
        }
    }

    #[test]
    fn test_empty_after_exclusion_errors() {
        let table = RawTable::new(
            vec!["g0".to_string()],
            vec![
                ("logFC".to_string(), Column::Numeric(vec![None])),
                ("pvalue".to_string(), Column::Numeric(vec![Some(0.1)])),
            ],
        )
        .unwrap();
        let err = optimize(&table, &OptimizeConfig::default()).unwrap_err();
        assert!(matches!(err, AtoError::Data(_)));
    }

    #[test]
    fn test_excluded_rows_annotated_not_significant() {
        let table = RawTable::new(
            (0..60).map(|i| format!("g{}", i)).collect(),
            vec![
                (
                    "logFC".to_string(),
                    Column::Numeric(
                        (0..60)
                            .map(|i| if i == 0 { None } else { Some(2.0) })
                            .collect(),
                    ),
                ),
                (
                    "pvalue".to_string(),
                    Column::Numeric((0..60).map(|i| Some(if i < 30 { 0.001 } else { 0.9 })).collect()),
                ),
            ],
        )
        .unwrap();
        let result = optimize(&table, &OptimizeConfig::default()).unwrap();
        assert_eq!(result.n_excluded, 1);
        assert_eq!(result.annotated.len(), 60);
        let first = &result.annotated[0];
        assert!(first.excluded);
        assert!(!first.significant);
        assert!(first.adjusted_p_value.is_none());
    }

    #[test]
    fn test_nonconvergent_strategy_surfaces_as_warning() {
        // Identical effect sizes: the mixture fit is attempted (n >= 50)
        // but collapses. The failure must reach the result's warnings, not
        // vanish from the consensus silently.
        let effect = vec![1.0; 60];
        let p: Vec<f64> = (0..60).map(|i| (i as f64 + 0.5) / 60.0).collect();
        let table = raw_table(&effect, &p);
        let result = optimize(&table, &OptimizeConfig::default()).unwrap();

        assert!(!result
            .effect_size_contributors
            .contains(&EffectSizeMethod::Mixture));
        assert!(
            result.warnings.iter().any(|w| w.contains("mixture")),
            "warnings = {:?}",
            result.warnings
        );
    }

    #[test]
    fn test_round_trip_of_significance_flags() {
        let effect: Vec<f64> = (0..200)
            .map(|i| if i % 5 == 0 { 2.5 } else { 0.05 })
            .collect();
        let p: Vec<f64> = (0..200)
            .map(|i| if i % 5 == 0 { 1e-6 } else { 0.6 })
            .collect();
        let table = raw_table(&effect, &p);
        let result = optimize(&table, &OptimizeConfig::default()).unwrap();

        let cutoff = result.effective_effect_cutoff();
        for f in &result.annotated {
            let expected = match (f.excluded, f.effect_size, f.adjusted_p_value) {
                (false, Some(es), Some(ap)) => {
                    ap <= result.target_level && es.abs() >= cutoff
                }
                _ => false,
            };
            assert_eq!(f.significant, expected, "feature {}", f.feature_id);
        }
        assert!(result.n_significant > 0);
    }

    #[test]
    fn test_determinism() {
        let effect: Vec<f64> = (0..300).map(|i| ((i * 37) % 100) as f64 / 25.0 - 2.0).collect();
        let p: Vec<f64> = (0..300).map(|i| ((i * 61) % 997) as f64 / 997.0).collect();
        let table = raw_table(&effect, &p);
        let config = OptimizeConfig::default();

        let a = optimize(&table, &config).unwrap();
        let b = optimize(&table, &config).unwrap();
        assert_eq!(a.effect_size_cutoff.to_bits(), b.effect_size_cutoff.to_bits());
        assert_eq!(a.pi0_estimate.to_bits(), b.pi0_estimate.to_bits());
        assert_eq!(a.n_significant, b.n_significant);
        assert_eq!(a.methods_text, b.methods_text);
    }

    #[test]
    fn test_methods_text_mentions_key_facts() {
        let effect: Vec<f64> = (0..150).map(|i| (i % 10) as f64 / 5.0 - 1.0).collect();
        let p: Vec<f64> = (0..150).map(|i| ((i * 7) % 150) as f64 / 150.0).collect();
        let table = raw_table(&effect, &p);
        let result = optimize(&table, &OptimizeConfig::default()).unwrap();

        assert!(result.methods_text.contains("Benjamini-Hochberg"));
        assert!(result.methods_text.contains("balanced"));
        assert!(result.methods_text.contains("pi0"));
    }

    #[test]
    fn test_override_only_replaces_named_field() {
        let effect: Vec<f64> = (0..150).map(|i| (i % 10) as f64 / 5.0 - 1.0).collect();
        let p: Vec<f64> = (0..150).map(|i| ((i * 7) % 150) as f64 / 150.0).collect();
        let table = raw_table(&effect, &p);

        let config = OptimizeConfig {
            adjustment: Some(AdjustmentMethod::Bonferroni),
            ..OptimizeConfig::for_goal(AnalysisGoal::Discovery)
        };
        let result = optimize(&table, &config).unwrap();
        assert_eq!(result.adjustment_method_used, AdjustmentMethod::Bonferroni);
        // Goal still supplies the unspecified fields.
        assert_eq!(result.target_level, 0.10);
        assert_eq!(result.scale_factor, 0.7);
    }
}
