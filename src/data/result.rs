//! Immutable output of a threshold optimization run.

use crate::correct::AdjustmentMethod;
use crate::effect::EffectSizeMethod;
use crate::error::Result;
use crate::goal::AnalysisGoal;
use crate::pi0::Pi0Tier;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// One annotated row of the optimized table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnnotatedFeature {
    /// Feature identifier.
    pub feature_id: String,
    /// Signed effect size, when present in the input.
    pub effect_size: Option<f64>,
    /// Raw p-value, when present in the input.
    pub p_value: Option<f64>,
    /// Mean expression, when the input carried it.
    pub mean_expression: Option<f64>,
    /// Effect-size standard error, when the input carried it.
    pub std_error: Option<f64>,
    /// Adjusted p-value; `None` for excluded rows.
    pub adjusted_p_value: Option<f64>,
    /// Passes both the adjusted-p and effect-size criteria.
    pub significant: bool,
    /// Row took no part in estimation (missing effect size or p-value).
    pub excluded: bool,
}

/// Complete result of one optimization call. Constructed once by the
/// optimizer and never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThresholdResult {
    /// Data-driven cutoff on |effect size|, before goal scaling.
    pub effect_size_cutoff: f64,
    /// Raw p-value threshold retained for traceability.
    pub p_value_cutoff: f64,
    /// Decision threshold on adjusted p-values.
    pub adjusted_p_cutoff: f64,
    /// Estimated proportion of truly null features.
    pub pi0_estimate: f64,
    /// Tier that produced the pi0 estimate.
    pub pi0_tier: Pi0Tier,
    /// Adjustment procedure applied.
    pub adjustment_method_used: AdjustmentMethod,
    /// Effect-size strategy requested.
    pub effect_size_method_used: EffectSizeMethod,
    /// Concrete strategies that contributed to the cutoff.
    pub effect_size_contributors: Vec<EffectSizeMethod>,
    /// Analysis goal of the run.
    pub goal: AnalysisGoal,
    /// Goal scaling applied to the effect-size cutoff.
    pub scale_factor: f64,
    /// Control level of the run (equals `adjusted_p_cutoff`).
    pub target_level: f64,
    /// Features called significant.
    pub n_significant: usize,
    /// Significant features with a positive effect size.
    pub n_up: usize,
    /// Significant features with a negative effect size.
    pub n_down: usize,
    /// Rows excluded from estimation.
    pub n_excluded: usize,
    /// Input table annotated with adjusted p-values and significance.
    pub annotated: Vec<AnnotatedFeature>,
    /// Publication-ready description of the procedure.
    pub methods_text: String,
    /// Numeric degradations encountered (fallback tiers, non-convergence).
    pub warnings: Vec<String>,
}

/// Scalar fields of a [`ThresholdResult`], for JSON export and logging.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThresholdSummary {
    pub goal: AnalysisGoal,
    pub adjustment_method: AdjustmentMethod,
    pub effect_size_method: EffectSizeMethod,
    pub effect_size_cutoff: f64,
    pub scale_factor: f64,
    pub effective_effect_cutoff: f64,
    pub target_level: f64,
    pub pi0_estimate: f64,
    pub pi0_tier: Pi0Tier,
    pub n_features: usize,
    pub n_excluded: usize,
    pub n_significant: usize,
    pub n_up: usize,
    pub n_down: usize,
    pub warnings: Vec<String>,
}

impl ThresholdResult {
    /// The effect-size cutoff actually applied: cutoff * scale factor.
    pub fn effective_effect_cutoff(&self) -> f64 {
        self.effect_size_cutoff * self.scale_factor
    }

    /// View of the significant features.
    pub fn significant_genes(&self) -> Vec<&AnnotatedFeature> {
        self.annotated.iter().filter(|f| f.significant).collect()
    }

    /// Scalar summary of the run.
    pub fn summary(&self) -> ThresholdSummary {
        ThresholdSummary {
            goal: self.goal,
            adjustment_method: self.adjustment_method_used,
            effect_size_method: self.effect_size_method_used,
            effect_size_cutoff: self.effect_size_cutoff,
            scale_factor: self.scale_factor,
            effective_effect_cutoff: self.effective_effect_cutoff(),
            target_level: self.target_level,
            pi0_estimate: self.pi0_estimate,
            pi0_tier: self.pi0_tier,
            n_features: self.annotated.len(),
            n_excluded: self.n_excluded,
            n_significant: self.n_significant,
            n_up: self.n_up,
            n_down: self.n_down,
            warnings: self.warnings.clone(),
        }
    }

    /// Scalar summary as pretty-printed JSON.
    pub fn summary_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.summary())?)
    }

    /// Write the annotated table to CSV.
    pub fn to_csv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);

        writeln!(
            writer,
            "feature_id,effect_size,p_value,mean_expression,std_error,adjusted_p_value,significant,excluded"
        )?;
        for f in &self.annotated {
            let fmt = |v: Option<f64>| match v {
                Some(x) if x.is_finite() => format!("{:.6e}", x),
                _ => "NA".to_string(),
            };
            writeln!(
                writer,
                "{},{},{},{},{},{},{},{}",
                f.feature_id,
                fmt(f.effect_size),
                fmt(f.p_value),
                fmt(f.mean_expression),
                fmt(f.std_error),
                fmt(f.adjusted_p_value),
                f.significant,
                f.excluded
            )?;
        }
        Ok(())
    }
}

impl std::fmt::Display for ThresholdResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Goal: {}", self.goal)?;
        writeln!(
            f,
            "Adjustment: {} at level {}",
            self.adjustment_method_used.name(),
            self.target_level
        )?;
        writeln!(
            f,
            "Effect-size cutoff: {:.4} ({} method, x{} scaling -> {:.4})",
            self.effect_size_cutoff,
            self.effect_size_method_used,
            self.scale_factor,
            self.effective_effect_cutoff()
        )?;
        writeln!(
            f,
            "pi0: {:.4} ({} tier)",
            self.pi0_estimate,
            self.pi0_tier.name()
        )?;
        writeln!(
            f,
            "Significant: {} ({} up, {} down) of {} features ({} excluded)",
            self.n_significant,
            self.n_up,
            self.n_down,
            self.annotated.len(),
            self.n_excluded
        )?;
        for w in &self.warnings {
            writeln!(f, "Warning: {}", w)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pi0::Pi0Tier;

    fn dummy_result() -> ThresholdResult {
        ThresholdResult {
            effect_size_cutoff: 0.5,
            p_value_cutoff: 0.05,
            adjusted_p_cutoff: 0.05,
            pi0_estimate: 0.9,
            pi0_tier: Pi0Tier::Spline,
            adjustment_method_used: AdjustmentMethod::BenjaminiHochberg,
            effect_size_method_used: EffectSizeMethod::Auto,
            effect_size_contributors: vec![EffectSizeMethod::Mad],
            goal: AnalysisGoal::Balanced,
            scale_factor: 1.0,
            target_level: 0.05,
            n_significant: 1,
            n_up: 1,
            n_down: 0,
            n_excluded: 0,
            annotated: vec![
                AnnotatedFeature {
                    feature_id: "g1".into(),
                    effect_size: Some(1.2),
                    p_value: Some(0.001),
                    mean_expression: None,
                    std_error: None,
                    adjusted_p_value: Some(0.002),
                    significant: true,
                    excluded: false,
                },
                AnnotatedFeature {
                    feature_id: "g2".into(),
                    effect_size: Some(0.1),
                    p_value: Some(0.8),
                    mean_expression: None,
                    std_error: None,
                    adjusted_p_value: Some(0.8),
                    significant: false,
                    excluded: false,
                },
            ],
            methods_text: String::new(),
            warnings: vec![],
        }
    }

    #[test]
    fn test_significant_genes_view() {
        let result = dummy_result();
        let sig = result.significant_genes();
        assert_eq!(sig.len(), 1);
        assert_eq!(sig[0].feature_id, "g1");
    }

    #[test]
    fn test_summary_json_roundtrip() {
        let result = dummy_result();
        let json = result.summary_json().unwrap();
        let parsed: ThresholdSummary = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.n_significant, 1);
        assert_eq!(parsed.effective_effect_cutoff, 0.5);
    }

    #[test]
    fn test_csv_export() {
        use tempfile::NamedTempFile;
        let result = dummy_result();
        let file = NamedTempFile::new().unwrap();
        result.to_csv(file.path()).unwrap();
        let text = std::fs::read_to_string(file.path()).unwrap();
        assert!(text.starts_with("feature_id,"));
        assert_eq!(text.lines().count(), 3);
        assert!(text.contains("g1"));
    }
}
