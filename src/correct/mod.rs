//! Multiple testing correction procedures.
//!
//! Six interchangeable methods over a raw p-value vector: three FDR-family
//! (Benjamini-Hochberg, Benjamini-Yekutieli, Storey q-value) and three
//! FWER-family (Holm, Hochberg, Bonferroni). Every method returns adjusted
//! p-values in the input order, clipped to [0, 1].

pub mod fdr;
pub mod fwer;

use crate::error::{AtoError, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

pub use fdr::{adjust_bh, adjust_by, adjust_storey};
pub use fwer::{adjust_bonferroni, adjust_hochberg, adjust_holm};

/// A p-value adjustment procedure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AdjustmentMethod {
    /// Benjamini-Hochberg FDR control (independence or positive dependence).
    BenjaminiHochberg,
    /// Benjamini-Yekutieli FDR control under arbitrary dependence.
    BenjaminiYekutieli,
    /// Storey q-values, incorporating the null-proportion estimate.
    StoreyQvalue,
    /// Holm step-down FWER control.
    Holm,
    /// Hochberg step-up FWER control.
    Hochberg,
    /// Bonferroni FWER control.
    Bonferroni,
}

impl AdjustmentMethod {
    /// All methods, in conventional power order (most to least powerful).
    pub const ALL: [AdjustmentMethod; 6] = [
        AdjustmentMethod::StoreyQvalue,
        AdjustmentMethod::BenjaminiHochberg,
        AdjustmentMethod::BenjaminiYekutieli,
        AdjustmentMethod::Hochberg,
        AdjustmentMethod::Holm,
        AdjustmentMethod::Bonferroni,
    ];

    /// Short method name, as reported in methods text and CLI output.
    pub fn name(&self) -> &'static str {
        match self {
            Self::BenjaminiHochberg => "BH",
            Self::BenjaminiYekutieli => "BY",
            Self::StoreyQvalue => "qvalue",
            Self::Holm => "Holm",
            Self::Hochberg => "Hochberg",
            Self::Bonferroni => "Bonferroni",
        }
    }

    /// Full procedure name for publication-style text.
    pub fn long_name(&self) -> &'static str {
        match self {
            Self::BenjaminiHochberg => "Benjamini-Hochberg",
            Self::BenjaminiYekutieli => "Benjamini-Yekutieli",
            Self::StoreyQvalue => "Storey q-value",
            Self::Holm => "Holm step-down",
            Self::Hochberg => "Hochberg step-up",
            Self::Bonferroni => "Bonferroni",
        }
    }
}

impl FromStr for AdjustmentMethod {
    type Err = AtoError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "bh" | "benjamini_hochberg" | "benjamini-hochberg" | "fdr" => {
                Ok(Self::BenjaminiHochberg)
            }
            "by" | "benjamini_yekutieli" | "benjamini-yekutieli" => Ok(Self::BenjaminiYekutieli),
            "qvalue" | "q-value" | "storey" | "storey_qvalue" => Ok(Self::StoreyQvalue),
            "holm" => Ok(Self::Holm),
            "hochberg" => Ok(Self::Hochberg),
            "bonferroni" => Ok(Self::Bonferroni),
            other => Err(AtoError::Configuration(format!(
                "unknown adjustment method '{}'",
                other
            ))),
        }
    }
}

impl std::fmt::Display for AdjustmentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Apply an adjustment method to a raw p-value vector.
///
/// `pi0` is consumed only by the Storey q-value method; the others ignore
/// it. Returns adjusted values in the input order, clipped to [0, 1].
pub fn adjust(method: AdjustmentMethod, p_values: &[f64], pi0: f64) -> Vec<f64> {
    match method {
        AdjustmentMethod::BenjaminiHochberg => adjust_bh(p_values),
        AdjustmentMethod::BenjaminiYekutieli => adjust_by(p_values),
        AdjustmentMethod::StoreyQvalue => adjust_storey(p_values, pi0),
        AdjustmentMethod::Holm => adjust_holm(p_values),
        AdjustmentMethod::Hochberg => adjust_hochberg(p_values),
        AdjustmentMethod::Bonferroni => adjust_bonferroni(p_values),
    }
}

/// Ascending sort order of a p-value vector (indices into the original).
pub(crate) fn sort_order(p_values: &[f64]) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..p_values.len()).collect();
    indices.sort_by(|&a, &b| {
        p_values[a]
            .partial_cmp(&p_values[b])
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    indices
}

/// Scatter sorted adjusted values back to the original order.
pub(crate) fn unsort(sorted: &[f64], order: &[usize]) -> Vec<f64> {
    let mut out = vec![0.0; sorted.len()];
    for (rank, &orig) in order.iter().enumerate() {
        out[orig] = sorted[rank];
    }
    out
}
