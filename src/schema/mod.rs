//! Input normalization: resolving upstream column conventions onto the
//! canonical schema.
//!
//! Upstream DE tools disagree on column naming (`log2FoldChange`, `logFC`,
//! `log2FC`, ...). Resolution tries an explicit [`ColumnMap`] first, then a
//! fixed alias table, case-insensitively. A probability-style column
//! (`prob`) is accepted as significance evidence and converted via
//! `p = 1 - prob`. The normalizer is a pure transform: it builds a fresh
//! [`DeTable`] and never mutates its input.

use crate::data::{Column, DeTable, RawTable};
use crate::error::{AtoError, Result};
use serde::{Deserialize, Serialize};

/// Recognized aliases for the effect-size column.
pub const EFFECT_SIZE_ALIASES: &[&str] = &["log2FoldChange", "logFC", "log2FC", "lfc"];

/// Recognized aliases for the p-value column.
pub const P_VALUE_ALIASES: &[&str] = &["pvalue", "PValue", "P.Value", "pval"];

/// Probability-style significance column, converted via `p = 1 - prob`.
pub const PROBABILITY_ALIASES: &[&str] = &["prob"];

/// Upstream adjusted-p columns. Adjustment is always recomputed here, so
/// these never substitute for raw p-values; they are recognized only to
/// point at them when no raw p-value column resolves.
pub const PADJ_ALIASES: &[&str] = &["padj", "FDR", "adj.P.Val", "qvalue"];

/// Recognized aliases for the mean-expression column.
pub const MEAN_EXPRESSION_ALIASES: &[&str] = &["baseMean", "AveExpr", "logCPM"];

/// Recognized aliases for the effect-size standard-error column.
pub const STD_ERROR_ALIASES: &[&str] = &["lfcSE", "SE"];

/// Explicit column-name overrides. Any field left `None` falls back to
/// alias resolution.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ColumnMap {
    /// Column holding the signed effect size.
    pub effect_size: Option<String>,
    /// Column holding the raw p-value.
    pub p_value: Option<String>,
    /// Column holding the mean expression.
    pub mean_expression: Option<String>,
    /// Column holding the effect-size standard error.
    pub std_error: Option<String>,
}

fn find_alias<'a>(table: &'a RawTable, aliases: &[&str]) -> Option<&'a str> {
    for (name, _) in &table.columns {
        if aliases.iter().any(|a| a.eq_ignore_ascii_case(name)) {
            return Some(name.as_str());
        }
    }
    None
}

/// Resolve a required numeric column: explicit name first, then aliases.
fn resolve_numeric<'a>(
    table: &'a RawTable,
    explicit: Option<&str>,
    aliases: &[&str],
    field: &str,
) -> Result<Option<&'a [Option<f64>]>> {
    let name = match explicit {
        Some(name) => {
            if table.column(name).is_none() {
                return Err(AtoError::Configuration(format!(
                    "mapped {} column '{}' not found in input",
                    field, name
                )));
            }
            Some(name)
        }
        None => find_alias(table, aliases),
    };
    match name {
        None => Ok(None),
        Some(name) => {
            let column = table.column(name).unwrap_or_else(|| unreachable!());
            match column.as_numeric() {
                Some(values) => Ok(Some(values)),
                None => Err(AtoError::Configuration(format!(
                    "{} column '{}' is not numeric",
                    field, name
                ))),
            }
        }
    }
}

/// Normalize a raw table onto the canonical schema.
///
/// Fails with a configuration error when neither an explicit mapping nor
/// any alias resolves the effect-size or p-value column, or when a resolved
/// column is non-numeric. Fails with a data error when a p-value falls
/// outside [0, 1]. Rows with a missing effect size or p-value are marked
/// excluded, never dropped.
pub fn normalize(table: &RawTable, map: Option<&ColumnMap>) -> Result<DeTable> {
    let default_map = ColumnMap::default();
    let map = map.unwrap_or(&default_map);
    let n = table.n_features();

    let effect_column = resolve_numeric(
        table,
        map.effect_size.as_deref(),
        EFFECT_SIZE_ALIASES,
        "effect-size",
    )?
    .ok_or_else(|| {
        AtoError::Configuration(format!(
            "no effect-size column found; recognized aliases: {}",
            EFFECT_SIZE_ALIASES.join(", ")
        ))
    })?;

    // P-values directly, or via a probability column.
    let p_direct = resolve_numeric(table, map.p_value.as_deref(), P_VALUE_ALIASES, "p-value")?;
    let p_values: Vec<Option<f64>> = match p_direct {
        Some(values) => values.to_vec(),
        None => {
            let prob = resolve_numeric(table, None, PROBABILITY_ALIASES, "probability")?
                .ok_or_else(|| {
                    let mut message = format!(
                        "no p-value column found; recognized aliases: {} (or '{}')",
                        P_VALUE_ALIASES.join(", "),
                        PROBABILITY_ALIASES.join("', '")
                    );
                    if let Some(padj) = find_alias(table, PADJ_ALIASES) {
                        message.push_str(&format!(
                            "; adjusted-p column '{}' is present but cannot substitute \
                             for raw p-values",
                            padj
                        ));
                    }
                    AtoError::Configuration(message)
                })?;
            prob.iter().map(|v| v.map(|x| 1.0 - x)).collect()
        }
    };

    for (row, p) in p_values.iter().enumerate() {
        if let Some(p) = p {
            if !(0.0..=1.0).contains(p) {
                return Err(AtoError::Data(format!(
                    "p-value {} at row {} ('{}') is outside [0, 1]",
                    p, row, table.feature_ids[row]
                )));
            }
        }
    }

    let mean_expression = resolve_numeric(
        table,
        map.mean_expression.as_deref(),
        MEAN_EXPRESSION_ALIASES,
        "mean-expression",
    )?
    .map(|v| v.iter().map(|x| x.unwrap_or(f64::NAN)).collect());

    let std_error = resolve_numeric(
        table,
        map.std_error.as_deref(),
        STD_ERROR_ALIASES,
        "standard-error",
    )?
    .map(|v| v.iter().map(|x| x.unwrap_or(f64::NAN)).collect());

    let mut effect_size = Vec::with_capacity(n);
    let mut p_value = Vec::with_capacity(n);
    let mut excluded = Vec::with_capacity(n);
    for i in 0..n {
        let e = effect_column[i];
        let p = p_values[i];
        excluded.push(e.is_none() || p.is_none());
        effect_size.push(e.unwrap_or(f64::NAN));
        p_value.push(p.unwrap_or(f64::NAN));
    }

    Ok(DeTable {
        feature_ids: table.feature_ids.clone(),
        effect_size,
        p_value,
        mean_expression,
        std_error,
        excluded,
    })
}
