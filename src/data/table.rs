//! Tabular input for differential expression results.
//!
//! A [`RawTable`] holds the columns exactly as an upstream DE tool emitted
//! them (heterogeneous names, possible missing cells). The input normalizer
//! in [`crate::schema`] resolves it into a canonical [`DeTable`] that the
//! estimators consume.

use crate::error::{AtoError, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// A single named column of an input table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Column {
    /// Numeric column; `None` marks a missing cell (NA/NaN/empty).
    Numeric(Vec<Option<f64>>),
    /// Non-numeric column, kept verbatim.
    Text(Vec<String>),
}

impl Column {
    /// Number of rows in the column.
    pub fn len(&self) -> usize {
        match self {
            Column::Numeric(v) => v.len(),
            Column::Text(v) => v.len(),
        }
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Borrow the numeric values, or `None` if this is a text column.
    pub fn as_numeric(&self) -> Option<&[Option<f64>]> {
        match self {
            Column::Numeric(v) => Some(v),
            Column::Text(_) => None,
        }
    }
}

/// Raw differential expression table as produced by an upstream tool.
///
/// Column names are whatever the tool used (`log2FoldChange`, `logFC`, ...);
/// resolution onto the canonical schema happens in [`crate::schema`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawTable {
    /// Feature identifiers, one per row.
    pub feature_ids: Vec<String>,
    /// Named columns, in input order.
    pub columns: Vec<(String, Column)>,
}

fn is_missing_token(s: &str) -> bool {
    let t = s.trim();
    t.is_empty() || t.eq_ignore_ascii_case("na") || t.eq_ignore_ascii_case("nan") || t.eq_ignore_ascii_case("null")
}

impl RawTable {
    /// Create a table from feature IDs and named columns.
    ///
    /// All columns must have the same length as `feature_ids`.
    pub fn new(feature_ids: Vec<String>, columns: Vec<(String, Column)>) -> Result<Self> {
        let n = feature_ids.len();
        for (name, col) in &columns {
            if col.len() != n {
                return Err(AtoError::Data(format!(
                    "column '{}' has {} rows, expected {}",
                    name,
                    col.len(),
                    n
                )));
            }
        }
        Ok(Self {
            feature_ids,
            columns,
        })
    }

    /// Number of rows (features).
    pub fn n_features(&self) -> usize {
        self.feature_ids.len()
    }

    /// Look up a column by exact name.
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, c)| c)
    }

    /// All column names in input order.
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|(n, _)| n.as_str()).collect()
    }

    /// Load from a comma-delimited file with a header row.
    pub fn from_csv<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_delimited(path, ',')
    }

    /// Load from a tab-delimited file with a header row.
    pub fn from_tsv<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_delimited(path, '\t')
    }

    /// Load from a delimited file.
    ///
    /// The first header field names the feature-ID column; remaining fields
    /// name data columns. A column becomes [`Column::Numeric`] when every
    /// non-missing cell parses as a float, otherwise [`Column::Text`].
    pub fn from_delimited<P: AsRef<Path>>(path: P, delimiter: char) -> Result<Self> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        let mut lines = reader.lines();

        let header_line = lines
            .next()
            .ok_or_else(|| AtoError::Data("empty input file".to_string()))??;
        let header: Vec<&str> = header_line.split(delimiter).collect();
        if header.len() < 2 {
            return Err(AtoError::Data(
                "input must have a feature-ID column and at least one data column".to_string(),
            ));
        }
        let names: Vec<String> = header[1..].iter().map(|s| s.trim().to_string()).collect();
        let n_cols = names.len();

        let mut feature_ids: Vec<String> = Vec::new();
        let mut cells: Vec<Vec<String>> = vec![Vec::new(); n_cols];

        for line_result in lines {
            let line = line_result?;
            if line.trim().is_empty() {
                continue;
            }
            let fields: Vec<&str> = line.split(delimiter).collect();
            feature_ids.push(fields[0].trim().to_string());
            for col in 0..n_cols {
                let value = fields.get(col + 1).map(|s| s.trim()).unwrap_or("");
                cells[col].push(value.to_string());
            }
        }

        if feature_ids.is_empty() {
            return Err(AtoError::Data("no data rows in input file".to_string()));
        }

        let mut columns = Vec::with_capacity(n_cols);
        for (name, raw) in names.into_iter().zip(cells) {
            let numeric = raw
                .iter()
                .all(|v| is_missing_token(v) || v.parse::<f64>().is_ok());
            let column = if numeric {
                Column::Numeric(
                    raw.iter()
                        .map(|v| {
                            if is_missing_token(v) {
                                None
                            } else {
                                v.parse::<f64>().ok().filter(|x| x.is_finite())
                            }
                        })
                        .collect(),
                )
            } else {
                Column::Text(raw)
            };
            columns.push((name, column));
        }

        Self::new(feature_ids, columns)
    }
}

/// Canonical, validated DE table consumed by the estimators.
///
/// Rows with a missing effect size or p-value are flagged `excluded`; they
/// take no part in estimation but are retained for output annotation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeTable {
    /// Feature identifiers, one per row.
    pub feature_ids: Vec<String>,
    /// Signed effect size (e.g. log2 fold-change); NaN where missing.
    pub effect_size: Vec<f64>,
    /// Raw p-value in [0, 1]; NaN where missing.
    pub p_value: Vec<f64>,
    /// Mean expression per feature, when the input carried it.
    pub mean_expression: Option<Vec<f64>>,
    /// Standard error of the effect size, when the input carried it.
    pub std_error: Option<Vec<f64>>,
    /// Rows excluded from estimation (missing effect size or p-value).
    pub excluded: Vec<bool>,
}

impl DeTable {
    /// Total number of rows, excluded ones included.
    pub fn n_features(&self) -> usize {
        self.feature_ids.len()
    }

    /// Number of rows participating in estimation.
    pub fn m(&self) -> usize {
        self.excluded.iter().filter(|&&e| !e).count()
    }

    /// Indices of non-excluded rows, in original order.
    pub fn included_indices(&self) -> Vec<usize> {
        (0..self.n_features())
            .filter(|&i| !self.excluded[i])
            .collect()
    }

    /// P-values of non-excluded rows, in original order.
    pub fn included_p_values(&self) -> Vec<f64> {
        self.included_indices()
            .iter()
            .map(|&i| self.p_value[i])
            .collect()
    }

    /// Effect sizes of non-excluded rows, in original order.
    pub fn included_effect_sizes(&self) -> Vec<f64> {
        self.included_indices()
            .iter()
            .map(|&i| self.effect_size[i])
            .collect()
    }

    /// Standard errors of non-excluded rows, if the column is present.
    pub fn included_std_errors(&self) -> Option<Vec<f64>> {
        let se = self.std_error.as_ref()?;
        Some(
            self.included_indices()
                .iter()
                .map(|&i| se[i])
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_from_csv_numeric_and_text() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "gene,log2FoldChange,pvalue,biotype").unwrap();
        writeln!(file, "g1,1.5,0.001,coding").unwrap();
        writeln!(file, "g2,-0.2,NA,lncRNA").unwrap();
        writeln!(file, "g3,0.0,0.9,coding").unwrap();
        file.flush().unwrap();

        let table = RawTable::from_csv(file.path()).unwrap();
        assert_eq!(table.n_features(), 3);
        assert_eq!(table.feature_ids, vec!["g1", "g2", "g3"]);

        let lfc = table.column("log2FoldChange").unwrap().as_numeric().unwrap();
        assert_eq!(lfc[0], Some(1.5));

        let pval = table.column("pvalue").unwrap().as_numeric().unwrap();
        assert_eq!(pval[1], None);

        assert!(table.column("biotype").unwrap().as_numeric().is_none());
    }

    #[test]
    fn test_from_csv_empty_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "gene,pvalue").unwrap();
        file.flush().unwrap();

        let err = RawTable::from_csv(file.path()).unwrap_err();
        assert!(err.to_string().contains("no data rows"));
    }

    #[test]
    fn test_column_length_mismatch() {
        let err = RawTable::new(
            vec!["g1".into(), "g2".into()],
            vec![("p".into(), Column::Numeric(vec![Some(0.1)]))],
        )
        .unwrap_err();
        assert!(err.to_string().contains("expected 2"));
    }

    #[test]
    fn test_de_table_inclusion() {
        let table = DeTable {
            feature_ids: vec!["a".into(), "b".into(), "c".into()],
            effect_size: vec![1.0, f64::NAN, -2.0],
            p_value: vec![0.01, 0.5, 0.2],
            mean_expression: None,
            std_error: None,
            excluded: vec![false, true, false],
        };
        assert_eq!(table.n_features(), 3);
        assert_eq!(table.m(), 2);
        assert_eq!(table.included_indices(), vec![0, 2]);
        assert_eq!(table.included_p_values(), vec![0.01, 0.2]);
    }
}
