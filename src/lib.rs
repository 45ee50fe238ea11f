//! Adaptive Threshold Optimizer (ATO)
//!
//! This library turns a table of per-feature differential-expression
//! statistics (effect size and p-value per gene) into a data-driven
//! decision rule for calling features significant, instead of fixed
//! conventional cutoffs.
//!
//! # Overview
//!
//! The library is organized into composable modules:
//!
//! - **data**: Core data structures (RawTable, DeTable, ThresholdResult)
//! - **schema**: Input normalization (column alias resolution, validation)
//! - **pi0**: Null-proportion estimation with a deterministic fallback chain
//! - **correct**: Multiple testing correction (BH, BY, Storey, Holm,
//!   Hochberg, Bonferroni)
//! - **effect**: Data-driven effect-size cutoffs (MAD, mixture, power,
//!   percentile, consensus)
//! - **goal**: Analysis goals and their default threshold policies
//! - **optimize**: The full optimization chain and methods-text rendering
//! - **compare**: Side-by-side reruns across goals, methods, and grids
//!
//! # Example
//!
//! ```no_run
//! use adaptive_thresholds::prelude::*;
//!
//! let table = RawTable::from_csv("deseq2_results.csv").unwrap();
//! let result = optimize(&table, &OptimizeConfig::for_goal(AnalysisGoal::Discovery)).unwrap();
//!
//! println!("{}", result);
//! println!("{}", result.methods_text);
//! result.to_csv("annotated_results.csv").unwrap();
//! ```

pub mod compare;
pub mod correct;
pub mod data;
pub mod effect;
pub mod error;
pub mod goal;
pub mod optimize;
pub mod pi0;
pub mod schema;

/// Convenient re-exports for common usage.
pub mod prelude {
    pub use crate::compare::{compare_goals, compare_methods, threshold_grid, GridCell};
    pub use crate::correct::{adjust, AdjustmentMethod};
    pub use crate::data::{
        AnnotatedFeature, Column, DeTable, RawTable, ThresholdResult, ThresholdSummary,
    };
    pub use crate::effect::{
        estimate_cutoff, EffectInputs, EffectSizeConfig, EffectSizeEstimate, EffectSizeMethod,
    };
    pub use crate::error::{AtoError, Result};
    pub use crate::goal::{AnalysisGoal, GoalPolicy};
    pub use crate::optimize::{optimize, optimize_table, OptimizeConfig};
    pub use crate::pi0::{estimate_pi0, Pi0Estimate, Pi0Method, Pi0Tier};
    pub use crate::schema::{normalize, ColumnMap};
}
