//! Core data structures: input tables and optimization results.

pub mod result;
pub mod table;

pub use result::{AnnotatedFeature, ThresholdResult, ThresholdSummary};
pub use table::{Column, DeTable, RawTable};
