//! Analysis goals and their default threshold policies.

use crate::correct::AdjustmentMethod;
use crate::error::{AtoError, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// What the analysis is optimizing for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AnalysisGoal {
    /// Cast a wide net: lenient FDR control, relaxed effect-size cutoff.
    Discovery,
    /// Conventional trade-off between sensitivity and specificity.
    Balanced,
    /// Strict family-wise control for confirmatory work.
    Validation,
}

impl AnalysisGoal {
    /// All goals, from most to least permissive.
    pub const ALL: [AnalysisGoal; 3] = [
        AnalysisGoal::Discovery,
        AnalysisGoal::Balanced,
        AnalysisGoal::Validation,
    ];

    /// Descriptive name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Discovery => "discovery",
            Self::Balanced => "balanced",
            Self::Validation => "validation",
        }
    }
}

impl FromStr for AnalysisGoal {
    type Err = AtoError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "discovery" => Ok(Self::Discovery),
            "balanced" => Ok(Self::Balanced),
            "validation" => Ok(Self::Validation),
            other => Err(AtoError::Configuration(format!(
                "unknown analysis goal '{}'",
                other
            ))),
        }
    }
}

impl std::fmt::Display for AnalysisGoal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Concrete policy resolved from a goal: which adjustment to run, the level
/// to control at, and how to scale the data-driven effect-size cutoff.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GoalPolicy {
    /// P-value adjustment procedure.
    pub adjustment: AdjustmentMethod,
    /// Decision threshold on adjusted p-values.
    pub target_level: f64,
    /// Multiplier applied to the resolved effect-size cutoff.
    pub scale_factor: f64,
}

impl GoalPolicy {
    /// Default policy for a goal.
    pub fn for_goal(goal: AnalysisGoal) -> Self {
        match goal {
            AnalysisGoal::Discovery => Self {
                adjustment: AdjustmentMethod::BenjaminiHochberg,
                target_level: 0.10,
                scale_factor: 0.7,
            },
            AnalysisGoal::Balanced => Self {
                adjustment: AdjustmentMethod::BenjaminiHochberg,
                target_level: 0.05,
                scale_factor: 1.0,
            },
            AnalysisGoal::Validation => Self {
                adjustment: AdjustmentMethod::Holm,
                target_level: 0.01,
                scale_factor: 1.3,
            },
        }
    }

    /// Resolve a goal with per-field overrides.
    ///
    /// The goal supplies defaults only for fields the caller left
    /// unspecified. An overridden target level outside (0, 1) is rejected.
    pub fn resolve(
        goal: AnalysisGoal,
        adjustment: Option<AdjustmentMethod>,
        target_level: Option<f64>,
        scale_factor: Option<f64>,
    ) -> Result<Self> {
        let defaults = Self::for_goal(goal);
        if let Some(level) = target_level {
            if !(level > 0.0 && level < 1.0) {
                return Err(AtoError::Configuration(format!(
                    "target level must be in (0, 1), got {}",
                    level
                )));
            }
        }
        if let Some(scale) = scale_factor {
            if !(scale.is_finite() && scale > 0.0) {
                return Err(AtoError::Configuration(format!(
                    "effect-size scale factor must be positive, got {}",
                    scale
                )));
            }
        }
        Ok(Self {
            adjustment: adjustment.unwrap_or(defaults.adjustment),
            target_level: target_level.unwrap_or(defaults.target_level),
            scale_factor: scale_factor.unwrap_or(defaults.scale_factor),
        })
    }
}
