//! Per-measurement fusion weights.

use serde::{Deserialize, Serialize};

/// Shape of the weight curve over voxel depth.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeightingMode {
    /// Every measurement weighs 1.
    Constant,
    /// Weight falls off as `1 / depth²`, matching the growth of depth noise.
    #[default]
    InverseSquare,
}

/// Weight assigned to a single measurement.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeightingFunction {
    /// Curve shape.
    pub mode: WeightingMode,
    /// Lower bound on any returned weight. Must be positive.
    pub min_weight: f32,
}

impl WeightingFunction {
    /// Default floor.
    pub const DEFAULT_MIN_WEIGHT: f32 = 1e-3;

    /// Constant unit weight.
    pub const CONSTANT: Self = Self {
        mode: WeightingMode::Constant,
        min_weight: Self::DEFAULT_MIN_WEIGHT,
    };

    /// Inverse-square falloff with the default floor.
    pub const INVERSE_SQUARE: Self = Self {
        mode: WeightingMode::InverseSquare,
        min_weight: Self::DEFAULT_MIN_WEIGHT,
    };

    /// Weight of a measurement for a voxel at `voxel_depth` metres.
    #[inline]
    #[must_use]
    pub fn weight(&self, voxel_depth: f32) -> f32 {
        let raw = match self.mode {
            WeightingMode::Constant => 1.0,
            WeightingMode::InverseSquare => 1.0 / (voxel_depth * voxel_depth),
        };
        if raw.is_finite() {
            raw.max(self.min_weight)
        } else {
            self.min_weight
        }
    }
}

impl Default for WeightingFunction {
    fn default() -> Self {
        Self::INVERSE_SQUARE
    }
}
