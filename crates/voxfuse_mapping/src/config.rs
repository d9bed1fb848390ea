//! Mapper and integrator configuration.
//!
//! All values have documented defaults; a config file only needs to list
//! what it overrides.
//!
//! ```toml
//! voxel_size_m = 0.05
//! memory_type = "unified"
//!
//! [tsdf]
//! truncation_distance_vox = 4.0
//! max_weight = 100.0
//!
//! [tsdf.weighting]
//! mode = "inverse_square"
//! min_weight = 0.001
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use voxfuse_core::{MemoryType, DEFAULT_MAX_BLOCKS};

use crate::error::ConfigurationError;
use crate::weighting::{WeightingFunction, WeightingMode};

/// Geometry integrator parameters.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TsdfIntegratorConfig {
    /// Truncation band half-width, in voxels.
    pub truncation_distance_vox: f32,
    /// Voxels and surface measurements farther than this (metres, along the
    /// optical axis) are not integrated.
    pub max_integration_distance_m: f32,
    /// Cap on accumulated voxel weight.
    pub max_weight: f32,
    /// Per-measurement weight.
    pub weighting: WeightingFunction,
}

impl Default for TsdfIntegratorConfig {
    fn default() -> Self {
        Self {
            truncation_distance_vox: 4.0,
            max_integration_distance_m: 7.0,
            max_weight: 100.0,
            weighting: WeightingFunction::INVERSE_SQUARE,
        }
    }
}

/// Color integrator parameters.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorIntegratorConfig {
    /// Voxels farther than this (metres, along the optical axis) are not
    /// colored.
    pub max_integration_distance_m: f32,
    /// Cap on accumulated color weight.
    pub max_weight: f32,
    /// Per-measurement weight.
    pub weighting: WeightingFunction,
}

impl Default for ColorIntegratorConfig {
    fn default() -> Self {
        Self {
            max_integration_distance_m: 7.0,
            max_weight: 100.0,
            weighting: WeightingFunction::CONSTANT,
        }
    }
}

/// Session configuration for a [`crate::Mapper`].
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapperConfig {
    /// Voxel edge length in metres. Fixed for the session.
    pub voxel_size_m: f32,
    /// Residency policy for every layer.
    pub memory_type: MemoryType,
    /// Block pool capacity per layer.
    pub max_blocks: usize,
    /// Whether the mapper keeps a color layer.
    pub color_enabled: bool,
    /// Geometry integrator parameters.
    pub tsdf: TsdfIntegratorConfig,
    /// Color integrator parameters.
    pub color: ColorIntegratorConfig,
}

impl Default for MapperConfig {
    fn default() -> Self {
        Self {
            voxel_size_m: 0.05,
            memory_type: MemoryType::Host,
            max_blocks: DEFAULT_MAX_BLOCKS,
            color_enabled: true,
            tsdf: TsdfIntegratorConfig::default(),
            color: ColorIntegratorConfig::default(),
        }
    }
}

impl MapperConfig {
    /// Default config with the given voxel size and residency.
    #[must_use]
    pub fn with_voxel_size(voxel_size_m: f32, memory_type: MemoryType) -> Self {
        Self {
            voxel_size_m,
            memory_type,
            ..Self::default()
        }
    }

    /// Parses a TOML document. Missing keys take their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::Parse`] on malformed TOML, or any
    /// validation error.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigurationError> {
        let config: Self = toml::from_str(text).map_err(|e| ConfigurationError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and parses a TOML config file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::Io`] if the file cannot be read, or any
    /// error from [`MapperConfig::from_toml_str`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigurationError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| ConfigurationError::Io(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }

    /// Checks every value is in range.
    ///
    /// # Errors
    ///
    /// Returns the first invalid value found.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if !(self.voxel_size_m.is_finite() && self.voxel_size_m > 0.0) {
            return Err(ConfigurationError::InvalidVoxelSize(self.voxel_size_m));
        }
        if self.max_blocks == 0 {
            return Err(ConfigurationError::InvalidParameter {
                name: "max_blocks",
                value: 0.0,
            });
        }
        positive("tsdf.truncation_distance_vox", self.tsdf.truncation_distance_vox)?;
        positive("tsdf.max_integration_distance_m", self.tsdf.max_integration_distance_m)?;
        positive("tsdf.max_weight", self.tsdf.max_weight)?;
        weighting("tsdf.weighting.min_weight", &self.tsdf.weighting)?;
        positive("color.max_integration_distance_m", self.color.max_integration_distance_m)?;
        positive("color.max_weight", self.color.max_weight)?;
        weighting("color.weighting.min_weight", &self.color.weighting)?;
        Ok(())
    }
}

fn positive(name: &'static str, value: f32) -> Result<(), ConfigurationError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigurationError::InvalidParameter { name, value })
    }
}

fn weighting(name: &'static str, function: &WeightingFunction) -> Result<(), ConfigurationError> {
    match function.mode {
        WeightingMode::Constant | WeightingMode::InverseSquare => positive(name, function.min_weight),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert_eq!(MapperConfig::default().validate(), Ok(()));
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = MapperConfig::from_toml_str(
            r#"
            voxel_size_m = 0.1
            memory_type = "unified"

            [tsdf]
            max_weight = 20.0

            [tsdf.weighting]
            mode = "constant"
            "#,
        )
        .unwrap();

        assert_eq!(config.voxel_size_m, 0.1);
        assert_eq!(config.memory_type, MemoryType::Unified);
        assert_eq!(config.tsdf.max_weight, 20.0);
        assert_eq!(config.tsdf.truncation_distance_vox, 4.0);
        assert_eq!(config.tsdf.weighting.mode, WeightingMode::Constant);
        assert_eq!(
            config.tsdf.weighting.min_weight,
            WeightingFunction::DEFAULT_MIN_WEIGHT
        );
        assert_eq!(config.color, ColorIntegratorConfig::default());
    }

    #[test]
    fn test_rejects_non_positive_voxel_size() {
        let err = MapperConfig::from_toml_str("voxel_size_m = -1.0").unwrap_err();
        assert_eq!(err, ConfigurationError::InvalidVoxelSize(-1.0));
    }

    #[test]
    fn test_rejects_bad_parameters() {
        let mut config = MapperConfig::default();
        config.tsdf.max_weight = 0.0;
        assert!(matches!(
            config.validate(),
            Err(ConfigurationError::InvalidParameter { name: "tsdf.max_weight", .. })
        ));

        let mut config = MapperConfig::default();
        config.color.weighting.min_weight = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_malformed_toml() {
        assert!(matches!(
            MapperConfig::from_toml_str("voxel_size_m = "),
            Err(ConfigurationError::Parse(_))
        ));
    }

    #[test]
    fn test_load_missing_file() {
        assert!(matches!(
            MapperConfig::load("/nonexistent/voxfuse.toml"),
            Err(ConfigurationError::Io(_))
        ));
    }
}
