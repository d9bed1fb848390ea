//! The mapping session.
//!
//! A [`Mapper`] owns one layer per enabled modality and routes frames to the
//! matching integrator. Every call validates its inputs before touching the
//! map.

use voxfuse_core::{ColorLayer, MemoryType, TsdfLayer};
use voxfuse_shared::{Camera, ColorImage, DepthImage, MonoImage, Transform};

use crate::color::ProjectiveColorIntegrator;
use crate::config::MapperConfig;
use crate::error::{ConfigurationError, MappingResult};
use crate::gate::{MaskGate, Ungated};
use crate::stats::IntegrationStats;
use crate::tsdf::ProjectiveTsdfIntegrator;

/// Fuses depth and color frames into block-sparse voxel layers.
///
/// Integration takes `&mut self`, so calls on one mapper never overlap;
/// the work inside a call runs on the rayon thread pool.
pub struct Mapper {
    config: MapperConfig,
    tsdf_layer: TsdfLayer,
    color_layer: Option<ColorLayer>,
    tsdf_integrator: ProjectiveTsdfIntegrator,
    color_integrator: ProjectiveColorIntegrator,
}

impl Mapper {
    /// Creates an empty map.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError`] if the config does not validate.
    pub fn new(config: MapperConfig) -> MappingResult<Self> {
        config.validate()?;
        let tsdf_layer = TsdfLayer::new(config.voxel_size_m, config.memory_type, config.max_blocks)?;
        let color_layer = if config.color_enabled {
            Some(ColorLayer::new(config.voxel_size_m, config.memory_type, config.max_blocks)?)
        } else {
            None
        };
        tracing::debug!(
            "Created mapper: voxel size {} m, {} memory, color {}",
            config.voxel_size_m,
            config.memory_type,
            if config.color_enabled { "on" } else { "off" }
        );
        Ok(Self {
            tsdf_layer,
            color_layer,
            tsdf_integrator: ProjectiveTsdfIntegrator::new(config.tsdf),
            color_integrator: ProjectiveColorIntegrator::new(config.color, config.tsdf.truncation_distance_vox),
            config,
        })
    }

    /// Creates a mapper with default integrator settings.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::InvalidVoxelSize`] unless `voxel_size_m`
    /// is positive and finite.
    pub fn with_voxel_size(voxel_size_m: f32, memory_type: MemoryType) -> MappingResult<Self> {
        Self::new(MapperConfig::with_voxel_size(voxel_size_m, memory_type))
    }

    /// Session configuration.
    #[must_use]
    pub const fn config(&self) -> &MapperConfig {
        &self.config
    }

    /// Voxel edge length in metres.
    #[must_use]
    pub const fn voxel_size(&self) -> f32 {
        self.config.voxel_size_m
    }

    /// Residency policy of every layer.
    #[must_use]
    pub const fn memory_type(&self) -> MemoryType {
        self.config.memory_type
    }

    /// Geometry layer.
    #[must_use]
    pub const fn tsdf_layer(&self) -> &TsdfLayer {
        &self.tsdf_layer
    }

    /// Color layer, if enabled.
    #[must_use]
    pub const fn color_layer(&self) -> Option<&ColorLayer> {
        self.color_layer.as_ref()
    }

    /// Integrates a depth frame. `t_l_c` maps camera-frame points into the
    /// map frame.
    ///
    /// # Errors
    ///
    /// See [`ProjectiveTsdfIntegrator::integrate`].
    pub fn integrate_depth(
        &mut self,
        depth: &DepthImage,
        t_l_c: &Transform,
        camera: &Camera,
    ) -> MappingResult<IntegrationStats> {
        self.tsdf_integrator
            .integrate(depth, t_l_c, camera, &Ungated, &self.tsdf_layer)
    }

    /// Integrates a depth frame, skipping pixels where `mask` is nonzero.
    /// The mask is aligned to the depth image.
    ///
    /// # Errors
    ///
    /// Additionally rejects a mask whose resolution differs from the depth
    /// image.
    pub fn integrate_depth_masked(
        &mut self,
        depth: &DepthImage,
        mask: &MonoImage,
        t_l_c: &Transform,
        camera: &Camera,
    ) -> MappingResult<IntegrationStats> {
        let gate = MaskGate::aligned(mask, camera)?;
        self.tsdf_integrator
            .integrate(depth, t_l_c, camera, &gate, &self.tsdf_layer)
    }

    /// Integrates a depth frame masked by an image from a second camera.
    /// `t_cm_cd` maps depth-camera points into the mask camera frame.
    ///
    /// # Errors
    ///
    /// Additionally rejects a mask that does not match `mask_camera`, a
    /// degenerate mask camera, or a non-finite `t_cm_cd`.
    pub fn integrate_depth_with_mask_camera(
        &mut self,
        depth: &DepthImage,
        mask: &MonoImage,
        t_l_c: &Transform,
        t_cm_cd: &Transform,
        depth_camera: &Camera,
        mask_camera: &Camera,
    ) -> MappingResult<IntegrationStats> {
        let gate = MaskGate::new(mask, mask_camera, *t_cm_cd)?;
        self.tsdf_integrator
            .integrate(depth, t_l_c, depth_camera, &gate, &self.tsdf_layer)
    }

    /// Integrates a color frame into voxels near observed geometry.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::ModalityDisabled`] when the color layer
    /// is disabled; see also [`ProjectiveColorIntegrator::integrate`].
    pub fn integrate_color(
        &mut self,
        color: &ColorImage,
        t_l_c: &Transform,
        camera: &Camera,
    ) -> MappingResult<IntegrationStats> {
        let color_layer = self.color_layer.as_ref().ok_or(ConfigurationError::ModalityDisabled("color"))?;
        self.color_integrator
            .integrate(color, t_l_c, camera, &Ungated, &self.tsdf_layer, color_layer)
    }

    /// Integrates a color frame, skipping pixels where the aligned `mask` is
    /// nonzero.
    ///
    /// # Errors
    ///
    /// See [`Mapper::integrate_color`].
    pub fn integrate_color_masked(
        &mut self,
        color: &ColorImage,
        mask: &MonoImage,
        t_l_c: &Transform,
        camera: &Camera,
    ) -> MappingResult<IntegrationStats> {
        let color_layer = self.color_layer.as_ref().ok_or(ConfigurationError::ModalityDisabled("color"))?;
        let gate = MaskGate::aligned(mask, camera)?;
        self.color_integrator
            .integrate(color, t_l_c, camera, &gate, &self.tsdf_layer, color_layer)
    }

    /// Integrates a color frame masked by an image from a second camera.
    /// `t_cm_cc` maps color-camera points into the mask camera frame.
    ///
    /// # Errors
    ///
    /// See [`Mapper::integrate_color`] and
    /// [`Mapper::integrate_depth_with_mask_camera`].
    pub fn integrate_color_with_mask_camera(
        &mut self,
        color: &ColorImage,
        mask: &MonoImage,
        t_l_c: &Transform,
        t_cm_cc: &Transform,
        color_camera: &Camera,
        mask_camera: &Camera,
    ) -> MappingResult<IntegrationStats> {
        let color_layer = self.color_layer.as_ref().ok_or(ConfigurationError::ModalityDisabled("color"))?;
        let gate = MaskGate::new(mask, mask_camera, *t_cm_cc)?;
        self.color_integrator
            .integrate(color, t_l_c, color_camera, &gate, &self.tsdf_layer, color_layer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MappingError;

    #[test]
    fn test_construction() {
        let mapper = Mapper::with_voxel_size(0.1, MemoryType::Unified).unwrap();
        assert_eq!(mapper.voxel_size(), 0.1);
        assert_eq!(mapper.memory_type(), MemoryType::Unified);
        assert_eq!(mapper.tsdf_layer().memory_type(), MemoryType::Unified);
        assert!(mapper.color_layer().is_some());
        assert_eq!(mapper.tsdf_layer().num_allocated_blocks(), 0);
    }

    #[test]
    fn test_rejects_bad_voxel_size() {
        for size in [0.0, -0.05, f32::NAN] {
            assert!(matches!(
                Mapper::with_voxel_size(size, MemoryType::Host),
                Err(MappingError::Configuration(ConfigurationError::InvalidVoxelSize(_)))
            ));
        }
    }

    #[test]
    fn test_color_disabled() {
        let mut mapper = Mapper::new(MapperConfig {
            color_enabled: false,
            ..MapperConfig::default()
        })
        .unwrap();
        assert!(mapper.color_layer().is_none());

        let camera = Camera::new(50.0, 50.0, 32.0, 24.0, 64, 48);
        let image = ColorImage::new(48, 64);
        assert_eq!(
            mapper
                .integrate_color(&image, &Transform::IDENTITY, &camera)
                .unwrap_err(),
            MappingError::Configuration(ConfigurationError::ModalityDisabled("color"))
        );
    }
}
