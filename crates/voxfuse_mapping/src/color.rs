//! Projective color integration.
//!
//! Colors are fused only into voxels near an already-observed surface: the
//! geometry voxel at the same location must have positive weight and lie
//! inside the truncation band.

use rayon::prelude::*;
use voxfuse_core::{voxel_center, ColorLayer, ColorVoxel, Index3D, TsdfLayer};
use voxfuse_shared::{Camera, Color, ColorImage, Transform, Vec3};

use crate::config::ColorIntegratorConfig;
use crate::error::{MappingError, MappingResult};
use crate::frustum::{Aabb, Frustum};
use crate::gate::SampleGate;
use crate::stats::IntegrationStats;
use crate::validate::{check_camera, check_image, check_pose};

/// Fuses one color observation into a voxel as a weighted running average.
#[inline]
pub fn fuse_color(voxel: &mut ColorVoxel, color: Color, weight: f32, max_weight: f32) {
    let new_weight = voxel.weight + weight;
    let old = voxel.color.to_f32();
    let observed = color.to_f32();
    voxel.color = Color::from_f32(std::array::from_fn(|i| {
        (old[i] * voxel.weight + observed[i] * weight) / new_weight
    }));
    voxel.weight = new_weight.min(max_weight);
}

/// Integrates color frames into a [`ColorLayer`], guided by a [`TsdfLayer`].
#[derive(Debug, Clone, Copy)]
pub struct ProjectiveColorIntegrator {
    config: ColorIntegratorConfig,
    truncation_distance_vox: f32,
}

struct Frame<'a, G> {
    image: &'a ColorImage,
    camera: &'a Camera,
    t_c_l: Transform,
    gate: &'a G,
    voxel_size: f32,
    truncation_m: f32,
}

impl ProjectiveColorIntegrator {
    /// Creates an integrator that colors voxels within
    /// `truncation_distance_vox` voxels of the surface.
    #[must_use]
    pub const fn new(config: ColorIntegratorConfig, truncation_distance_vox: f32) -> Self {
        Self {
            config,
            truncation_distance_vox,
        }
    }

    /// Integrator parameters.
    #[must_use]
    pub const fn config(&self) -> &ColorIntegratorConfig {
        &self.config
    }

    /// Integrates one color frame.
    ///
    /// Candidate blocks are the geometry blocks intersecting the view
    /// frustum; a color block is allocated for each of them.
    ///
    /// # Errors
    ///
    /// Input errors are raised before either layer is touched.
    /// [`MappingError::ResourceExhausted`] may be raised after some blocks
    /// were already updated.
    pub fn integrate<G: SampleGate>(
        &self,
        image: &ColorImage,
        t_l_c: &Transform,
        camera: &Camera,
        gate: &G,
        tsdf_layer: &TsdfLayer,
        color_layer: &ColorLayer,
    ) -> MappingResult<IntegrationStats> {
        check_camera("color", camera)?;
        check_pose("T_L_C", t_l_c)?;
        check_image("color", image, camera)?;

        let voxel_size = color_layer.voxel_size();
        let frame = Frame {
            image,
            camera,
            t_c_l: t_l_c.inverse(),
            gate,
            voxel_size,
            truncation_m: self.truncation_distance_vox * voxel_size,
        };

        let frustum = Frustum::new(camera, t_l_c, 0.0, self.config.max_integration_distance_m);
        let block_size = tsdf_layer.block_size();
        let candidates: Vec<Index3D> = tsdf_layer
            .all_block_indices()
            .into_iter()
            .filter(|index| frustum.intersects(&Aabb::for_block(*index, block_size)))
            .collect();
        tracing::trace!("Selected {} observed blocks for coloring", candidates.len());

        let blocks_before = color_layer.num_allocated_blocks();
        let voxels_updated = candidates
            .par_iter()
            .map(|&block| self.integrate_block(block, &frame, tsdf_layer, color_layer))
            .try_reduce(|| 0, |a, b| Ok(a + b))
            .map_err(|err| {
                if let MappingError::ResourceExhausted(e) = &err {
                    tracing::warn!("Color integration stopped: {}", e);
                }
                err
            })?;

        let stats = IntegrationStats {
            candidate_blocks: candidates.len(),
            blocks_allocated: color_layer.num_allocated_blocks() - blocks_before,
            voxels_updated,
        };
        tracing::debug!("Integrated color frame: {}", stats);
        Ok(stats)
    }

    fn integrate_block<G: SampleGate>(
        &self,
        block_index: Index3D,
        frame: &Frame<'_, G>,
        tsdf_layer: &TsdfLayer,
        color_layer: &ColorLayer,
    ) -> MappingResult<usize> {
        let Some(tsdf_cell) = tsdf_layer.block_at(block_index) else {
            return Ok(0);
        };
        let color_cell = color_layer.allocate_block(block_index)?;

        let tsdf_block = tsdf_cell.read();
        let mut color_block = color_cell.write();
        let mut updated = 0;
        for (offset, (geometry, voxel)) in tsdf_block
            .voxels()
            .iter()
            .zip(color_block.voxels_mut())
            .enumerate()
        {
            if geometry.weight <= 0.0 || geometry.distance.abs() > frame.truncation_m {
                continue;
            }
            let p_l = voxel_center(block_index, Index3D::from_linear(offset), frame.voxel_size);
            if let Some((color, weight)) = self.measure(frame.t_c_l.transform_point(p_l), frame) {
                fuse_color(voxel, color, weight, self.config.max_weight);
                updated += 1;
            }
        }
        Ok(updated)
    }

    fn measure<G: SampleGate>(&self, p_c: Vec3, frame: &Frame<'_, G>) -> Option<(Color, f32)> {
        let voxel_depth = p_c.z;
        if voxel_depth > self.config.max_integration_distance_m {
            return None;
        }
        let uv = frame.camera.project(p_c)?;
        let (row, col) = frame.camera.pixel_index(uv);
        let color = frame.image.get(row, col)?;
        if !frame.gate.admits(p_c) {
            return None;
        }
        Some((color, self.config.weighting.weight(voxel_depth)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TsdfIntegratorConfig;
    use crate::gate::{MaskGate, Ungated};
    use crate::tsdf::ProjectiveTsdfIntegrator;
    use voxfuse_core::MemoryType;
    use voxfuse_shared::{DepthImage, MonoImage};

    fn camera() -> Camera {
        Camera::new(50.0, 50.0, 32.0, 24.0, 64, 48)
    }

    fn layers() -> (TsdfLayer, ColorLayer) {
        (
            TsdfLayer::new(0.05, MemoryType::Host, 4096).unwrap(),
            ColorLayer::new(0.05, MemoryType::Host, 4096).unwrap(),
        )
    }

    fn observe_plane(tsdf: &TsdfLayer) {
        let depth = DepthImage::filled(48, 64, 1.0);
        ProjectiveTsdfIntegrator::new(TsdfIntegratorConfig::default())
            .integrate(&depth, &Transform::IDENTITY, &camera(), &Ungated, tsdf)
            .unwrap();
    }

    fn integrator() -> ProjectiveColorIntegrator {
        ProjectiveColorIntegrator::new(ColorIntegratorConfig::default(), 4.0)
    }

    #[test]
    fn test_fuse_color_average() {
        let mut voxel = ColorVoxel::default();
        fuse_color(&mut voxel, Color::new(100, 0, 255), 1.0, 100.0);
        assert_eq!(voxel.color, Color::new(100, 0, 255));

        fuse_color(&mut voxel, Color::new(201, 0, 0), 1.0, 100.0);
        assert_eq!(voxel.color, Color::new(151, 0, 128));
        assert_eq!(voxel.weight, 2.0);

        fuse_color(&mut voxel, Color::WHITE, 5.0, 3.0);
        assert_eq!(voxel.weight, 3.0);
    }

    #[test]
    fn test_colors_only_near_surface() {
        let (tsdf, color) = layers();
        observe_plane(&tsdf);
        let image = ColorImage::filled(48, 64, Color::new(10, 20, 30));

        // Narrower band than the geometry's 4 voxels.
        let stats = ProjectiveColorIntegrator::new(ColorIntegratorConfig::default(), 2.0)
            .integrate(&image, &Transform::IDENTITY, &camera(), &Ungated, &tsdf, &color)
            .unwrap();

        assert!(stats.voxels_updated > 0);
        assert_eq!(color.num_allocated_blocks(), tsdf.num_allocated_blocks());

        let surface = color.voxel_at(Vec3::new(0.01, 0.01, 0.98)).unwrap();
        assert_eq!(surface.color, Color::new(10, 20, 30));
        assert_eq!(surface.weight, 1.0);
        // Free space 0.2 m in front of the surface is outside the band.
        let free = color.voxel_at(Vec3::new(0.01, 0.01, 0.41)).unwrap();
        assert_eq!(free.weight, 0.0);
    }

    #[test]
    fn test_without_geometry_nothing_happens() {
        let (tsdf, color) = layers();
        let image = ColorImage::filled(48, 64, Color::WHITE);
        let stats = integrator()
            .integrate(&image, &Transform::IDENTITY, &camera(), &Ungated, &tsdf, &color)
            .unwrap();
        assert_eq!(stats, IntegrationStats::default());
        assert_eq!(color.num_allocated_blocks(), 0);
    }

    #[test]
    fn test_masked_color_keeps_zero_weight() {
        let (tsdf, color) = layers();
        observe_plane(&tsdf);
        let cam = camera();
        let image = ColorImage::filled(48, 64, Color::WHITE);
        let mask = MonoImage::filled(48, 64, 255);
        let gate = MaskGate::aligned(&mask, &cam).unwrap();

        let stats = integrator()
            .integrate(&image, &Transform::IDENTITY, &cam, &gate, &tsdf, &color)
            .unwrap();

        assert_eq!(stats.voxels_updated, 0);
        assert_eq!(color.num_observed_voxels(), 0);
    }
}
