//! Projective TSDF integration.
//!
//! Every voxel of every candidate block is projected into the depth image.
//! The signed distance along the optical axis between the observed surface
//! and the voxel center is truncated and fused into the voxel as a weighted
//! running average.
//!
//! Blocks are allocated only once a voxel inside them produces an update, so
//! a frame that is entirely masked or invalid leaves the layer unchanged.

use rayon::prelude::*;
use voxfuse_core::{voxel_center, Index3D, TsdfLayer, TsdfVoxel, VOXELS_PER_BLOCK};
use voxfuse_shared::{Camera, DepthImage, Transform, Vec3};

use crate::config::TsdfIntegratorConfig;
use crate::error::{MappingError, MappingResult};
use crate::frustum::candidate_blocks;
use crate::gate::SampleGate;
use crate::stats::IntegrationStats;
use crate::validate::{check_camera, check_image, check_pose};

/// Fuses one truncated distance measurement into a voxel.
///
/// `distance` must already be truncated. The weight is capped at
/// `max_weight` after averaging.
#[inline]
pub fn fuse_tsdf(voxel: &mut TsdfVoxel, distance: f32, weight: f32, max_weight: f32) {
    let new_weight = voxel.weight + weight;
    voxel.distance = (voxel.distance * voxel.weight + distance * weight) / new_weight;
    voxel.weight = new_weight.min(max_weight);
}

/// Integrates depth frames into a [`TsdfLayer`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ProjectiveTsdfIntegrator {
    config: TsdfIntegratorConfig,
}

/// Per-frame inputs shared by every worker.
struct Frame<'a, G> {
    depth: &'a DepthImage,
    camera: &'a Camera,
    t_c_l: Transform,
    gate: &'a G,
    voxel_size: f32,
    truncation_m: f32,
}

impl ProjectiveTsdfIntegrator {
    /// Creates an integrator.
    #[must_use]
    pub const fn new(config: TsdfIntegratorConfig) -> Self {
        Self { config }
    }

    /// Integrator parameters.
    #[must_use]
    pub const fn config(&self) -> &TsdfIntegratorConfig {
        &self.config
    }

    /// Truncation distance in metres for a layer of the given voxel size.
    #[inline]
    #[must_use]
    pub fn truncation_distance_m(&self, voxel_size: f32) -> f32 {
        self.config.truncation_distance_vox * voxel_size
    }

    /// Integrates one depth frame.
    ///
    /// `depth` must match `camera`'s resolution; `t_l_c` maps camera-frame
    /// points into the layer frame. Samples rejected by `gate` are skipped.
    ///
    /// # Errors
    ///
    /// Input errors are raised before the layer is touched.
    /// [`MappingError::ResourceExhausted`] may be raised after some blocks
    /// were already updated.
    pub fn integrate<G: SampleGate>(
        &self,
        depth: &DepthImage,
        t_l_c: &Transform,
        camera: &Camera,
        gate: &G,
        layer: &TsdfLayer,
    ) -> MappingResult<IntegrationStats> {
        check_camera("depth", camera)?;
        check_pose("T_L_C", t_l_c)?;
        check_image("depth", depth, camera)?;

        let frame = Frame {
            depth,
            camera,
            t_c_l: t_l_c.inverse(),
            gate,
            voxel_size: layer.voxel_size(),
            truncation_m: self.truncation_distance_m(layer.voxel_size()),
        };

        // Nothing beyond the farthest valid measurement can be updated.
        let max_depth = depth
            .max_valid_depth()
            .map_or(0.0, |d| d.min(self.config.max_integration_distance_m) + frame.truncation_m);
        let candidates = candidate_blocks(camera, t_l_c, max_depth, layer.block_size());

        let blocks_before = layer.num_allocated_blocks();
        let voxels_updated = candidates
            .par_iter()
            .map(|&block| self.integrate_block(block, &frame, layer))
            .try_reduce(|| 0, |a, b| Ok(a + b))
            .map_err(|err| {
                if let MappingError::ResourceExhausted(e) = &err {
                    tracing::warn!("TSDF integration stopped: {}", e);
                }
                err
            })?;

        let stats = IntegrationStats {
            candidate_blocks: candidates.len(),
            blocks_allocated: layer.num_allocated_blocks() - blocks_before,
            voxels_updated,
        };
        tracing::debug!("Integrated depth frame: {}", stats);
        Ok(stats)
    }

    fn integrate_block<G: SampleGate>(
        &self,
        block_index: Index3D,
        frame: &Frame<'_, G>,
        layer: &TsdfLayer,
    ) -> MappingResult<usize> {
        let mut updates = [None; VOXELS_PER_BLOCK];
        let mut any = false;
        for (offset, update) in updates.iter_mut().enumerate() {
            let p_l = voxel_center(block_index, Index3D::from_linear(offset), frame.voxel_size);
            *update = self.measure(frame.t_c_l.transform_point(p_l), frame);
            any |= update.is_some();
        }
        if !any {
            return Ok(0);
        }

        let mut block = layer.allocate_block(block_index)?.write();
        let mut updated = 0;
        for (voxel, update) in block.voxels_mut().iter_mut().zip(&updates) {
            if let Some((distance, weight)) = *update {
                fuse_tsdf(voxel, distance, weight, self.config.max_weight);
                updated += 1;
            }
        }
        Ok(updated)
    }

    /// Truncated distance and weight for a voxel at camera-frame `p_c`, or
    /// `None` if the voxel is not observed by this frame.
    fn measure<G: SampleGate>(&self, p_c: Vec3, frame: &Frame<'_, G>) -> Option<(f32, f32)> {
        let max_distance = self.config.max_integration_distance_m;
        let voxel_depth = p_c.z;
        if voxel_depth > max_distance {
            return None;
        }
        let uv = frame.camera.project(p_c)?;
        let (row, col) = frame.camera.pixel_index(uv);
        let surface_depth = frame.depth.get(row, col)?;
        if !(surface_depth.is_finite() && surface_depth > 0.0 && surface_depth <= max_distance) {
            return None;
        }
        if !frame.gate.admits(p_c) {
            return None;
        }
        let sdf = surface_depth - voxel_depth;
        if sdf < -frame.truncation_m {
            return None;
        }
        Some((sdf.min(frame.truncation_m), self.config.weighting.weight(voxel_depth)))
    }
}
