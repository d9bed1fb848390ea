//! Per-modality voxel types.
//!
//! Every voxel type is [`Zeroable`]: a freshly allocated block is all-zero,
//! which for every modality means "never observed" (weight 0).

use bytemuck::{Pod, Zeroable};
use voxfuse_shared::Color;

/// Marker for types that can be stored in a block.
pub trait Voxel: Zeroable + Copy + Send + Sync + 'static {
    /// Accumulated observation weight. Zero means "never observed".
    fn weight(&self) -> f32;
}

/// Truncated signed distance voxel.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct TsdfVoxel {
    /// Signed distance to the nearest observed surface, in metres. Undefined
    /// while `weight == 0`.
    pub distance: f32,
    /// Accumulated fusion weight (>= 0).
    pub weight: f32,
}

impl Voxel for TsdfVoxel {
    #[inline]
    fn weight(&self) -> f32 {
        self.weight
    }
}

impl TsdfVoxel {
    /// True once at least one measurement has been fused.
    #[inline]
    #[must_use]
    pub fn is_observed(&self) -> bool {
        self.weight > 0.0
    }
}

/// Color voxel. Its weight is independent of the geometry weight.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Zeroable)]
pub struct ColorVoxel {
    /// Running weighted-average color.
    pub color: Color,
    /// Accumulated color weight (>= 0).
    pub weight: f32,
}

impl Voxel for ColorVoxel {
    #[inline]
    fn weight(&self) -> f32 {
        self.weight
    }
}
