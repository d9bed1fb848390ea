//! Integer grid coordinates for blocks and voxels.

use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};
use voxfuse_shared::Vec3;

/// Voxels along each edge of a block.
pub const VOXELS_PER_SIDE: usize = 8;

/// Total voxels per block.
pub const VOXELS_PER_BLOCK: usize = VOXELS_PER_SIDE * VOXELS_PER_SIDE * VOXELS_PER_SIDE;

/// Integer 3D coordinate. Used both for block coordinates (the spatial hash
/// key) and for voxel coordinates within a block.
#[repr(C)]
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Pod, Zeroable, Serialize, Deserialize,
)]
pub struct Index3D {
    /// X coordinate.
    pub x: i32,
    /// Y coordinate.
    pub y: i32,
    /// Z coordinate.
    pub z: i32,
}

impl Index3D {
    /// Creates a new coordinate.
    #[inline]
    #[must_use]
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Block containing a metric position, for blocks of edge `block_size`.
    ///
    /// Uses floor division so `-0.01` lands in block `-1`.
    #[inline]
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn from_position(p: Vec3, block_size: f32) -> Self {
        let inv = 1.0 / block_size;
        Self::new(
            (p.x * inv).floor() as i32,
            (p.y * inv).floor() as i32,
            (p.z * inv).floor() as i32,
        )
    }

    /// Metric position of the block's minimum corner.
    #[inline]
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn block_origin(self, block_size: f32) -> Vec3 {
        Vec3::new(
            self.x as f32 * block_size,
            self.y as f32 * block_size,
            self.z as f32 * block_size,
        )
    }

    /// Returns `(block, voxel)` coordinates of the voxel containing `p`.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
    pub fn block_and_voxel_from_position(p: Vec3, voxel_size: f32) -> (Self, Self) {
        let inv = 1.0 / voxel_size;
        let global = Self::new(
            (p.x * inv).floor() as i32,
            (p.y * inv).floor() as i32,
            (p.z * inv).floor() as i32,
        );
        let side = VOXELS_PER_SIDE as i32;
        (
            Self::new(
                global.x.div_euclid(side),
                global.y.div_euclid(side),
                global.z.div_euclid(side),
            ),
            Self::new(
                global.x.rem_euclid(side),
                global.y.rem_euclid(side),
                global.z.rem_euclid(side),
            ),
        )
    }

    /// Linear offset of a voxel coordinate inside a block (`[x][y][z]` order).
    ///
    /// Callers guarantee each component is in `0..VOXELS_PER_SIDE`.
    #[inline]
    #[must_use]
    #[allow(clippy::cast_sign_loss)]
    pub const fn linear(self) -> usize {
        (self.x as usize * VOXELS_PER_SIDE + self.y as usize) * VOXELS_PER_SIDE + self.z as usize
    }

    /// Inverse of [`Index3D::linear`].
    #[inline]
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
    pub const fn from_linear(offset: usize) -> Self {
        let z = offset % VOXELS_PER_SIDE;
        let y = (offset / VOXELS_PER_SIDE) % VOXELS_PER_SIDE;
        let x = offset / (VOXELS_PER_SIDE * VOXELS_PER_SIDE);
        Self::new(x as i32, y as i32, z as i32)
    }

    /// Spatial hash (Teschner et al. primes), used to pick an index shard.
    #[inline]
    #[must_use]
    #[allow(clippy::cast_sign_loss)]
    pub const fn spatial_hash(self) -> u64 {
        let h = (self.x.wrapping_mul(73_856_093))
            ^ (self.y.wrapping_mul(19_349_663))
            ^ (self.z.wrapping_mul(83_492_791));
        h as u32 as u64
    }
}

/// Metric center of voxel `voxel` in block `block`.
#[inline]
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn voxel_center(block: Index3D, voxel: Index3D, voxel_size: f32) -> Vec3 {
    let block_size = voxel_size * VOXELS_PER_SIDE as f32;
    block.block_origin(block_size)
        + Vec3::new(
            (voxel.x as f32 + 0.5) * voxel_size,
            (voxel.y as f32 + 0.5) * voxel_size,
            (voxel.z as f32 + 0.5) * voxel_size,
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_position_floors_negative() {
        assert_eq!(Index3D::from_position(Vec3::new(0.0, 0.0, 0.0), 0.4), Index3D::new(0, 0, 0));
        assert_eq!(Index3D::from_position(Vec3::new(0.39, 0.41, 0.8), 0.4), Index3D::new(0, 1, 2));
        assert_eq!(Index3D::from_position(Vec3::new(-0.01, -0.4, -0.41), 0.4), Index3D::new(-1, -1, -2));
    }

    #[test]
    fn test_linear_round_trip() {
        for offset in 0..VOXELS_PER_BLOCK {
            assert_eq!(Index3D::from_linear(offset).linear(), offset);
        }
        assert_eq!(Index3D::new(1, 0, 0).linear(), 64);
        assert_eq!(Index3D::new(0, 0, 7).linear(), 7);
    }

    #[test]
    fn test_block_and_voxel_from_position() {
        let voxel_size = 0.5;
        // Global voxel (-1, 8, 3)
        let (block, voxel) =
            Index3D::block_and_voxel_from_position(Vec3::new(-0.25, 4.1, 1.6), voxel_size);
        assert_eq!(block, Index3D::new(-1, 1, 0));
        assert_eq!(voxel, Index3D::new(7, 0, 3));
    }

    #[test]
    fn test_voxel_center_is_inside_voxel() {
        let voxel_size = 0.5;
        let block = Index3D::new(-1, 1, 0);
        let voxel = Index3D::new(7, 0, 3);
        let center = voxel_center(block, voxel, voxel_size);
        assert_eq!(center, Vec3::new(-0.25, 4.25, 1.75));
        assert_eq!(Index3D::block_and_voxel_from_position(center, voxel_size), (block, voxel));
    }
}
