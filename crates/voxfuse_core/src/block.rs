//! Fixed-size voxel blocks.

use crate::index::{Index3D, VOXELS_PER_BLOCK};
use crate::voxels::Voxel;

/// A cube of `VOXELS_PER_SIDE`³ voxels, stored `[x][y][z]`.
///
/// Blocks are zero-initialized and never resized.
#[derive(Clone, Debug)]
pub struct VoxelBlock<V> {
    voxels: Box<[V]>,
}

/// A block behind its own lock. Atomicity of map updates is per block.
pub type BlockCell<V> = parking_lot::RwLock<VoxelBlock<V>>;

impl<V: Voxel> VoxelBlock<V> {
    /// Creates an all-zero block.
    #[must_use]
    pub fn zeroed() -> Self {
        Self {
            voxels: vec![V::zeroed(); VOXELS_PER_BLOCK].into_boxed_slice(),
        }
    }

    /// Voxel at an in-block coordinate.
    #[inline]
    #[must_use]
    pub fn voxel(&self, index: Index3D) -> &V {
        &self.voxels[index.linear()]
    }

    /// Mutable voxel at an in-block coordinate.
    #[inline]
    pub fn voxel_mut(&mut self, index: Index3D) -> &mut V {
        &mut self.voxels[index.linear()]
    }

    /// Voxels in linear (`[x][y][z]`) order.
    #[inline]
    #[must_use]
    pub fn voxels(&self) -> &[V] {
        &self.voxels
    }

    /// Mutable voxels in linear order.
    #[inline]
    pub fn voxels_mut(&mut self) -> &mut [V] {
        &mut self.voxels
    }

    /// Iterates `(voxel_index, voxel)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (Index3D, &V)> {
        self.voxels
            .iter()
            .enumerate()
            .map(|(offset, v)| (Index3D::from_linear(offset), v))
    }

    /// Number of voxels with nonzero weight.
    #[must_use]
    pub fn observed_count(&self) -> usize {
        self.voxels.iter().filter(|v| v.weight() > 0.0).count()
    }
}
