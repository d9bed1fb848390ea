//! Voxel layers.
//!
//! A layer is one modality's complete sparse map: a spatial index over
//! blocks of one voxel type, with a voxel size fixed at construction.

use voxfuse_shared::Vec3;

use crate::block::BlockCell;
use crate::error::{StorageError, StorageResult};
use crate::index::{voxel_center, Index3D, VOXELS_PER_SIDE};
use crate::memory::{BlockHandle, MemoryType};
use crate::spatial_index::BlockIndex;
use crate::voxels::{ColorVoxel, TsdfVoxel, Voxel};

/// Default pool capacity, in blocks.
pub const DEFAULT_MAX_BLOCKS: usize = 1 << 20;

/// Sparse block-structured voxel map for one voxel type.
pub struct BlockLayer<V> {
    voxel_size: f32,
    block_size: f32,
    blocks: BlockIndex<V>,
}

/// Geometry layer.
pub type TsdfLayer = BlockLayer<TsdfVoxel>;

/// Color layer.
pub type ColorLayer = BlockLayer<ColorVoxel>;

impl<V: Voxel> BlockLayer<V> {
    /// Creates an empty layer.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::InvalidVoxelSize`] unless `voxel_size` is
    /// positive and finite.
    pub fn new(voxel_size: f32, memory_type: MemoryType, max_blocks: usize) -> StorageResult<Self> {
        if !(voxel_size.is_finite() && voxel_size > 0.0) {
            return Err(StorageError::InvalidVoxelSize(voxel_size));
        }
        #[allow(clippy::cast_precision_loss)]
        let block_size = voxel_size * VOXELS_PER_SIDE as f32;
        Ok(Self {
            voxel_size,
            block_size,
            blocks: BlockIndex::new(max_blocks, memory_type),
        })
    }

    /// Edge length of a voxel in metres.
    #[inline]
    #[must_use]
    pub const fn voxel_size(&self) -> f32 {
        self.voxel_size
    }

    /// Edge length of a block in metres.
    #[inline]
    #[must_use]
    pub const fn block_size(&self) -> f32 {
        self.block_size
    }

    /// Residency policy of this layer's blocks.
    #[inline]
    #[must_use]
    pub fn memory_type(&self) -> MemoryType {
        self.blocks.memory_type()
    }

    /// Number of allocated blocks.
    #[inline]
    #[must_use]
    pub fn num_allocated_blocks(&self) -> usize {
        self.blocks.len()
    }

    /// Maximum number of blocks this layer can hold.
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.blocks.capacity()
    }

    /// Snapshot of all allocated block coordinates.
    #[must_use]
    pub fn all_block_indices(&self) -> Vec<Index3D> {
        self.blocks.all_indices()
    }

    /// True if a block is allocated at `index`.
    #[inline]
    #[must_use]
    pub fn is_block_allocated(&self, index: Index3D) -> bool {
        self.blocks.contains(index)
    }

    /// Returns the block at `index`, allocating it if needed.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Exhausted`] when the block is missing and the
    /// pool is full, or [`StorageError::CorruptSlot`] if the index holds a
    /// handle the pool cannot resolve.
    pub fn allocate_block(&self, index: Index3D) -> StorageResult<&BlockCell<V>> {
        let handle = self.blocks.insert_or_get(index)?;
        self.blocks.block(handle).ok_or(StorageError::CorruptSlot {
            index: handle.index(),
        })
    }

    /// Allocates every listed block.
    ///
    /// # Errors
    ///
    /// Stops at the first exhaustion error; earlier blocks stay allocated.
    pub fn allocate_blocks(&self, indices: &[Index3D]) -> StorageResult<()> {
        for index in indices {
            self.blocks.insert_or_get(*index)?;
        }
        Ok(())
    }

    /// Block at `index`, if allocated.
    #[inline]
    #[must_use]
    pub fn block_at(&self, index: Index3D) -> Option<&BlockCell<V>> {
        self.blocks.get(index).and_then(|h| self.blocks.block(h))
    }

    /// Handle of the block at `index`, if allocated.
    #[inline]
    #[must_use]
    pub fn block_handle(&self, index: Index3D) -> Option<BlockHandle> {
        self.blocks.get(index)
    }

    /// Block coordinate containing a metric position.
    #[inline]
    #[must_use]
    pub fn block_index_at(&self, position: Vec3) -> Index3D {
        Index3D::from_position(position, self.block_size)
    }

    /// Metric center of a voxel.
    #[inline]
    #[must_use]
    pub fn voxel_center(&self, block: Index3D, voxel: Index3D) -> Vec3 {
        voxel_center(block, voxel, self.voxel_size)
    }

    /// Copy of the voxel containing `position`, if its block is allocated.
    #[must_use]
    pub fn voxel_at(&self, position: Vec3) -> Option<V> {
        let (block, voxel) = Index3D::block_and_voxel_from_position(position, self.voxel_size);
        self.block_at(block).map(|cell| *cell.read().voxel(voxel))
    }

    /// Calls `f(block_index, voxel_index, voxel)` for every voxel of every
    /// allocated block.
    pub fn for_each_voxel(&self, mut f: impl FnMut(Index3D, Index3D, &V)) {
        for block_index in self.all_block_indices() {
            if let Some(cell) = self.block_at(block_index) {
                let block = cell.read();
                for (voxel_index, voxel) in block.iter() {
                    f(block_index, voxel_index, voxel);
                }
            }
        }
    }

    /// Number of voxels with nonzero weight across the layer.
    #[must_use]
    pub fn num_observed_voxels(&self) -> usize {
        self.all_block_indices()
            .into_iter()
            .filter_map(|index| self.block_at(index))
            .map(|cell| cell.read().observed_count())
            .sum()
    }
}
