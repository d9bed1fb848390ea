//! Coordinate -> block spatial hash.
//!
//! The map is split into lock-striped shards selected by the spatial hash of
//! the block coordinate. Lookups take one shard read lock; creation takes one
//! shard write lock. There is no index-wide lock.

use std::collections::HashMap;

use parking_lot::RwLock;

use crate::block::BlockCell;
use crate::error::StorageResult;
use crate::index::Index3D;
use crate::memory::{BlockHandle, BlockPool, MemoryType};
use crate::voxels::Voxel;

/// Number of lock stripes. Power of two.
pub const SHARD_COUNT: usize = 64;

/// Concurrent map from block coordinate to block.
pub struct BlockIndex<V> {
    /// Lock-striped coordinate maps.
    shards: Box<[RwLock<HashMap<Index3D, BlockHandle>>]>,
    /// Arena owning the blocks.
    pool: BlockPool<V>,
}

impl<V: Voxel> BlockIndex<V> {
    /// Creates an empty index backed by a pool of `max_blocks` blocks.
    #[must_use]
    pub fn new(max_blocks: usize, memory_type: MemoryType) -> Self {
        let shards: Vec<_> = (0..SHARD_COUNT).map(|_| RwLock::new(HashMap::new())).collect();
        Self {
            shards: shards.into_boxed_slice(),
            pool: BlockPool::new(max_blocks, memory_type),
        }
    }

    #[inline]
    #[allow(clippy::cast_possible_truncation)]
    fn shard(&self, index: Index3D) -> &RwLock<HashMap<Index3D, BlockHandle>> {
        &self.shards[(index.spatial_hash() as usize) & (SHARD_COUNT - 1)]
    }

    /// Returns the block at `index`, creating a zeroed one if absent.
    ///
    /// Idempotent under concurrent calls: for any coordinate exactly one
    /// block is ever created, and every caller receives its handle.
    ///
    /// # Errors
    ///
    /// Returns [`crate::StorageError::Exhausted`] if a new block is needed
    /// and the pool is full.
    pub fn insert_or_get(&self, index: Index3D) -> StorageResult<BlockHandle> {
        let shard = self.shard(index);
        if let Some(handle) = shard.read().get(&index) {
            return Ok(*handle);
        }

        let mut map = shard.write();
        // Another writer may have won the race while we waited.
        if let Some(handle) = map.get(&index) {
            return Ok(*handle);
        }
        let handle = self.pool.allocate()?;
        map.insert(index, handle);
        Ok(handle)
    }

    /// Handle of the block at `index`, if allocated.
    #[inline]
    #[must_use]
    pub fn get(&self, index: Index3D) -> Option<BlockHandle> {
        self.shard(index).read().get(&index).copied()
    }

    /// True if a block exists at `index`.
    #[inline]
    #[must_use]
    pub fn contains(&self, index: Index3D) -> bool {
        self.get(index).is_some()
    }

    /// Resolves a handle to its block.
    #[inline]
    #[must_use]
    pub fn block(&self, handle: BlockHandle) -> Option<&BlockCell<V>> {
        self.pool.get(handle)
    }

    /// Snapshot of every allocated block coordinate, in no particular order.
    #[must_use]
    pub fn all_indices(&self) -> Vec<Index3D> {
        let mut indices = Vec::with_capacity(self.len());
        for shard in self.shards.iter() {
            indices.extend(shard.read().keys().copied());
        }
        indices
    }

    /// Number of allocated blocks.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.pool.len()
    }

    /// True when no block is allocated.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Maximum number of blocks.
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.pool.capacity()
    }

    /// Residency policy of the backing pool.
    #[inline]
    #[must_use]
    pub fn memory_type(&self) -> MemoryType {
        self.pool.memory_type()
    }
}
