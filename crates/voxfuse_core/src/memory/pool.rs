//! # Block Pool
//!
//! Append-only arena of voxel blocks addressed by stable handles.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::OnceLock;

use parking_lot::RwLock;

use super::residency::MemoryType;
use crate::block::{BlockCell, VoxelBlock};
use crate::error::{StorageError, StorageResult};
use crate::voxels::Voxel;

/// Blocks per segment. Segments are allocated whole, on first use.
pub const SEGMENT_BLOCKS: usize = 256;

type Segment<V> = Box<[OnceLock<BlockCell<V>>]>;

/// A concurrent arena of blocks.
///
/// Storage is a fixed table of segments. A segment is a boxed slice of
/// write-once slots that is created on first use and never moved, so a
/// handle resolves to the same block for the pool's whole lifetime and
/// growth never relocates existing blocks.
///
/// # Thread Safety
///
/// `allocate` and `get` may be called from any number of threads. A slot is
/// published only after its block is fully constructed, so readers never see
/// a partial block.
///
/// # Example
///
/// ```rust,ignore
/// let pool: BlockPool<TsdfVoxel> = BlockPool::new(1 << 16, MemoryType::Host);
///
/// let handle = pool.allocate()?;
/// pool.get(handle).unwrap().write().voxel_mut(idx).weight = 1.0;
/// ```
pub struct BlockPool<V> {
    /// Segment table; `capacity / SEGMENT_BLOCKS` entries, rounded up.
    segments: Box<[OnceLock<Segment<V>>]>,
    /// Number of slots handed out.
    allocated: AtomicUsize,
    /// Total capacity in blocks.
    capacity: usize,
    /// Residency policy for every allocation.
    memory_type: MemoryType,
}

/// Handle to a block in a pool.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockHandle {
    /// Slot index in the pool.
    index: u32,
}

impl BlockHandle {
    /// Slot index in the pool.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self.index as usize
    }
}

impl<V: Voxel> BlockPool<V> {
    /// Creates a pool holding at most `capacity` blocks.
    ///
    /// Only the segment table is allocated upfront; block memory is
    /// allocated one segment at a time.
    #[must_use]
    pub fn new(capacity: usize, memory_type: MemoryType) -> Self {
        let capacity = capacity.min(u32::MAX as usize);
        let segment_count = capacity.div_ceil(SEGMENT_BLOCKS);
        let segments: Vec<OnceLock<Segment<V>>> = (0..segment_count).map(|_| OnceLock::new()).collect();

        Self {
            segments: segments.into_boxed_slice(),
            allocated: AtomicUsize::new(0),
            capacity,
            memory_type,
        }
    }

    /// Returns the total capacity in blocks.
    #[inline]
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the number of allocated blocks.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.allocated.load(Ordering::Acquire)
    }

    /// True when no block has been allocated.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Residency policy of this pool.
    #[inline]
    #[must_use]
    pub const fn memory_type(&self) -> MemoryType {
        self.memory_type
    }

    /// Allocates a zero-initialized block.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Exhausted`] when the pool is full. A failed
    /// allocation consumes nothing. Returns [`StorageError::CorruptSlot`] if
    /// the claimed slot already holds a block.
    pub fn allocate(&self) -> StorageResult<BlockHandle> {
        let index = self
            .allocated
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| {
                (n < self.capacity).then_some(n + 1)
            })
            .map_err(|_| StorageError::Exhausted {
                capacity: self.capacity,
            })?;

        let segment = self.segments[index / SEGMENT_BLOCKS].get_or_init(|| {
            tracing::trace!(
                "Allocating block segment {} ({} memory)",
                index / SEGMENT_BLOCKS,
                self.memory_type
            );
            (0..SEGMENT_BLOCKS).map(|_| OnceLock::new()).collect()
        });

        // Each index is handed out exactly once, so the slot is empty.
        if segment[index % SEGMENT_BLOCKS]
            .set(RwLock::new(VoxelBlock::zeroed()))
            .is_err()
        {
            tracing::warn!("Block slot {} was already occupied", index);
            return Err(StorageError::CorruptSlot { index });
        }

        // `capacity` is clamped to u32::MAX in `new`.
        #[allow(clippy::cast_possible_truncation)]
        let index = index as u32;
        Ok(BlockHandle { index })
    }

    /// Resolves a handle to its block.
    ///
    /// Returns `None` for handles that were not issued by this pool.
    #[inline]
    #[must_use]
    pub fn get(&self, handle: BlockHandle) -> Option<&BlockCell<V>> {
        let index = handle.index();
        self.segments
            .get(index / SEGMENT_BLOCKS)?
            .get()?
            .get(index % SEGMENT_BLOCKS)?
            .get()
    }
}
