//! # Storage Error Types

use thiserror::Error;

/// Errors raised by block storage.
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum StorageError {
    /// The block pool has no free slots left.
    #[error("block pool exhausted: capacity {capacity} blocks")]
    Exhausted {
        /// Pool capacity in blocks.
        capacity: usize,
    },

    /// Voxel size must be positive and finite.
    #[error("invalid voxel size: {0}")]
    InvalidVoxelSize(f32),

    /// A pool slot was claimed twice or an issued handle failed to resolve.
    #[error("block slot {index} is corrupt")]
    CorruptSlot {
        /// Slot index in the pool.
        index: usize,
    },
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;
