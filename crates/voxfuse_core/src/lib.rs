//! # VOXFUSE Core
//!
//! Block-sparse voxel storage for real-time 3D reconstruction.
//!
//! ## Architecture Rules
//!
//! 1. **Blocks are created lazily** - nothing is allocated until written
//! 2. **Handles, not pointers** - blocks live in an append-only pool
//! 3. **No index-wide lock** - the spatial hash is lock-striped
//!
//! ## Example
//!
//! ```rust,ignore
//! use voxfuse_core::{Index3D, MemoryType, TsdfLayer};
//!
//! let layer = TsdfLayer::new(0.05, MemoryType::Host, 1 << 16)?;
//! let block = layer.allocate_block(Index3D::new(0, 0, 0))?;
//! block.write().voxel_mut(Index3D::new(1, 2, 3)).weight = 1.0;
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod block;
pub mod error;
pub mod index;
pub mod layer;
pub mod memory;
pub mod spatial_index;
pub mod voxels;

pub use block::{BlockCell, VoxelBlock};
pub use error::{StorageError, StorageResult};
pub use index::{voxel_center, Index3D, VOXELS_PER_BLOCK, VOXELS_PER_SIDE};
pub use layer::{BlockLayer, ColorLayer, TsdfLayer, DEFAULT_MAX_BLOCKS};
pub use memory::{BlockHandle, BlockPool, MemoryType};
pub use spatial_index::BlockIndex;
pub use voxels::{ColorVoxel, TsdfVoxel, Voxel};
