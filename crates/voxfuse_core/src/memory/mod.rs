//! # Memory Management
//!
//! Block allocation for voxel layers.
//!
//! ## Design Philosophy
//!
//! Blocks are allocated on demand, never moved and never freed while the
//! owning layer lives:
//! - Stable handles instead of pointers
//! - Growth without relocation
//! - Residency chosen once, at pool construction

mod pool;
mod residency;

pub use pool::{BlockHandle, BlockPool, SEGMENT_BLOCKS};
pub use residency::MemoryType;
