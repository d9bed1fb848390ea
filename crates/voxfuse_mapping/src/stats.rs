//! Per-call integration counters.

use std::fmt;

/// What one integration call did to the map.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct IntegrationStats {
    /// Blocks selected by the view frustum.
    pub candidate_blocks: usize,
    /// Blocks newly allocated in the target layer.
    pub blocks_allocated: usize,
    /// Voxels that received a measurement.
    pub voxels_updated: usize,
}

impl IntegrationStats {
    /// True if the call left every voxel untouched.
    #[must_use]
    pub const fn is_noop(&self) -> bool {
        self.blocks_allocated == 0 && self.voxels_updated == 0
    }
}

impl fmt::Display for IntegrationStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} candidates, {} allocated, {} voxels updated",
            self.candidate_blocks, self.blocks_allocated, self.voxels_updated
        )
    }
}
