//! # Memory Residency
//!
//! Where block memory lives is a policy handed to the pool at construction.
//! Layers and blocks never inspect it, so every storage invariant holds
//! identically under each policy.

use serde::{Deserialize, Serialize};

/// Residency policy for block allocations.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemoryType {
    /// Host memory only.
    #[default]
    Host,
    /// Accelerator-resident memory.
    Device,
    /// Memory shared between host and accelerator.
    Unified,
}

impl MemoryType {
    /// True when the host can touch blocks directly.
    #[inline]
    #[must_use]
    pub const fn is_host_accessible(self) -> bool {
        matches!(self, Self::Host | Self::Unified)
    }

    /// Human readable name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Host => "host",
            Self::Device => "device",
            Self::Unified => "unified",
        }
    }
}

impl std::fmt::Display for MemoryType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_host_accessibility() {
        assert!(MemoryType::Host.is_host_accessible());
        assert!(MemoryType::Unified.is_host_accessible());
        assert!(!MemoryType::Device.is_host_accessible());
    }

    #[test]
    fn test_display() {
        assert_eq!(MemoryType::Unified.to_string(), "unified");
    }
}
