//! # VOXFUSE Mapping
//!
//! Projective integration of depth and color frames into block-sparse
//! voxel layers, with optional per-pixel masking.
//!
//! ## Architecture Rules
//!
//! 1. **Validate first** - every input check runs before the map is touched
//! 2. **Allocate on write** - a block exists only once a voxel in it is fused
//! 3. **Masked means invisible** - a masked sample never changes a voxel
//!
//! ## Example
//!
//! ```rust,ignore
//! use voxfuse_mapping::{Mapper, MapperConfig};
//!
//! let mut mapper = Mapper::new(MapperConfig::load("voxfuse.toml")?)?;
//! let stats = mapper.integrate_depth_masked(&depth, &mask, &t_l_c, &camera)?;
//! mapper.integrate_color_masked(&color, &mask, &t_l_c, &camera)?;
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod color;
pub mod config;
pub mod error;
pub mod frustum;
pub mod gate;
pub mod mapper;
pub mod stats;
pub mod tsdf;
mod validate;
pub mod weighting;

pub use color::{fuse_color, ProjectiveColorIntegrator};
pub use config::{ColorIntegratorConfig, MapperConfig, TsdfIntegratorConfig};
pub use error::{ConfigurationError, InputValidityError, MappingError, MappingResult};
pub use frustum::{candidate_blocks, Aabb, Frustum, Plane};
pub use gate::{AuxiliaryView, MaskGate, SampleGate, Ungated};
pub use mapper::Mapper;
pub use stats::IntegrationStats;
pub use tsdf::{fuse_tsdf, ProjectiveTsdfIntegrator};
pub use weighting::{WeightingFunction, WeightingMode};
