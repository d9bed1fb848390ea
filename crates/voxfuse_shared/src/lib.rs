//! # VOXFUSE Shared
//!
//! Geometry primitives used by both the voxel storage and the integrators.
//!
//! ## CRITICAL RULE
//!
//! This crate must NEVER depend on:
//! - `voxfuse_core` or `voxfuse_mapping`
//! - Any threading or allocation-policy crate
//!
//! Everything here is plain data plus pure functions.

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]

pub mod camera;
pub mod image;
pub mod math;

pub use camera::{Camera, IntrinsicsDefect};
pub use image::{Color, ColorImage, DepthImage, Image, MonoImage};
pub use math::{Mat3, Quaternion, Transform, Vec2, Vec3};
