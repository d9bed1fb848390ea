//! Synthetic scene shared by the integration tests.

#![allow(dead_code)]

use voxfuse_core::{ColorLayer, ColorVoxel, Index3D, MemoryType, TsdfLayer, TsdfVoxel};
use voxfuse_mapping::Mapper;
use voxfuse_shared::{Camera, Color, ColorImage, DepthImage, MonoImage, Quaternion, Transform, Vec3};

pub const ROWS: usize = 48;
pub const COLS: usize = 64;
pub const VOXEL_SIZE: f32 = 0.05;

/// Foreground "person" occupying the middle of the frame.
pub const PERSON_ROWS: std::ops::Range<usize> = 16..32;
pub const PERSON_COLS: std::ops::Range<usize> = 24..40;
pub const PERSON_DEPTH: f32 = 1.0;
pub const BACKGROUND_DEPTH: f32 = 2.0;

pub fn depth_camera() -> Camera {
    Camera::new(50.0, 50.0, 32.0, 24.0, 64, 48)
}

/// Same resolution and principal point as the depth camera with half the
/// focal length.
pub fn wide_mask_camera() -> Camera {
    Camera::new(25.0, 25.0, 32.0, 24.0, 64, 48)
}

/// Places the wide mask camera 0.1 m behind the depth camera. Every point
/// the depth camera sees then projects inside the mask image.
pub fn t_cm_cd() -> Transform {
    Transform::from_translation(Vec3::new(0.0, 0.0, 0.1))
}

pub fn pose() -> Transform {
    Transform::from_quaternion(
        Quaternion::from_axis_angle(Vec3::new(0.1, 1.0, 0.0), 0.2),
        Vec3::new(0.3, -0.1, 0.5),
    )
}

#[allow(clippy::cast_precision_loss)]
pub fn slanted_plane() -> DepthImage {
    DepthImage::from_fn(ROWS, COLS, |r, c| 1.5 + 0.01 * c as f32 + 0.005 * r as f32)
}

pub fn person_scene() -> DepthImage {
    DepthImage::from_fn(ROWS, COLS, |r, c| {
        if PERSON_ROWS.contains(&r) && PERSON_COLS.contains(&c) {
            PERSON_DEPTH
        } else {
            BACKGROUND_DEPTH
        }
    })
}

pub fn person_mask() -> MonoImage {
    MonoImage::from_fn(ROWS, COLS, |r, c| {
        u8::from(PERSON_ROWS.contains(&r) && PERSON_COLS.contains(&c))
    })
}

#[allow(clippy::cast_possible_truncation)]
pub fn gradient() -> ColorImage {
    ColorImage::from_fn(ROWS, COLS, |r, c| Color::new((c * 4) as u8, (r * 5) as u8, 200))
}

pub fn unmasked() -> MonoImage {
    MonoImage::new(ROWS, COLS)
}

pub fn fully_masked() -> MonoImage {
    MonoImage::filled(ROWS, COLS, 1)
}

pub fn mapper() -> Mapper {
    Mapper::with_voxel_size(VOXEL_SIZE, MemoryType::Host).unwrap()
}

/// Every voxel of every block, sorted by coordinate.
pub fn tsdf_snapshot(layer: &TsdfLayer) -> Vec<(Index3D, Index3D, TsdfVoxel)> {
    let mut voxels = Vec::new();
    layer.for_each_voxel(|block, voxel, v| voxels.push((block, voxel, *v)));
    voxels.sort_by_key(|(block, voxel, _)| (*block, *voxel));
    voxels
}

pub fn color_snapshot(layer: &ColorLayer) -> Vec<(Index3D, Index3D, ColorVoxel)> {
    let mut voxels = Vec::new();
    layer.for_each_voxel(|block, voxel, v| voxels.push((block, voxel, *v)));
    voxels.sort_by_key(|(block, voxel, _)| (*block, *voxel));
    voxels
}

pub fn assert_same_tsdf(a: &TsdfLayer, b: &TsdfLayer) {
    let (a, b) = (tsdf_snapshot(a), tsdf_snapshot(b));
    assert_eq!(a.len(), b.len(), "block sets differ");
    for ((block_a, voxel_a, va), (block_b, voxel_b, vb)) in a.iter().zip(&b) {
        assert_eq!((block_a, voxel_a), (block_b, voxel_b));
        assert!(
            (va.distance - vb.distance).abs() <= 1e-6 && (va.weight - vb.weight).abs() <= 1e-6,
            "voxel {voxel_a:?} in block {block_a:?}: {va:?} != {vb:?}"
        );
    }
}

pub fn assert_same_color(a: &ColorLayer, b: &ColorLayer) {
    let (a, b) = (color_snapshot(a), color_snapshot(b));
    assert_eq!(a.len(), b.len(), "block sets differ");
    for ((block_a, voxel_a, va), (block_b, voxel_b, vb)) in a.iter().zip(&b) {
        assert_eq!((block_a, voxel_a), (block_b, voxel_b));
        assert_eq!(va.color, vb.color, "voxel {voxel_a:?} in block {block_a:?}");
        assert!((va.weight - vb.weight).abs() <= 1e-6);
    }
}
