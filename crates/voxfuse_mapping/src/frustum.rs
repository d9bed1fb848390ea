//! View frustum block selection.
//!
//! Builds the six bounding planes of a camera's view volume in the layer
//! frame and tests block bounding boxes against them. The test is
//! conservative: a block may be selected without any of its voxels
//! projecting into the image, but a block with such a voxel is never
//! missed.

use voxfuse_core::Index3D;
use voxfuse_shared::{Camera, Transform, Vec3};

/// A plane `n · p + d = 0` with unit normal pointing into the frustum.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    /// Unit normal.
    pub normal: Vec3,
    /// Offset from the origin.
    pub d: f32,
}

impl Plane {
    /// Plane through `point` with the given normal. The normal is
    /// normalized; a zero normal yields a plane that rejects nothing.
    #[must_use]
    pub fn from_normal_and_point(normal: Vec3, point: Vec3) -> Self {
        let len = normal.length();
        let normal = if len > 0.0 { normal * (1.0 / len) } else { Vec3::ZERO };
        Self {
            normal,
            d: -normal.dot(point),
        }
    }

    /// Plane through three points, oriented so `inside` has positive
    /// distance.
    #[must_use]
    pub fn through_points(a: Vec3, b: Vec3, c: Vec3, inside: Vec3) -> Self {
        let plane = Self::from_normal_and_point((b - a).cross(c - a), a);
        if plane.distance_to_point(inside) < 0.0 {
            Self {
                normal: -plane.normal,
                d: -plane.d,
            }
        } else {
            plane
        }
    }

    /// Signed distance from a point to the plane.
    #[inline]
    #[must_use]
    pub fn distance_to_point(&self, p: Vec3) -> f32 {
        self.normal.dot(p) + self.d
    }
}

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    /// Minimum corner.
    pub min: Vec3,
    /// Maximum corner.
    pub max: Vec3,
}

impl Aabb {
    /// Creates a new AABB.
    #[must_use]
    pub const fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Bounds of the block at `index`.
    #[must_use]
    pub fn for_block(index: Index3D, block_size: f32) -> Self {
        let min = index.block_origin(block_size);
        Self::new(min, min + Vec3::splat(block_size))
    }

    /// Smallest box containing every point.
    #[must_use]
    pub fn from_points(points: &[Vec3]) -> Self {
        let mut min = Vec3::splat(f32::INFINITY);
        let mut max = Vec3::splat(f32::NEG_INFINITY);
        for p in points {
            min = min.min(*p);
            max = max.max(*p);
        }
        Self::new(min, max)
    }

    /// Returns the center of the AABB.
    #[must_use]
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Returns the half-extents of the AABB.
    #[must_use]
    pub fn half_extents(&self) -> Vec3 {
        (self.max - self.min) * 0.5
    }
}

/// View volume of a posed camera between two depths, in the layer frame.
#[derive(Debug, Clone, Copy)]
pub struct Frustum {
    /// Top, right, bottom and left side planes, then near and far.
    pub planes: [Plane; 6],
    /// Bounds of the eight corners.
    pub bounds: Aabb,
}

impl Frustum {
    /// Frustum of `camera` at pose `t_l_c` between `min_depth` and
    /// `max_depth` along the optical axis.
    #[must_use]
    pub fn new(camera: &Camera, t_l_c: &Transform, min_depth: f32, max_depth: f32) -> Self {
        let corners = camera
            .view_corners(min_depth, max_depth)
            .map(|c| t_l_c.transform_point(c));
        let apex = t_l_c.translation;
        let far = [corners[4], corners[5], corners[6], corners[7]];
        let far_center = (far[0] + far[1] + far[2] + far[3]) * 0.25;
        let inside = (apex + far_center) * 0.5;

        let axis = t_l_c.transform_vector(Vec3::Z);
        let mut planes = [Plane::from_normal_and_point(Vec3::ZERO, Vec3::ZERO); 6];
        for (i, plane) in planes.iter_mut().take(4).enumerate() {
            *plane = Plane::through_points(apex, far[i], far[(i + 1) % 4], inside);
        }
        planes[4] = Plane::from_normal_and_point(axis, apex + axis * min_depth);
        planes[5] = Plane::from_normal_and_point(-axis, apex + axis * max_depth);

        Self {
            planes,
            bounds: Aabb::from_points(&corners),
        }
    }

    /// True if `aabb` is not entirely outside any plane.
    #[must_use]
    pub fn intersects(&self, aabb: &Aabb) -> bool {
        let center = aabb.center();
        let half = aabb.half_extents();
        self.planes.iter().all(|plane| {
            let r = half.x * plane.normal.x.abs()
                + half.y * plane.normal.y.abs()
                + half.z * plane.normal.z.abs();
            plane.distance_to_point(center) >= -r
        })
    }

    /// Every block of edge `block_size` intersecting the frustum.
    #[must_use]
    pub fn blocks(&self, block_size: f32) -> Vec<Index3D> {
        let lo = Index3D::from_position(self.bounds.min, block_size);
        let hi = Index3D::from_position(self.bounds.max, block_size);
        let mut blocks = Vec::new();
        for x in lo.x..=hi.x {
            for y in lo.y..=hi.y {
                for z in lo.z..=hi.z {
                    let index = Index3D::new(x, y, z);
                    if self.intersects(&Aabb::for_block(index, block_size)) {
                        blocks.push(index);
                    }
                }
            }
        }
        blocks
    }
}

/// Blocks that may receive an update from a frame seen by `camera` at
/// `t_l_c`, out to `max_depth` metres. Empty when `max_depth` is not
/// positive.
#[must_use]
pub fn candidate_blocks(
    camera: &Camera,
    t_l_c: &Transform,
    max_depth: f32,
    block_size: f32,
) -> Vec<Index3D> {
    if !(max_depth.is_finite() && max_depth > 0.0) {
        return Vec::new();
    }
    let blocks = Frustum::new(camera, t_l_c, 0.0, max_depth).blocks(block_size);
    tracing::trace!("Selected {} candidate blocks out to {:.2} m", blocks.len(), max_depth);
    blocks
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use std::collections::HashSet;
    use voxfuse_shared::{Quaternion, Vec2};

    const BLOCK: f32 = 0.4;

    fn camera() -> Camera {
        Camera::new(50.0, 50.0, 32.0, 24.0, 64, 48)
    }

    #[test]
    fn test_plane_orientation() {
        let plane = Plane::through_points(
            Vec3::ZERO,
            Vec3::X,
            Vec3::Y,
            Vec3::new(0.0, 0.0, -3.0),
        );
        assert!((plane.normal.z + 1.0).abs() < 1e-6);
        assert!(plane.distance_to_point(Vec3::new(0.0, 0.0, -1.0)) > 0.0);
        assert!(plane.distance_to_point(Vec3::new(0.0, 0.0, 1.0)) < 0.0);
    }

    #[test]
    fn test_aabb_center() {
        let aabb = Aabb::for_block(Index3D::new(1, 0, -1), 2.0);
        assert_eq!(aabb.center(), Vec3::new(3.0, 1.0, -1.0));
        assert_eq!(aabb.half_extents(), Vec3::splat(1.0));
    }

    #[test]
    fn test_frustum_selects_ahead_not_behind() {
        let blocks: HashSet<_> = candidate_blocks(&camera(), &Transform::IDENTITY, 2.0, BLOCK)
            .into_iter()
            .collect();

        assert!(blocks.contains(&Index3D::from_position(Vec3::new(0.0, 0.0, 1.0), BLOCK)));
        assert!(!blocks.contains(&Index3D::from_position(Vec3::new(0.0, 0.0, -1.0), BLOCK)));
        assert!(!blocks.contains(&Index3D::from_position(Vec3::new(5.0, 0.0, 1.0), BLOCK)));
        assert!(!blocks.contains(&Index3D::from_position(Vec3::new(0.0, 0.0, 3.5), BLOCK)));
    }

    #[test]
    fn test_empty_range_selects_nothing() {
        assert!(candidate_blocks(&camera(), &Transform::IDENTITY, 0.0, BLOCK).is_empty());
        assert!(candidate_blocks(&camera(), &Transform::IDENTITY, f32::NAN, BLOCK).is_empty());
    }

    #[test]
    fn test_every_visible_point_is_covered() {
        let cam = camera();
        let t_l_c = Transform::from_quaternion(
            Quaternion::from_axis_angle(Vec3::new(0.3, 1.0, 0.2), 0.7),
            Vec3::new(0.5, -1.2, 2.0),
        );
        let blocks: HashSet<_> = candidate_blocks(&cam, &t_l_c, 3.0, BLOCK).into_iter().collect();

        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..2000 {
            let uv = Vec2::new(rng.gen_range(0.0..64.0), rng.gen_range(0.0..48.0));
            let depth = rng.gen_range(0.05..3.0);
            let p_l = t_l_c.transform_point(cam.unproject(uv, depth));
            assert!(
                blocks.contains(&Index3D::from_position(p_l, BLOCK)),
                "point {p_l:?} not covered"
            );
        }
    }
}
