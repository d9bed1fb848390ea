//! Mathematical types shared by the storage and integration crates.
//!
//! Frames follow the `T_A_B` naming convention: `T_A_B` maps points expressed
//! in frame `B` into frame `A`. `T_L_C` is therefore camera-to-layer.

use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};

/// Point or direction in a metric frame.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable, Serialize, Deserialize)]
pub struct Vec3 {
    /// Right in camera frames.
    pub x: f32,
    /// Down in camera frames.
    pub y: f32,
    /// Along the optical axis in camera frames.
    pub z: f32,
}

impl Vec3 {
    /// Origin.
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);
    /// Unit x axis.
    pub const X: Self = Self::new(1.0, 0.0, 0.0);
    /// Unit y axis.
    pub const Y: Self = Self::new(0.0, 1.0, 0.0);
    /// Unit z axis, the optical axis of a camera frame.
    pub const Z: Self = Self::new(0.0, 0.0, 1.0);

    /// Vector from its three components.
    #[must_use]
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Same value on every axis. Used for voxel and block extents.
    #[must_use]
    pub const fn splat(value: f32) -> Self {
        Self::new(value, value, value)
    }

    /// Inner product.
    #[must_use]
    pub fn dot(self, other: Self) -> f32 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    /// Right-handed cross product.
    #[must_use]
    pub fn cross(self, other: Self) -> Self {
        Self::new(
            self.y * other.z - self.z * other.y,
            self.z * other.x - self.x * other.z,
            self.x * other.y - self.y * other.x,
        )
    }

    /// Euclidean norm.
    #[must_use]
    pub fn length(self) -> f32 {
        self.dot(self).sqrt()
    }

    /// Euclidean distance between two points.
    #[must_use]
    pub fn distance(self, other: Self) -> f32 {
        (self - other).length()
    }

    /// Per-axis minimum, for growing bounding boxes.
    #[must_use]
    pub fn min(self, other: Self) -> Self {
        Self::new(self.x.min(other.x), self.y.min(other.y), self.z.min(other.z))
    }

    /// Per-axis maximum, for growing bounding boxes.
    #[must_use]
    pub fn max(self, other: Self) -> Self {
        Self::new(self.x.max(other.x), self.y.max(other.y), self.z.max(other.z))
    }

    /// False if any axis holds NaN or infinity.
    #[must_use]
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

impl std::ops::Add for Vec3 {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl std::ops::Sub for Vec3 {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl std::ops::Mul<f32> for Vec3 {
    type Output = Self;
    fn mul(self, rhs: f32) -> Self {
        Self::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

impl std::ops::Neg for Vec3 {
    type Output = Self;
    fn neg(self) -> Self {
        Self::new(-self.x, -self.y, -self.z)
    }
}

/// Continuous image coordinate in pixels. `x` runs along columns and `y`
/// along rows; pixel `(row, col)` covers `[col, col + 1) x [row, row + 1)`.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable, Serialize, Deserialize)]
pub struct Vec2 {
    /// Column coordinate.
    pub x: f32,
    /// Row coordinate.
    pub y: f32,
}

impl Vec2 {
    /// Coordinate from column and row.
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Quaternion for rotations
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable, Serialize, Deserialize)]
pub struct Quaternion {
    /// X component
    pub x: f32,
    /// Y component
    pub y: f32,
    /// Z component
    pub z: f32,
    /// W component
    pub w: f32,
}

impl Quaternion {
    /// Creates a new quaternion
    #[must_use]
    pub const fn new(x: f32, y: f32, z: f32, w: f32) -> Self {
        Self { x, y, z, w }
    }

    /// Identity rotation
    pub const IDENTITY: Self = Self::new(0.0, 0.0, 0.0, 1.0);

    /// Rotation of `angle` radians about `axis` (need not be normalized).
    #[must_use]
    pub fn from_axis_angle(axis: Vec3, angle: f32) -> Self {
        let len = axis.length();
        if len <= f32::EPSILON {
            return Self::IDENTITY;
        }
        let (s, c) = (angle * 0.5).sin_cos();
        let a = axis * (s / len);
        Self::new(a.x, a.y, a.z, c)
    }

    /// Returns the unit quaternion pointing the same way.
    #[must_use]
    pub fn normalized(self) -> Self {
        let len = (self.x * self.x + self.y * self.y + self.z * self.z + self.w * self.w).sqrt();
        if len > 0.0 {
            Self::new(self.x / len, self.y / len, self.z / len, self.w / len)
        } else {
            Self::IDENTITY
        }
    }

    /// Converts to a rotation matrix. The quaternion is normalized first.
    #[must_use]
    pub fn to_rotation_matrix(self) -> Mat3 {
        let Self { x, y, z, w } = self.normalized();
        Mat3::from_rows([
            [
                1.0 - 2.0 * (y * y + z * z),
                2.0 * (x * y - z * w),
                2.0 * (x * z + y * w),
            ],
            [
                2.0 * (x * y + z * w),
                1.0 - 2.0 * (x * x + z * z),
                2.0 * (y * z - x * w),
            ],
            [
                2.0 * (x * z - y * w),
                2.0 * (y * z + x * w),
                1.0 - 2.0 * (x * x + y * y),
            ],
        ])
    }
}

impl Default for Quaternion {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Row-major 3x3 matrix.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable, Serialize, Deserialize)]
pub struct Mat3 {
    /// Matrix rows
    pub rows: [[f32; 3]; 3],
}

impl Mat3 {
    /// Identity matrix
    pub const IDENTITY: Self = Self::from_rows([[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]]);

    /// Creates a matrix from rows
    #[must_use]
    pub const fn from_rows(rows: [[f32; 3]; 3]) -> Self {
        Self { rows }
    }

    /// Matrix transpose. For rotations this is the inverse.
    #[must_use]
    pub fn transpose(self) -> Self {
        let r = self.rows;
        Self::from_rows([
            [r[0][0], r[1][0], r[2][0]],
            [r[0][1], r[1][1], r[2][1]],
            [r[0][2], r[1][2], r[2][2]],
        ])
    }

    /// Matrix-vector product
    #[must_use]
    pub fn mul_vec(&self, v: Vec3) -> Vec3 {
        let r = &self.rows;
        Vec3::new(
            r[0][0] * v.x + r[0][1] * v.y + r[0][2] * v.z,
            r[1][0] * v.x + r[1][1] * v.y + r[1][2] * v.z,
            r[2][0] * v.x + r[2][1] * v.y + r[2][2] * v.z,
        )
    }

    /// Matrix-matrix product
    #[must_use]
    pub fn mul_mat(&self, other: &Self) -> Self {
        let mut out = [[0.0f32; 3]; 3];
        for (i, row) in out.iter_mut().enumerate() {
            for (j, cell) in row.iter_mut().enumerate() {
                *cell = (0..3).map(|k| self.rows[i][k] * other.rows[k][j]).sum();
            }
        }
        Self::from_rows(out)
    }

    /// True when every entry is finite
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.rows.iter().flatten().all(|v| v.is_finite())
    }
}

impl Default for Mat3 {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Rigid transform - rotation followed by translation.
///
/// `T_A_B.transform_point(p_B)` yields `p_A = R * p_B + t`.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable, Serialize, Deserialize)]
pub struct Transform {
    /// Rotation part
    pub rotation: Mat3,
    /// Translation part
    pub translation: Vec3,
}

impl Transform {
    /// Creates a transform from a rotation matrix and translation
    #[must_use]
    pub const fn new(rotation: Mat3, translation: Vec3) -> Self {
        Self {
            rotation,
            translation,
        }
    }

    /// Identity transform
    pub const IDENTITY: Self = Self::new(Mat3::IDENTITY, Vec3::ZERO);

    /// Pure translation
    #[must_use]
    pub const fn from_translation(translation: Vec3) -> Self {
        Self::new(Mat3::IDENTITY, translation)
    }

    /// Creates a transform from a quaternion and translation
    #[must_use]
    pub fn from_quaternion(rotation: Quaternion, translation: Vec3) -> Self {
        Self::new(rotation.to_rotation_matrix(), translation)
    }

    /// Maps a point from the source frame into the target frame
    #[inline]
    #[must_use]
    pub fn transform_point(&self, p: Vec3) -> Vec3 {
        self.rotation.mul_vec(p) + self.translation
    }

    /// Rotates a direction (no translation)
    #[inline]
    #[must_use]
    pub fn transform_vector(&self, v: Vec3) -> Vec3 {
        self.rotation.mul_vec(v)
    }

    /// Rigid inverse: `T_B_A` from `T_A_B`
    #[must_use]
    pub fn inverse(&self) -> Self {
        let r_t = self.rotation.transpose();
        Self::new(r_t, -r_t.mul_vec(self.translation))
    }

    /// Composition `self ∘ other`: applies `other` first.
    ///
    /// `T_A_B.compose(&T_B_C)` yields `T_A_C`.
    #[must_use]
    pub fn compose(&self, other: &Self) -> Self {
        Self::new(
            self.rotation.mul_mat(&other.rotation),
            self.transform_point(other.translation),
        )
    }

    /// True when every rotation and translation entry is finite
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.rotation.is_finite() && self.translation.is_finite()
    }
}

impl std::ops::Mul for Transform {
    type Output = Self;
    fn mul(self, rhs: Self) -> Self {
        self.compose(&rhs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_vec_near(a: Vec3, b: Vec3) {
        assert!(a.distance(b) < 1e-5, "{a:?} != {b:?}");
    }

    #[test]
    fn test_vec3_operations() {
        let a = Vec3::new(1.0, 2.0, 3.0);
        let b = Vec3::new(4.0, 5.0, 6.0);

        let sum = a + b;
        assert_eq!(sum.x, 5.0);
        assert_eq!(sum.y, 7.0);
        assert_eq!(sum.z, 9.0);

        let dot = a.dot(b);
        assert_eq!(dot, 32.0); // 1*4 + 2*5 + 3*6

        assert_eq!(Vec3::X.cross(Vec3::Y), Vec3::Z);
    }

    #[test]
    fn test_vec3_bytemuck() {
        let v = Vec3::new(1.0, 2.0, 3.0);
        let bytes: &[u8] = bytemuck::bytes_of(&v);
        assert_eq!(bytes.len(), 12); // 3 * 4 bytes
    }

    #[test]
    fn test_quaternion_rotates_x_into_y() {
        let q = Quaternion::from_axis_angle(Vec3::Z, std::f32::consts::FRAC_PI_2);
        let r = q.to_rotation_matrix();
        assert_vec_near(r.mul_vec(Vec3::X), Vec3::Y);
    }

    #[test]
    fn test_transform_inverse_round_trip() {
        let t = Transform::from_quaternion(
            Quaternion::from_axis_angle(Vec3::new(1.0, 2.0, 0.5), 0.7),
            Vec3::new(0.3, -1.2, 2.0),
        );
        let p = Vec3::new(1.5, -0.25, 4.0);

        assert_vec_near(t.inverse().transform_point(t.transform_point(p)), p);
        assert_vec_near((t * t.inverse()).transform_point(p), p);
    }

    #[test]
    fn test_compose_applies_right_operand_first() {
        let shift = Transform::from_translation(Vec3::X);
        let turn = Transform::from_quaternion(
            Quaternion::from_axis_angle(Vec3::Z, std::f32::consts::FRAC_PI_2),
            Vec3::ZERO,
        );

        // Shift, then rotate: (1,0,0) -> (2,0,0) -> (0,2,0)
        let p = (turn * shift).transform_point(Vec3::X);
        assert_vec_near(p, Vec3::new(0.0, 2.0, 0.0));
    }

    #[test]
    fn test_non_finite_detection() {
        let mut t = Transform::IDENTITY;
        assert!(t.is_finite());
        t.translation.y = f32::NAN;
        assert!(!t.is_finite());
    }
}
