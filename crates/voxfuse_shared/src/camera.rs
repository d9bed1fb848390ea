//! Pinhole camera model.
//!
//! Camera frame convention: +Z forward along the optical axis, +X right,
//! +Y down. Image coordinates are continuous, with pixel `(row, col)`
//! covering `[col, col + 1) x [row, row + 1)`.

use serde::{Deserialize, Serialize};

use crate::math::{Vec2, Vec3};

/// Reasons a set of intrinsics cannot be used for projection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IntrinsicsDefect {
    /// A focal length is zero, negative or non-finite.
    FocalLength,
    /// The principal point is non-finite.
    PrincipalPoint,
    /// Width or height is zero.
    Resolution,
}

/// Immutable pinhole intrinsics.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    /// Focal length in x (pixels)
    pub fu: f32,
    /// Focal length in y (pixels)
    pub fv: f32,
    /// Principal point x (pixels)
    pub cu: f32,
    /// Principal point y (pixels)
    pub cv: f32,
    /// Image width in pixels
    pub width: u32,
    /// Image height in pixels
    pub height: u32,
}

impl Camera {
    /// Creates a camera from intrinsics.
    #[must_use]
    pub const fn new(fu: f32, fv: f32, cu: f32, cv: f32, width: u32, height: u32) -> Self {
        Self {
            fu,
            fv,
            cu,
            cv,
            width,
            height,
        }
    }

    /// Checks the intrinsics can be projected through.
    ///
    /// # Errors
    ///
    /// Returns the first defect found.
    pub fn validate(&self) -> Result<(), IntrinsicsDefect> {
        let focal_ok = |f: f32| f.is_finite() && f > 0.0;
        if !focal_ok(self.fu) || !focal_ok(self.fv) {
            return Err(IntrinsicsDefect::FocalLength);
        }
        if !self.cu.is_finite() || !self.cv.is_finite() {
            return Err(IntrinsicsDefect::PrincipalPoint);
        }
        if self.width == 0 || self.height == 0 {
            return Err(IntrinsicsDefect::Resolution);
        }
        Ok(())
    }

    /// Number of image rows
    #[inline]
    #[must_use]
    pub const fn rows(&self) -> usize {
        self.height as usize
    }

    /// Number of image columns
    #[inline]
    #[must_use]
    pub const fn cols(&self) -> usize {
        self.width as usize
    }

    /// Projects a camera-frame point onto the image plane.
    ///
    /// Returns `None` when the point is behind (or on) the image plane or
    /// lands outside the image bounds.
    #[inline]
    #[must_use]
    pub fn project(&self, p_c: Vec3) -> Option<Vec2> {
        if p_c.z <= 0.0 {
            return None;
        }
        let inv_z = 1.0 / p_c.z;
        let uv = Vec2::new(
            self.fu * p_c.x * inv_z + self.cu,
            self.fv * p_c.y * inv_z + self.cv,
        );
        self.contains(uv).then_some(uv)
    }

    /// Projects and returns the integer pixel `(row, col)` containing the
    /// projection.
    #[inline]
    #[must_use]
    pub fn project_to_pixel(&self, p_c: Vec3) -> Option<(usize, usize)> {
        self.project(p_c).map(|uv| self.pixel_index(uv))
    }

    /// Integer pixel `(row, col)` for an in-bounds continuous coordinate.
    #[inline]
    #[must_use]
    pub fn pixel_index(&self, uv: Vec2) -> (usize, usize) {
        // `contains` guarantees non-negative, in-range values.
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let (row, col) = (uv.y.floor() as usize, uv.x.floor() as usize);
        (row.min(self.rows() - 1), col.min(self.cols() - 1))
    }

    /// True when `uv` lies inside the image.
    #[inline]
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn contains(&self, uv: Vec2) -> bool {
        uv.x >= 0.0 && uv.y >= 0.0 && uv.x < self.width as f32 && uv.y < self.height as f32
    }

    /// Back-projects an image coordinate at `depth` along the optical axis.
    ///
    /// Exact inverse of [`Camera::project`] for positive depth.
    #[inline]
    #[must_use]
    pub fn unproject(&self, uv: Vec2, depth: f32) -> Vec3 {
        Vec3::new(
            (uv.x - self.cu) / self.fu * depth,
            (uv.y - self.cv) / self.fv * depth,
            depth,
        )
    }

    /// Camera-frame ray through `uv` with unit z component.
    #[inline]
    #[must_use]
    pub fn ray(&self, uv: Vec2) -> Vec3 {
        self.unproject(uv, 1.0)
    }

    /// Eight corners of the view frustum between `min_depth` and `max_depth`,
    /// in camera frame. Near corners first.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn view_corners(&self, min_depth: f32, max_depth: f32) -> [Vec3; 8] {
        let (w, h) = (self.width as f32, self.height as f32);
        let image_corners = [
            Vec2::new(0.0, 0.0),
            Vec2::new(w, 0.0),
            Vec2::new(w, h),
            Vec2::new(0.0, h),
        ];
        let mut corners = [Vec3::ZERO; 8];
        for (i, uv) in image_corners.iter().enumerate() {
            corners[i] = self.unproject(*uv, min_depth);
            corners[i + 4] = self.unproject(*uv, max_depth);
        }
        corners
    }
}
