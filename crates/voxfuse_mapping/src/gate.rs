//! Sample gating.
//!
//! An integrator asks its gate, for every voxel that survived projection,
//! whether the sample may be fused. The unmasked path uses [`Ungated`];
//! masked integration uses a [`MaskGate`] looking through an
//! [`AuxiliaryView`] of the mask image.

use voxfuse_shared::{Camera, Image, MonoImage, Transform, Vec3};

use crate::error::MappingResult;
use crate::validate::{check_camera, check_image, check_pose};

/// Decides whether a sample at a sensor-frame point may be fused.
pub trait SampleGate: Sync {
    /// True if the sample at `p_sensor` (sensor camera frame) is admitted.
    fn admits(&self, p_sensor: Vec3) -> bool;
}

/// Admits every sample.
#[derive(Debug, Clone, Copy, Default)]
pub struct Ungated;

impl SampleGate for Ungated {
    #[inline]
    fn admits(&self, _p_sensor: Vec3) -> bool {
        true
    }
}

/// An image seen through a second camera, rigidly attached to the sensor.
#[derive(Debug, Clone, Copy)]
pub struct AuxiliaryView<'a, P> {
    image: &'a Image<P>,
    camera: &'a Camera,
    t_aux_sensor: Transform,
}

impl<'a, P: Copy + Default> AuxiliaryView<'a, P> {
    /// View of `image` through `camera`, where `t_aux_sensor` maps sensor
    /// frame points into the auxiliary camera frame.
    ///
    /// # Errors
    ///
    /// Rejects degenerate intrinsics, a non-finite transform, or an image
    /// whose resolution differs from the camera's.
    pub fn new(
        name: &'static str,
        image: &'a Image<P>,
        camera: &'a Camera,
        t_aux_sensor: Transform,
    ) -> MappingResult<Self> {
        check_camera(name, camera)?;
        check_pose(name, &t_aux_sensor)?;
        check_image(name, image, camera)?;
        Ok(Self {
            image,
            camera,
            t_aux_sensor,
        })
    }

    /// Pixel seen at a sensor-frame point, or `None` if it does not project
    /// into the auxiliary image.
    #[inline]
    #[must_use]
    pub fn sample(&self, p_sensor: Vec3) -> Option<P> {
        let p_aux = self.t_aux_sensor.transform_point(p_sensor);
        let (row, col) = self.camera.project_to_pixel(p_aux)?;
        self.image.get(row, col)
    }
}

/// Admits a sample only where the mask reads 0.
///
/// Points that fall outside the mask image are rejected.
#[derive(Debug, Clone, Copy)]
pub struct MaskGate<'a> {
    view: AuxiliaryView<'a, u8>,
}

impl<'a> MaskGate<'a> {
    /// Mask seen through its own camera; `t_mask_sensor` maps sensor-frame
    /// points into the mask camera frame.
    ///
    /// # Errors
    ///
    /// See [`AuxiliaryView::new`].
    pub fn new(mask: &'a MonoImage, mask_camera: &'a Camera, t_mask_sensor: Transform) -> MappingResult<Self> {
        Ok(Self {
            view: AuxiliaryView::new("mask", mask, mask_camera, t_mask_sensor)?,
        })
    }

    /// Mask aligned pixel-for-pixel with the sensor image.
    ///
    /// # Errors
    ///
    /// See [`AuxiliaryView::new`].
    pub fn aligned(mask: &'a MonoImage, sensor_camera: &'a Camera) -> MappingResult<Self> {
        Self::new(mask, sensor_camera, Transform::IDENTITY)
    }
}

impl SampleGate for MaskGate<'_> {
    #[inline]
    fn admits(&self, p_sensor: Vec3) -> bool {
        self.view.sample(p_sensor) == Some(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ConfigurationError, InputValidityError, MappingError};

    fn camera() -> Camera {
        Camera::new(50.0, 50.0, 32.0, 24.0, 64, 48)
    }

    #[test]
    fn test_ungated_admits_everything() {
        assert!(Ungated.admits(Vec3::new(0.0, 0.0, -5.0)));
    }

    #[test]
    fn test_mask_gate_reads_mask() {
        let cam = camera();
        // Left half masked.
        let mask = MonoImage::from_fn(48, 64, |_, c| u8::from(c < 32));
        let gate = MaskGate::aligned(&mask, &cam).unwrap();

        assert!(!gate.admits(Vec3::new(-0.2, 0.0, 1.0)));
        assert!(gate.admits(Vec3::new(0.2, 0.0, 1.0)));
        // Behind the camera: invalid projection, rejected.
        assert!(!gate.admits(Vec3::new(0.2, 0.0, -1.0)));
    }

    #[test]
    fn test_mask_gate_applies_transform() {
        let cam = camera();
        let mask = MonoImage::from_fn(48, 64, |_, c| u8::from(c < 32));
        // Mask camera sits 0.4 m to the right of the sensor, so a point
        // straight ahead of the sensor appears on the mask's left side.
        let t_m_s = Transform::from_translation(Vec3::new(-0.4, 0.0, 0.0));
        let gate = MaskGate::new(&mask, &cam, t_m_s).unwrap();

        assert!(!gate.admits(Vec3::new(0.0, 0.0, 1.0)));
        assert!(gate.admits(Vec3::new(0.6, 0.0, 1.0)));
    }

    #[test]
    fn test_auxiliary_view_validation() {
        let cam = camera();
        let small = MonoImage::new(24, 32);
        assert!(matches!(
            MaskGate::aligned(&small, &cam),
            Err(MappingError::Configuration(ConfigurationError::ResolutionMismatch { .. }))
        ));

        let mask = MonoImage::new(48, 64);
        let t = Transform::from_translation(Vec3::new(0.0, f32::INFINITY, 0.0));
        assert_eq!(
            MaskGate::new(&mask, &cam, t).unwrap_err(),
            MappingError::InputValidity(InputValidityError::NonFinitePose("mask"))
        );
    }

    #[test]
    fn test_sample_outside_view() {
        let cam = camera();
        let image = MonoImage::filled(48, 64, 7);
        let view = AuxiliaryView::new("aux", &image, &cam, Transform::IDENTITY).unwrap();
        assert_eq!(view.sample(Vec3::new(0.0, 0.0, 1.0)), Some(7));
        assert_eq!(view.sample(Vec3::new(10.0, 0.0, 1.0)), None);
    }
}
